use std::{collections::BTreeSet, path::PathBuf};

use tokio::fs;

use crate::error::{ConsoleError, ConsoleResult};

/// Controls that can be disabled while their request is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Control {
    CreateBackup,
    RestoreUpload,
    RestoreEntry(i64),
    DeleteEntry(i64),
}

/// File picked for an upload restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

impl SelectedFile {
    pub async fn from_path(path: impl Into<PathBuf>) -> ConsoleResult<Self> {
        let path = path.into();
        let metadata = fs::metadata(&path).await.map_err(|err| {
            ConsoleError::validation(format!("Cannot read {}: {err}", path.display()))
        })?;
        if !metadata.is_file() {
            return Err(ConsoleError::validation(format!(
                "{} is not a file.",
                path.display()
            )));
        }

        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
            .to_string();

        Ok(Self {
            name,
            path,
            size: metadata.len(),
        })
    }
}

/// View model standing in for the page: input fields, the history table
/// body and which controls are busy.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub backup_name_input: String,
    pub selected_upload: Option<SelectedFile>,
    pub history_body: String,
    pub status_line: String,
    busy: BTreeSet<Control>,
}

impl Document {
    pub fn set_busy(&mut self, control: Control, busy: bool) {
        if busy {
            self.busy.insert(control);
        } else {
            self.busy.remove(&control);
        }
    }

    pub fn is_busy(&self, control: &Control) -> bool {
        self.busy.contains(control)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn selected_file_reads_size_and_name() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("export.json");
        std::fs::write(&path, b"{}").expect("write");

        let selected = SelectedFile::from_path(&path).await.unwrap();
        assert_eq!(selected.name, "export.json");
        assert_eq!(selected.size, 2);
    }

    #[tokio::test]
    async fn directories_are_not_selectable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = SelectedFile::from_path(dir.path()).await.unwrap_err();
        assert!(matches!(err, ConsoleError::Validation(_)));
    }

    #[test]
    fn busy_flags_toggle() {
        let mut document = Document::default();
        document.set_busy(Control::DeleteEntry(4), true);
        assert!(document.is_busy(&Control::DeleteEntry(4)));
        assert!(!document.is_busy(&Control::DeleteEntry(5)));
        document.set_busy(Control::DeleteEntry(4), false);
        assert!(!document.is_busy(&Control::DeleteEntry(4)));
    }
}
