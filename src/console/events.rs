use crate::{
    api::{RestoreCategory, RestoreMode},
    error::{ConsoleError, ConsoleResult},
};

/// A user interaction, decoded from the `data-*` attributes of the control
/// that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    CreateBackup,
    RestoreUpload,
    RestoreEntry { id: i64 },
    SmartRestore {
        id: i64,
        category: RestoreCategory,
        mode: RestoreMode,
    },
    DeleteEntry { id: i64 },
    RetryHistory,
    ScrollEnd,
    ShowAll(bool),
}

impl UiEvent {
    /// Builds an event from `(name, value)` pairs of a control's data
    /// attributes, names given without the `data-` prefix.
    ///
    /// Record ids must be integers; anything else is rejected before it can
    /// reach a URL or markup.
    pub fn from_data_attributes(attributes: &[(&str, &str)]) -> ConsoleResult<Self> {
        let lookup = |name: &str| {
            attributes
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| *value)
        };

        let action = lookup("action")
            .ok_or_else(|| ConsoleError::validation("Control has no action."))?;

        match action {
            "create-backup" => Ok(UiEvent::CreateBackup),
            "restore-upload" => Ok(UiEvent::RestoreUpload),
            "retry-history" => Ok(UiEvent::RetryHistory),
            "load-more" => Ok(UiEvent::ScrollEnd),
            "show-all" => Ok(UiEvent::ShowAll(true)),
            "show-recent" => Ok(UiEvent::ShowAll(false)),
            "restore" => Ok(UiEvent::RestoreEntry {
                id: parse_record_id(lookup("backup-id"))?,
            }),
            "delete" => Ok(UiEvent::DeleteEntry {
                id: parse_record_id(lookup("backup-id"))?,
            }),
            "smart-restore" => {
                let id = parse_record_id(lookup("backup-id"))?;
                let category = match lookup("restore-category") {
                    Some(raw) => RestoreCategory::parse(raw).ok_or_else(|| {
                        ConsoleError::validation(format!("Unknown restore category `{raw}`."))
                    })?,
                    None => RestoreCategory::default(),
                };
                let mode = match lookup("restore-mode") {
                    Some(raw) => RestoreMode::parse(raw).ok_or_else(|| {
                        ConsoleError::validation(format!("Unknown restore mode `{raw}`."))
                    })?,
                    None => RestoreMode::default(),
                };
                Ok(UiEvent::SmartRestore { id, category, mode })
            }
            other => Err(ConsoleError::validation(format!("Unknown action `{other}`."))),
        }
    }
}

pub fn parse_record_id(raw: Option<&str>) -> ConsoleResult<i64> {
    let raw = raw.ok_or_else(|| ConsoleError::validation("Missing backup id."))?;
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ConsoleError::validation("Invalid backup id."))
}
