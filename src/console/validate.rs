use std::path::Path;

use crate::{
    config::{MAX_BACKUP_NAME_LEN, MAX_UPLOAD_BYTES},
    console::document::SelectedFile,
    error::{ConsoleError, ConsoleResult},
};

const ALLOWED_UPLOAD_EXTENSIONS: &[&str] = &["json"];

/// Strips a user-supplied backup name down to `[A-Za-z0-9_-]`.
///
/// Returns `Ok(None)` for blank input (the server picks a name).
pub fn validate_backup_name(input: &str) -> ConsoleResult<Option<String>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    let sanitized: String = trimmed
        .chars()
        .filter(|ch| ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_')
        .collect();

    if sanitized.is_empty() {
        return Err(ConsoleError::validation(
            "Backup name may only contain letters, numbers, hyphens and underscores.",
        ));
    }

    if sanitized.chars().count() > MAX_BACKUP_NAME_LEN {
        return Err(ConsoleError::validation(format!(
            "Backup name must be at most {MAX_BACKUP_NAME_LEN} characters."
        )));
    }

    Ok(Some(sanitized))
}

/// Checks type and size of an upload before anything is sent.
pub fn validate_upload(file: &SelectedFile) -> ConsoleResult<()> {
    let extension = Path::new(&file.name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    if !ALLOWED_UPLOAD_EXTENSIONS.contains(&extension.as_str()) {
        return Err(ConsoleError::validation(
            "Invalid file type. Please select a .json backup file.",
        ));
    }

    validate_upload_size(file.size)
}

/// Size limit on its own, for re-checking bytes actually read from disk.
pub fn validate_upload_size(size: u64) -> ConsoleResult<()> {
    if size > MAX_UPLOAD_BYTES {
        return Err(ConsoleError::validation(format!(
            "File is too large. Maximum size is {} MB.",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }

    Ok(())
}
