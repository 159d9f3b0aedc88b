use tracing::{error, info};

use crate::{
    api::{ActionReply, BackupRecord, RestoreCategory, RestoreMode},
    console::{
        ActionOutcome, BackupConsole,
        document::Control,
        validate::{validate_backup_name, validate_upload, validate_upload_size},
    },
    error::{ConsoleError, ConsoleResult},
};

const CREATED_FALLBACK: &str = "Backup created successfully.";
const RESTORED_FALLBACK: &str = "Restore completed successfully.";
const DELETED_FALLBACK: &str = "Backup deleted successfully.";

impl BackupConsole {
    pub async fn create_backup(&mut self) -> ActionOutcome {
        let backup_name = match validate_backup_name(&self.document.backup_name_input) {
            Ok(name) => name,
            Err(err) => return self.reject(err),
        };

        info!(name = ?backup_name, "creating backup");
        let result = self
            .run_busy(Control::CreateBackup, |console| {
                let api = console.api.clone();
                async move { api.create_backup(backup_name).await }
            })
            .await;

        match result {
            Ok(reply) => {
                self.document.backup_name_input.clear();
                self.complete(reply, CREATED_FALLBACK).await
            }
            Err(err) => self.fail("create backup", err),
        }
    }

    pub async fn restore_upload(&mut self) -> ActionOutcome {
        let Some(file) = self.document.selected_upload.clone() else {
            return self.reject(ConsoleError::validation(
                "Please select a backup file to restore.",
            ));
        };
        if let Err(err) = validate_upload(&file) {
            return self.reject(err);
        }

        let prompt = format!(
            "Restoring from \"{}\" will overwrite existing data. This cannot be undone. Continue?",
            file.name
        );
        if !self.confirm.confirm(&prompt) {
            info!(file = %file.name, "upload restore cancelled");
            return ActionOutcome::Cancelled;
        }

        info!(file = %file.name, size = file.size, "restoring from uploaded file");
        let result = self
            .run_busy(Control::RestoreUpload, |console| {
                let api = console.api.clone();
                async move {
                    let contents = tokio::fs::read(&file.path).await.map_err(|err| {
                        ConsoleError::validation(format!("Cannot read {}: {err}", file.name))
                    })?;
                    // The file may have changed since it was selected.
                    validate_upload_size(contents.len() as u64)?;
                    api.restore_upload(&file.name, contents).await
                }
            })
            .await;

        match result {
            Ok(reply) => {
                self.document.selected_upload = None;
                self.complete(reply, RESTORED_FALLBACK).await
            }
            Err(err) => self.fail("restore from upload", err),
        }
    }

    pub async fn restore_from_history(&mut self, id: i64) -> ActionOutcome {
        let Some(record) = self.lookup(id) else {
            return ActionOutcome::Rejected;
        };

        let prompt = format!(
            "Restore data from \"{}\"? Current data will be overwritten.",
            record.file_name
        );
        if !self.confirm.confirm(&prompt) {
            info!(id, "history restore cancelled");
            return ActionOutcome::Cancelled;
        }

        info!(id, file = %record.file_name, "restoring from history");
        let result = self
            .run_busy(Control::RestoreEntry(id), |console| {
                let api = console.api.clone();
                async move { api.restore_from_history(id).await }
            })
            .await;

        match result {
            Ok(reply) => self.complete(reply, RESTORED_FALLBACK).await,
            Err(err) => self.fail("restore from history", err),
        }
    }

    /// Restores one category of data from a history entry.
    pub async fn smart_restore(
        &mut self,
        id: i64,
        category: RestoreCategory,
        mode: RestoreMode,
    ) -> ActionOutcome {
        let Some(record) = self.lookup(id) else {
            return ActionOutcome::Rejected;
        };

        let prompt = match mode {
            RestoreMode::Merge => format!(
                "Restore {} from \"{}\"? Backup data will be merged with existing records.",
                category.label(),
                record.file_name
            ),
            RestoreMode::Replace => format!(
                "WARNING: replace mode deletes all existing {} data before restoring from \"{}\". This cannot be undone. Continue?",
                category.label(),
                record.file_name
            ),
        };
        if !self.confirm.confirm(&prompt) {
            info!(id, category = category.as_str(), "smart restore cancelled");
            return ActionOutcome::Cancelled;
        }

        info!(
            id,
            category = category.as_str(),
            mode = mode.as_str(),
            "running smart restore"
        );
        let result = self
            .run_busy(Control::RestoreEntry(id), |console| {
                let api = console.api.clone();
                async move { api.smart_restore(id, category, mode).await }
            })
            .await;

        match result {
            Ok(reply) => self.complete(reply, RESTORED_FALLBACK).await,
            Err(err) => self.fail("smart restore", err),
        }
    }

    pub async fn delete_backup(&mut self, id: i64) -> ActionOutcome {
        let Some(record) = self.lookup(id) else {
            return ActionOutcome::Rejected;
        };

        let prompt = format!(
            "Delete backup \"{}\"? This cannot be undone.",
            record.file_name
        );
        if !self.confirm.confirm(&prompt) {
            info!(id, "delete cancelled");
            return ActionOutcome::Cancelled;
        }

        info!(id, file = %record.file_name, "deleting backup");
        let result = self
            .run_busy(Control::DeleteEntry(id), |console| {
                let api = console.api.clone();
                async move { api.delete_backup(id).await }
            })
            .await;

        match result {
            Ok(reply) => self.complete(reply, DELETED_FALLBACK).await,
            Err(err) => self.fail("delete backup", err),
        }
    }

    /// Marks `control` busy for the duration of the request.
    async fn run_busy<F, Fut>(&mut self, control: Control, make_request: F) -> ConsoleResult<ActionReply>
    where
        F: FnOnce(&Self) -> Fut,
        Fut: Future<Output = ConsoleResult<ActionReply>>,
    {
        self.document.set_busy(control, true);
        let request = make_request(self);
        let result = request.await;
        self.document.set_busy(control, false);
        result
    }

    async fn complete(&mut self, reply: ActionReply, fallback: &str) -> ActionOutcome {
        let message = reply.message.unwrap_or_else(|| fallback.to_string());
        let message = match reply.summary {
            Some(summary) => format!("{message} ({summary})"),
            None => message,
        };
        self.notifier.success(message);
        self.refresh_after_mutation().await;
        ActionOutcome::Completed
    }

    fn fail(&self, action: &str, err: ConsoleError) -> ActionOutcome {
        error!(?err, action, "backup action failed");
        self.notifier.error(err.user_message());
        ActionOutcome::Failed
    }

    fn lookup(&self, id: i64) -> Option<BackupRecord> {
        let record = self.state.find(id).cloned();
        if record.is_none() {
            self.notifier
                .warning("Backup record not found. Refresh the history and try again.");
        }
        record
    }
}
