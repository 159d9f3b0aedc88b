pub mod actions;
pub mod confirm;
pub mod document;
pub mod events;
pub mod history;
pub mod notify;
pub mod state;
pub mod validate;


use std::{path::PathBuf, time::Duration};

use tracing::warn;

use crate::{
    api::BackupApi,
    config::ConsoleConfig,
    error::{ConsoleError, ConsoleResult},
    web::templates,
};

use confirm::Confirm;
use document::{Document, SelectedFile};
use events::UiEvent;
use notify::Notifier;
use state::DisplayState;

/// Result of a history load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { shown: usize, total: usize },
    Empty,
    Failed { attempts: u32, message: String },
    /// Another load held the loading flag.
    Skipped,
}

/// Result of a user action. Every variant has already been reported to the
/// operator through the notifier or the history table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed,
    Cancelled,
    Rejected,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Action(ActionOutcome),
    History(Option<LoadOutcome>),
}

/// Controller owning the display state, the page model and the API client.
pub struct BackupConsole {
    api: BackupApi,
    state: DisplayState,
    document: Document,
    notifier: Notifier,
    confirm: Box<dyn Confirm>,
    page_size: usize,
    retry_base_delay: Duration,
    max_retries: u32,
}

impl BackupConsole {
    pub fn new(config: &ConsoleConfig, confirm: Box<dyn Confirm>) -> ConsoleResult<Self> {
        Ok(Self {
            api: BackupApi::from_config(config)?,
            state: DisplayState::new(config.page_size),
            document: Document::default(),
            notifier: Notifier::new(config.toast_duration),
            confirm,
            page_size: config.page_size,
            retry_base_delay: config.retry_base_delay,
            max_retries: config.max_retries,
        })
    }

    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn set_backup_name(&mut self, name: impl Into<String>) {
        self.document.backup_name_input = name.into();
    }

    /// Picks the file for the next upload restore.
    pub async fn select_upload(&mut self, path: impl Into<PathBuf>) -> ActionOutcome {
        match SelectedFile::from_path(path).await {
            Ok(file) => {
                self.document.selected_upload = Some(file);
                ActionOutcome::Completed
            }
            Err(err) => self.reject(err),
        }
    }

    /// Dispatches the control identified by its data attributes.
    pub async fn handle_control(&mut self, attributes: &[(&str, &str)]) -> EventOutcome {
        match UiEvent::from_data_attributes(attributes) {
            Ok(event) => self.handle_event(event).await,
            Err(err) => EventOutcome::Action(self.reject(err)),
        }
    }

    pub async fn handle_event(&mut self, event: UiEvent) -> EventOutcome {
        match event {
            UiEvent::CreateBackup => EventOutcome::Action(self.create_backup().await),
            UiEvent::RestoreUpload => EventOutcome::Action(self.restore_upload().await),
            UiEvent::RestoreEntry { id } => {
                EventOutcome::Action(self.restore_from_history(id).await)
            }
            UiEvent::SmartRestore { id, category, mode } => {
                EventOutcome::Action(self.smart_restore(id, category, mode).await)
            }
            UiEvent::DeleteEntry { id } => EventOutcome::Action(self.delete_backup(id).await),
            UiEvent::RetryHistory => {
                let show_all = self.state.show_all;
                EventOutcome::History(Some(self.load_history(show_all).await))
            }
            UiEvent::ScrollEnd => EventOutcome::History(self.on_scroll_end().await),
            UiEvent::ShowAll(show_all) => {
                EventOutcome::History(Some(self.set_show_all(show_all).await))
            }
        }
    }

    pub fn render_page(&self) -> String {
        templates::render_console_page(&self.document, &self.notifier.active())
    }

    /// Reports a failure caught before any request was sent.
    fn reject(&self, err: ConsoleError) -> ActionOutcome {
        warn!(%err, "action rejected");
        self.notifier.error(err.user_message());
        ActionOutcome::Rejected
    }
}
