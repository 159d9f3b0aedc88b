use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::{
    api::BackupRecord,
    console::{BackupConsole, LoadOutcome},
    web::history_ui::{render_error_row, render_history, render_loading_row},
};

impl BackupConsole {
    /// Replaces the cached history with the server's list and re-renders.
    ///
    /// Connectivity failures are retried up to `max_retries` times with a
    /// delay of `retry_base_delay * attempt`; anything else ends in an error
    /// row offering a manual retry.
    pub async fn load_history(&mut self, show_all: bool) -> LoadOutcome {
        let Some(_guard) = self.state.loading.try_acquire() else {
            debug!("history load already in flight, skipping");
            return LoadOutcome::Skipped;
        };

        self.state.show_all = show_all;
        self.document.history_body = render_loading_row();
        self.document.status_line.clear();

        let mut retries = 0u32;
        loop {
            match self.api.fetch_history(show_all).await {
                Ok(records) => {
                    self.state.last_error = None;
                    return self.apply_records(records);
                }
                Err(err) if err.is_retryable() && retries < self.max_retries => {
                    retries += 1;
                    let delay = self.retry_base_delay * retries;
                    warn!(
                        %err,
                        retry = retries,
                        max_retries = self.max_retries,
                        ?delay,
                        "history fetch failed, retrying"
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    let attempts = retries + 1;
                    error!(?err, attempts, "failed to load backup history");

                    let message = err.user_message();
                    self.document.history_body = render_error_row(&message);
                    self.document.status_line.clear();
                    self.state.last_error = Some(message.clone());
                    return LoadOutcome::Failed { attempts, message };
                }
            }
        }
    }

    /// Shows the next page of records by growing the display limit and
    /// reloading. `None` when every record is already on screen.
    pub async fn on_scroll_end(&mut self) -> Option<LoadOutcome> {
        if self.state.loading.is_set() {
            return Some(LoadOutcome::Skipped);
        }
        if !self.state.has_hidden_records() {
            return None;
        }

        self.state.grow_display_limit(self.page_size);
        Some(self.load_history(false).await)
    }

    pub async fn set_show_all(&mut self, show_all: bool) -> LoadOutcome {
        if !show_all {
            self.state.reset_display_limit();
        }
        self.load_history(show_all).await
    }

    /// Re-renders the cached records without touching the network.
    pub fn rerender(&mut self) {
        let rendered = render_history(&self.state.records, self.state.render_limit());
        self.document.history_body = rendered.rows_html;
        self.document.status_line = rendered.status_text;
    }

    pub(crate) async fn refresh_after_mutation(&mut self) -> LoadOutcome {
        self.state.reset_display_limit();
        let show_all = self.state.show_all;
        self.load_history(show_all).await
    }

    fn apply_records(&mut self, records: Vec<BackupRecord>) -> LoadOutcome {
        self.state.records = records;
        self.rerender();

        if self.state.records.is_empty() {
            info!("backup history is empty");
            return LoadOutcome::Empty;
        }

        let total = self.state.records.len();
        let shown = self.state.visible_records().len();
        debug!(shown, total, "backup history rendered");
        LoadOutcome::Loaded { shown, total }
    }
}
