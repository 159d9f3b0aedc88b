use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{api::BackupRecord, config::DEFAULT_DISPLAY_LIMIT};

/// Shared "history fetch in flight" marker.
#[derive(Clone, Debug, Default)]
pub struct LoadingFlag(Arc<AtomicBool>);

impl LoadingFlag {
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Claims the flag, or returns `None` when a load already holds it.
    pub fn try_acquire(&self) -> Option<LoadingGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LoadingGuard(Arc::clone(&self.0)))
    }
}

/// Clears the loading flag when dropped, whichever way the load ends.
#[derive(Debug)]
pub struct LoadingGuard(Arc<AtomicBool>);

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Cached history plus pagination cursor.
#[derive(Clone, Debug)]
pub struct DisplayState {
    pub records: Vec<BackupRecord>,
    display_limit: usize,
    default_limit: usize,
    pub show_all: bool,
    pub loading: LoadingFlag,
    pub last_error: Option<String>,
}

impl Default for DisplayState {
    fn default() -> Self {
        Self::new(DEFAULT_DISPLAY_LIMIT)
    }
}

impl DisplayState {
    pub fn new(default_limit: usize) -> Self {
        let default_limit = default_limit.max(1);
        Self {
            records: Vec::new(),
            display_limit: default_limit,
            default_limit,
            show_all: false,
            loading: LoadingFlag::default(),
            last_error: None,
        }
    }

    pub fn display_limit(&self) -> usize {
        self.display_limit
    }

    pub fn default_limit(&self) -> usize {
        self.default_limit
    }

    /// Limit handed to the renderer; `None` in show-all mode.
    pub fn render_limit(&self) -> Option<usize> {
        if self.show_all {
            None
        } else {
            Some(self.display_limit)
        }
    }

    pub fn reset_display_limit(&mut self) {
        self.display_limit = self.default_limit;
    }

    pub fn grow_display_limit(&mut self, step: usize) {
        self.display_limit = self.display_limit.saturating_add(step.max(1));
    }

    pub fn has_hidden_records(&self) -> bool {
        !self.show_all && self.display_limit < self.records.len()
    }

    pub fn visible_records(&self) -> &[BackupRecord] {
        match self.render_limit() {
            Some(limit) => &self.records[..limit.min(self.records.len())],
            None => &self.records,
        }
    }

    pub fn find(&self, id: i64) -> Option<&BackupRecord> {
        self.records.iter().find(|record| record.id == id)
    }
}
