use std::{
    sync::{Arc, Mutex, MutexGuard},
    time::Duration,
};

use tokio::time::sleep;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Delay between the start of the fade-out and removal of a toast.
pub const FADE_OUT: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Success,
    Error,
    Warning,
    Info,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::Success => "toast-success",
            Severity::Error => "toast-error",
            Severity::Warning => "toast-warning",
            Severity::Info => "toast-info",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Success => "✔",
            Severity::Error => "✖",
            Severity::Warning => "⚠",
            Severity::Info => "ℹ",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    Fading,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: Uuid,
    pub severity: Severity,
    pub message: String,
    pub phase: ToastPhase,
}

/// Transient notifications, at most one per severity.
///
/// Must be used from within a tokio runtime: every toast schedules its own
/// dismissal task.
#[derive(Clone)]
pub struct Notifier {
    toasts: Arc<Mutex<Vec<Toast>>>,
    default_duration: Duration,
}

impl Notifier {
    pub fn new(default_duration: Duration) -> Self {
        Self {
            toasts: Arc::new(Mutex::new(Vec::new())),
            default_duration,
        }
    }

    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.notify(message, Severity::Success, None)
    }

    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.notify(message, Severity::Error, None)
    }

    pub fn warning(&self, message: impl Into<String>) -> Uuid {
        self.notify(message, Severity::Warning, None)
    }

    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.notify(message, Severity::Info, None)
    }

    /// Shows `message`, replacing any toast of the same severity, and
    /// dismisses it after `duration` (or the configured default).
    pub fn notify(
        &self,
        message: impl Into<String>,
        severity: Severity,
        duration: Option<Duration>,
    ) -> Uuid {
        let message = message.into();
        let id = Uuid::new_v4();

        match severity {
            Severity::Error => error!(severity = severity.as_str(), %message, "notification"),
            Severity::Warning => warn!(severity = severity.as_str(), %message, "notification"),
            Severity::Success | Severity::Info => {
                info!(severity = severity.as_str(), %message, "notification")
            }
        }

        {
            let mut toasts = self.lock();
            toasts.retain(|toast| toast.severity != severity);
            toasts.push(Toast {
                id,
                severity,
                message,
                phase: ToastPhase::Visible,
            });
        }

        let duration = duration.unwrap_or(self.default_duration);
        let toasts = Arc::clone(&self.toasts);
        tokio::spawn(async move {
            sleep(duration).await;
            if !set_phase(&toasts, id, ToastPhase::Fading) {
                return;
            }
            sleep(FADE_OUT).await;
            lock_toasts(&toasts).retain(|toast| toast.id != id);
        });

        id
    }

    pub fn active(&self) -> Vec<Toast> {
        self.lock().clone()
    }

    pub fn latest(&self, severity: Severity) -> Option<Toast> {
        self.lock()
            .iter()
            .find(|toast| toast.severity == severity)
            .cloned()
    }

    pub fn dismiss(&self, id: Uuid) {
        self.lock().retain(|toast| toast.id != id);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Toast>> {
        lock_toasts(&self.toasts)
    }
}

fn lock_toasts(toasts: &Mutex<Vec<Toast>>) -> MutexGuard<'_, Vec<Toast>> {
    toasts.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn set_phase(toasts: &Mutex<Vec<Toast>>, id: Uuid, phase: ToastPhase) -> bool {
    let mut guard = lock_toasts(toasts);
    match guard.iter_mut().find(|toast| toast.id == id) {
        Some(toast) => {
            toast.phase = phase;
            true
        }
        None => false,
    }
}
