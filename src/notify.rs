// Transient user-facing messages. Rendering belongs to the host UI;
// the schedule only decides when to raise one and how long it stays up.

use std::time::Duration;

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub severity: Severity,
    pub message: String,
    pub auto_close: Duration,
}

impl Notification {
    pub fn success(message: impl Into<String>, auto_close: Duration) -> Self {
        Self {
            severity: Severity::Success,
            message: message.into(),
            auto_close,
        }
    }

    pub fn error(message: impl Into<String>, auto_close: Duration) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            auto_close,
        }
    }
}

pub trait Notifier: Send + Sync + 'static {
    fn notify(&self, notification: Notification);
}

// Writes notifications to the log. Default for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        let auto_close_ms = notification.auto_close.as_millis() as u64;
        match notification.severity {
            Severity::Success => {
                tracing::info!(auto_close_ms, "{}", notification.message)
            }
            Severity::Error => {
                tracing::error!(auto_close_ms, "{}", notification.message)
            }
        }
    }
}

// Keeps every notification so tests and hosts can inspect them
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.seen.lock().clone()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.seen
            .lock()
            .iter()
            .filter(|n| n.severity == severity)
            .count()
    }

    pub fn clear(&self) {
        self.seen.lock().clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.seen.lock().push(notification);
    }
}
