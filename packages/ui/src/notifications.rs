//! The notification log: one entry per user-visible outcome, timestamped.
//!
//! Every entry is also mirrored to `tracing`.

use std::sync::Arc;

use parking_lot::Mutex;

/// Shown for any failure to reach the server.
pub(crate) const NETWORK_FAILURE: &str = "Could not reach the server. Please try again.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Notification {
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

/// The toast surface: every user-visible outcome of a controller operation
/// lands here, in order. Cloning shares the same log.
#[derive(Clone, Debug, Default)]
pub struct Notifications {
    entries: Arc<Mutex<Vec<Notification>>>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Success => tracing::info!("{message}"),
            LogLevel::Error => tracing::error!("{message}"),
        }
        self.entries.lock().push(Notification {
            timestamp: current_time(),
            level,
            message: message.to_string(),
        });
    }

    pub fn success(&self, message: &str) {
        self.push(LogLevel::Success, message);
    }

    pub fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }

    pub fn entries(&self) -> Vec<Notification> {
        self.entries.lock().clone()
    }

    pub fn last(&self) -> Option<Notification> {
        self.entries.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drain the log, returning what was in it.
    pub fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.entries.lock())
    }
}

fn current_time() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}
