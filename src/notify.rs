//! Status Notifications
//!
//! The sync engine and controller report outcomes through a
//! [`NotificationSink`]. Only one message is visible at a time: a new one
//! replaces the old and restarts its expiry window.

use parking_lot::Mutex;
use std::time::{Duration, Instant};

/// Default time a message stays visible
pub const DEFAULT_DISPLAY_WINDOW: Duration = Duration::from_secs(5);

/// Notification severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Success,
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "info"),
            Severity::Success => write!(f, "success"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A displayed status message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
}

/// Output port for transient status messages
pub trait NotificationSink: Send + Sync {
    fn display(&self, message: &str, severity: Severity);
}

/// Single-slot status line with auto-expiry.
///
/// Expiry is evaluated lazily on read, so no timer task is needed.
#[derive(Debug)]
pub struct StatusBoard {
    window: Duration,
    current: Mutex<Option<(Notice, Instant)>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::with_window(DEFAULT_DISPLAY_WINDOW)
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            window,
            current: Mutex::new(None),
        }
    }

    /// The visible message, if it has not expired
    pub fn current(&self) -> Option<Notice> {
        let mut current = self.current.lock();
        let expired = matches!(current.as_ref(), Some((_, at)) if Instant::now() >= *at);
        if expired {
            *current = None;
        }
        current.as_ref().map(|(notice, _)| notice.clone())
    }

    /// Hide the message immediately
    pub fn clear(&self) {
        *self.current.lock() = None;
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for StatusBoard {
    fn display(&self, message: &str, severity: Severity) {
        let notice = Notice {
            message: message.to_string(),
            severity,
        };
        *self.current.lock() = Some((notice, Instant::now() + self.window));
    }
}

/// Sink that only logs; used when no presentation is attached
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn display(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Error => tracing::warn!("{}", message),
            _ => tracing::info!("{}", message),
        }
    }
}
