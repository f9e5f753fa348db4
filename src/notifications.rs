//! Desktop notifications for error alerts
//!
//! Only notifies on errors to avoid being noisy.

use notify_rust::{Notification, Timeout};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::warn;

/// Global flag to enable/disable notifications
static NOTIFICATIONS_ENABLED: AtomicBool = AtomicBool::new(false);

/// Initialize notifications with the enabled setting
pub fn init(enabled: bool) {
    NOTIFICATIONS_ENABLED.store(enabled, Ordering::SeqCst);
}

/// Check if notifications are enabled
pub fn is_enabled() -> bool {
    NOTIFICATIONS_ENABLED.load(Ordering::SeqCst)
}

/// Notification severity level
#[derive(Debug, Clone, Copy)]
pub enum NotificationKind {
    /// A file could not be analyzed or its report written
    FileError,
    /// The watch facility reported a fault
    WatchError,
}

impl NotificationKind {
    fn icon(&self) -> &'static str {
        match self {
            NotificationKind::FileError => "dialog-error",
            NotificationKind::WatchError => "dialog-warning",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            NotificationKind::FileError => "Report Error",
            NotificationKind::WatchError => "Watch Error",
        }
    }
}

/// Send a notification if enabled
///
/// This is fire-and-forget - errors are logged but don't propagate.
pub fn notify(kind: NotificationKind, message: &str) {
    if !is_enabled() {
        return;
    }

    let result = Notification::new()
        .appname("wordwatch")
        .summary(&format!("wordwatch: {}", kind.prefix()))
        .body(message)
        .icon(kind.icon())
        .timeout(Timeout::Milliseconds(5000))
        .show();

    if let Err(e) = result {
        warn!("Failed to send notification: {}", e);
    }
}

/// Convenience function for per-file failures
pub fn notify_file_error(path: &str, error: &str) {
    notify(
        NotificationKind::FileError,
        &format!("'{}' failed: {}", path, error),
    );
}

/// Convenience function for watch errors
pub fn notify_watch_error(path: &str, error: &str) {
    notify(
        NotificationKind::WatchError,
        &format!("Watch '{}': {}", path, error),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_by_default_is_noop() {
        init(false);
        assert!(!is_enabled());
        // Must return without touching the desktop session
        notify_file_error("/tmp/a.txt", "boom");
    }
}
