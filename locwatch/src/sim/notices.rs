//! Notification sinks.

use parking_lot::Mutex;

use crate::flow::{Notice, NotificationSink};

/// Records every notice.
#[derive(Debug, Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    /// Notices presented so far, oldest first.
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().clone()
    }

    /// The latest notice.
    pub fn last(&self) -> Option<Notice> {
        self.notices.lock().last().copied()
    }
}

impl NotificationSink for RecordingSink {
    fn present(&self, notice: Notice) {
        self.notices.lock().push(notice);
    }
}

/// Writes notices to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingSink;

impl NotificationSink for LoggingSink {
    fn present(&self, notice: Notice) {
        match notice {
            Notice::CapabilityUnavailable { resolvable } => {
                tracing::error!(resolvable, "Location capability unavailable on this device")
            }
            Notice::ConnectivityRequired => {
                tracing::warn!("Network connection required to continue")
            }
            Notice::PermissionDenied => tracing::warn!("Location permission denied"),
            Notice::PermissionBlocked => {
                tracing::error!("Location permission blocked; enable it in system settings")
            }
        }
    }
}
