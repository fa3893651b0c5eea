//! Cloneable sender into a running flow.

use tokio::sync::mpsc;

use super::event::{FlowEvent, UserIntent};
use crate::permission::GrantListener;

/// Sends [`FlowEvent`]s to a [`FlowController::run`](super::FlowController::run) loop.
///
/// Register a handle as the broker's [`GrantListener`] so grant results
/// resume the flow, and give one to the UI collaborator for Retry/Dismiss.
#[derive(Debug, Clone)]
pub struct FlowHandle {
    tx: mpsc::UnboundedSender<FlowEvent>,
}

impl FlowHandle {
    /// Create a handle and the receiver the controller loop reads.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<FlowEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Send an event. Returns `false` once the controller loop has exited.
    pub fn send(&self, event: FlowEvent) -> bool {
        match self.tx.send(event) {
            Ok(()) => true,
            Err(_) => {
                tracing::debug!(?event, "Flow controller gone, event dropped");
                false
            }
        }
    }

    /// Request an activation.
    pub fn activate(&self) -> bool {
        self.send(FlowEvent::Activate)
    }

    /// Answer the current prompt with Retry.
    pub fn retry(&self) -> bool {
        self.send(FlowEvent::UserIntent(UserIntent::Retry))
    }

    /// Answer the current prompt with Dismiss.
    pub fn dismiss(&self) -> bool {
        self.send(FlowEvent::UserIntent(UserIntent::Dismiss))
    }

    /// Whether the controller loop is still receiving.
    pub fn is_open(&self) -> bool {
        !self.tx.is_closed()
    }
}

impl GrantListener for FlowHandle {
    fn on_grant_resolved(&self, granted: bool) {
        self.send(FlowEvent::PermissionResolved { granted });
    }
}
