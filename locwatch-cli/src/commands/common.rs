//! Types shared across CLI commands.

use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use clap::ValueEnum;
use locwatch::flow::{FlowHandle, Notice, NotificationSink};
use locwatch::sim::GrantPolicy;
use tokio_util::sync::CancellationToken;

/// How the simulated user answers permission prompts.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum PermissionChoice {
    /// Grant on the first prompt
    Grant,
    /// Deny once, then grant after the rationale
    DenyFirst,
    /// Deny every prompt
    DenyAlways,
    /// Deny and tick "don't ask again"
    DenyPermanently,
}

impl From<PermissionChoice> for GrantPolicy {
    fn from(choice: PermissionChoice) -> Self {
        match choice {
            PermissionChoice::Grant => GrantPolicy::Grant,
            PermissionChoice::DenyFirst => GrantPolicy::DenyFirst,
            PermissionChoice::DenyAlways => GrantPolicy::DenyAlways,
            PermissionChoice::DenyPermanently => GrantPolicy::DenyPermanently,
        }
    }
}

/// Prints notices to stderr and answers prompts on the user's behalf.
///
/// Retryable prompts are retried up to `retries` times, `retry_delay` apart,
/// then dismissed. Terminal notices (and a dismissal) cancel `shutdown` so the
/// command exits.
pub struct ConsoleSink {
    handle: FlowHandle,
    retries_left: AtomicU32,
    retry_delay: Duration,
    shutdown: CancellationToken,
}

impl ConsoleSink {
    pub fn new(
        handle: FlowHandle,
        retries: u32,
        retry_delay: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            handle,
            retries_left: AtomicU32::new(retries),
            retry_delay,
            shutdown,
        }
    }

    fn retry_or_give_up(&self) {
        let remaining = self
            .retries_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));

        match remaining {
            Ok(n) => {
                eprintln!(
                    "  retrying in {} ms ({} retries left)",
                    self.retry_delay.as_millis(),
                    n - 1
                );
                let handle = self.handle.clone();
                let delay = self.retry_delay;
                match tokio::runtime::Handle::try_current() {
                    Ok(runtime) => {
                        runtime.spawn(async move {
                            tokio::time::sleep(delay).await;
                            handle.retry();
                        });
                    }
                    Err(_) => {
                        handle.retry();
                    }
                }
            }
            Err(_) => {
                eprintln!("  giving up");
                self.handle.dismiss();
                self.shutdown.cancel();
            }
        }
    }
}

impl NotificationSink for ConsoleSink {
    fn present(&self, notice: Notice) {
        match notice {
            Notice::CapabilityUnavailable { resolvable } => {
                if resolvable {
                    eprintln!("Location services need attention; fix them and run again.");
                } else {
                    eprintln!("Location services are not available on this device.");
                }
                self.shutdown.cancel();
            }
            Notice::ConnectivityRequired => {
                eprintln!("No network connection.");
                self.retry_or_give_up();
            }
            Notice::PermissionDenied => {
                eprintln!("Location permission was denied.");
                self.retry_or_give_up();
            }
            Notice::PermissionBlocked => {
                eprintln!("Location permission is blocked; enable it in system settings.");
                self.shutdown.cancel();
            }
        }
    }
}
