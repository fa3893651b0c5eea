//! Point-in-time network reachability checks.
//!
//! A [`ConnectivityProbe`] answers one question synchronously: is the network
//! reachable right now? Probes never retry. The flow controller decides what
//! to do with a negative answer (typically a blocking retry prompt).

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Default address probed by [`TcpConnectivityProbe`] (a public DNS resolver).
pub const DEFAULT_PROBE_ADDRESS: &str = "1.1.1.1:53";

/// Default connect timeout for [`TcpConnectivityProbe`].
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(1500);

/// Synchronous network reachability check.
pub trait ConnectivityProbe: Send + Sync {
    /// Whether the network is reachable at this instant.
    fn is_connected(&self) -> bool;

    /// Whether `is_connected` may block on I/O. Async hosts run blocking
    /// probes on a blocking thread.
    fn may_block(&self) -> bool {
        false
    }
}

/// Probes reachability by opening a TCP connection with a timeout.
#[derive(Debug, Clone)]
pub struct TcpConnectivityProbe {
    address: String,
    timeout: Duration,
}

impl TcpConnectivityProbe {
    /// Create a probe for `address` (`host:port`).
    pub fn new(address: impl Into<String>, timeout: Duration) -> Self {
        Self {
            address: address.into(),
            timeout,
        }
    }

    /// The probed address.
    pub fn address(&self) -> &str {
        &self.address
    }

    fn resolve(&self) -> Option<SocketAddr> {
        match self.address.to_socket_addrs() {
            Ok(mut addrs) => addrs.next(),
            Err(e) => {
                tracing::debug!(address = %self.address, error = %e, "Probe address did not resolve");
                None
            }
        }
    }
}

impl Default for TcpConnectivityProbe {
    fn default() -> Self {
        Self::new(DEFAULT_PROBE_ADDRESS, DEFAULT_PROBE_TIMEOUT)
    }
}

impl ConnectivityProbe for TcpConnectivityProbe {
    fn is_connected(&self) -> bool {
        let Some(addr) = self.resolve() else {
            return false;
        };

        match TcpStream::connect_timeout(&addr, self.timeout) {
            Ok(_) => true,
            Err(e) => {
                tracing::debug!(address = %addr, error = %e, "Connectivity probe failed");
                false
            }
        }
    }

    fn may_block(&self) -> bool {
        true
    }
}

/// Connectivity state held in a flag.
///
/// Used by hosts that learn about connectivity from somewhere else (a platform
/// callback, a CLI switch) and by tests.
#[derive(Debug)]
pub struct StaticConnectivity {
    connected: AtomicBool,
}

impl StaticConnectivity {
    /// Create with the given initial state.
    pub fn new(connected: bool) -> Self {
        Self {
            connected: AtomicBool::new(connected),
        }
    }

    /// Change the reported state.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Default for StaticConnectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

impl ConnectivityProbe for StaticConnectivity {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::sync::Arc;

    #[test]
    fn test_static_connectivity_toggles() {
        let probe = StaticConnectivity::new(false);
        assert!(!probe.is_connected());

        probe.set_connected(true);
        assert!(probe.is_connected());
    }

    #[test]
    fn test_tcp_probe_reaches_local_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let probe = TcpConnectivityProbe::new(addr.to_string(), Duration::from_millis(500));
        assert!(probe.is_connected());
    }

    #[test]
    fn test_tcp_probe_unresolvable_address() {
        let probe = TcpConnectivityProbe::new("not an address", Duration::from_millis(100));
        assert!(!probe.is_connected());
    }

    #[test]
    fn test_default_probe_address() {
        let probe = TcpConnectivityProbe::default();
        assert_eq!(probe.address(), DEFAULT_PROBE_ADDRESS);
    }

    #[test]
    fn test_trait_object_usage() {
        let probe: Arc<dyn ConnectivityProbe> = Arc::new(StaticConnectivity::default());
        assert!(probe.is_connected());
    }
}
