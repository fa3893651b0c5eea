//! Location capability availability.

use parking_lot::Mutex;

/// Availability of the platform location capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// The capability is present and usable.
    Available,
    /// Missing, but the platform can walk the user through fixing it
    /// (install or update the location service, for example).
    UserResolvable,
    /// Missing with no user-facing fix.
    Unavailable,
}

impl Availability {
    /// Whether the capability can be used now.
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// Reports whether the platform location capability is present.
pub trait CapabilityProbe: Send + Sync {
    /// Current availability.
    fn availability(&self) -> Availability;
}

/// Capability availability held in memory.
#[derive(Debug)]
pub struct StaticCapability {
    availability: Mutex<Availability>,
}

impl StaticCapability {
    /// Create with the given availability.
    pub fn new(availability: Availability) -> Self {
        Self {
            availability: Mutex::new(availability),
        }
    }

    /// Change the reported availability.
    pub fn set(&self, availability: Availability) {
        *self.availability.lock() = availability;
    }
}

impl Default for StaticCapability {
    fn default() -> Self {
        Self::new(Availability::Available)
    }
}

impl CapabilityProbe for StaticCapability {
    fn availability(&self) -> Availability {
        *self.availability.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_capability() {
        let probe = StaticCapability::default();
        assert!(probe.availability().is_available());

        probe.set(Availability::UserResolvable);
        assert_eq!(probe.availability(), Availability::UserResolvable);
        assert!(!probe.availability().is_available());
    }
}
