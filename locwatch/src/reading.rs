//! Location readings produced by a location provider.

use std::time::Instant;

/// A single location fix.
///
/// Readings are immutable once created. The acquisition session hands each
/// one to the event bus and keeps no copy afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationReading {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,
    /// Monotonic time at which the provider produced the fix.
    pub timestamp: Instant,
}

impl LocationReading {
    /// Create a reading stamped with the current monotonic time.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp: Instant::now(),
        }
    }

    /// Create a reading with an explicit timestamp.
    pub fn with_timestamp(latitude: f64, longitude: f64, timestamp: Instant) -> Self {
        Self {
            latitude,
            longitude,
            timestamp,
        }
    }

    /// Latitude/longitude pair.
    #[inline]
    pub fn position(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    /// Whether both coordinates are finite and within geographic range.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}
