//! Consumer-facing wire format for readings.
//!
//! Each reading leaves the process as a JSON object:
//!
//! ```json
//! {
//!   "action": "locwatch.LocationBroadcast",
//!   "extra_latitude": "12.34",
//!   "extra_longitude": "56.78",
//!   "received_at": "2024-05-01T12:00:00.000000Z"
//! }
//! ```
//!
//! Coordinates are decimal strings in the shortest form that parses back to
//! the identical `f64`, so no precision is lost at this boundary.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::reading::LocationReading;

/// Action name carried by every broadcast.
pub const LOCATION_BROADCAST_ACTION: &str = "locwatch.LocationBroadcast";

/// Errors decoding a broadcast.
#[derive(Debug, Error)]
pub enum BroadcastError {
    /// Not valid JSON, or missing fields.
    #[error("Malformed broadcast: {0}")]
    Json(#[from] serde_json::Error),

    /// A different action.
    #[error("Unexpected broadcast action '{0}'")]
    WrongAction(String),

    /// A coordinate that is not a decimal number.
    #[error("Invalid {field} '{value}'")]
    InvalidCoordinate { field: &'static str, value: String },
}

/// A reading in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationBroadcast {
    /// Always [`LOCATION_BROADCAST_ACTION`].
    pub action: String,
    /// Latitude as a round-trip decimal string.
    #[serde(rename = "extra_latitude")]
    pub latitude: String,
    /// Longitude as a round-trip decimal string.
    #[serde(rename = "extra_longitude")]
    pub longitude: String,
    /// Wall-clock time the reading was converted, RFC 3339.
    pub received_at: String,
}

impl LocationBroadcast {
    /// Convert a reading, stamping it with the current time.
    pub fn from_reading(reading: &LocationReading) -> Self {
        Self::at(reading, Utc::now())
    }

    /// Convert a reading with an explicit timestamp.
    pub fn at(reading: &LocationReading, received_at: DateTime<Utc>) -> Self {
        Self {
            action: LOCATION_BROADCAST_ACTION.to_string(),
            // `Display` for f64 is the shortest string that round-trips.
            latitude: reading.latitude.to_string(),
            longitude: reading.longitude.to_string(),
            received_at: received_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    /// Serialize to a single-line JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse and check the action.
    pub fn from_json(json: &str) -> Result<Self, BroadcastError> {
        let broadcast: Self = serde_json::from_str(json)?;
        if broadcast.action != LOCATION_BROADCAST_ACTION {
            return Err(BroadcastError::WrongAction(broadcast.action));
        }
        Ok(broadcast)
    }

    /// Decode the coordinates.
    pub fn position(&self) -> Result<(f64, f64), BroadcastError> {
        Ok((
            parse_coordinate("extra_latitude", &self.latitude)?,
            parse_coordinate("extra_longitude", &self.longitude)?,
        ))
    }

    /// Decode the timestamp.
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.received_at)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }
}

fn parse_coordinate(field: &'static str, value: &str) -> Result<f64, BroadcastError> {
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| BroadcastError::InvalidCoordinate {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    #[test]
    fn test_wire_field_names() {
        let reading = LocationReading::new(12.34, 56.78);
        let received = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let json = LocationBroadcast::at(&reading, received).to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["action"], "locwatch.LocationBroadcast");
        assert_eq!(value["extra_latitude"], "12.34");
        assert_eq!(value["extra_longitude"], "56.78");
        assert_eq!(value["received_at"], "2024-05-01T12:00:00.000000Z");
    }

    #[test]
    fn test_full_precision_preserved() {
        let reading = LocationReading::new(12.35, 56.79);
        let json = LocationBroadcast::from_reading(&reading).to_json().unwrap();
        let decoded = LocationBroadcast::from_json(&json).unwrap();

        assert_eq!(decoded.position().unwrap(), (12.35, 56.79));
        assert!(decoded.received_at().is_some());
    }

    #[test]
    fn test_rejects_other_actions() {
        let json = r#"{"action":"other","extra_latitude":"1","extra_longitude":"2","received_at":""}"#;
        assert!(matches!(
            LocationBroadcast::from_json(json),
            Err(BroadcastError::WrongAction(a)) if a == "other"
        ));
    }

    #[test]
    fn test_invalid_coordinate() {
        let broadcast = LocationBroadcast {
            action: LOCATION_BROADCAST_ACTION.to_string(),
            latitude: "north".to_string(),
            longitude: "0".to_string(),
            received_at: String::new(),
        };
        assert!(matches!(
            broadcast.position(),
            Err(BroadcastError::InvalidCoordinate { field: "extra_latitude", .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_coordinates_round_trip(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let broadcast = LocationBroadcast::from_reading(&LocationReading::new(lat, lon));
            let (dlat, dlon) = broadcast.position().unwrap();
            prop_assert_eq!(dlat.to_bits(), lat.to_bits());
            prop_assert_eq!(dlon.to_bits(), lon.to_bits());
        }
    }
}
