//! Shared value types for position samples and speed limits.

use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geo::ms_to_kmh;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A point on the Earth's surface in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Reject non-finite or out-of-range coordinates.
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(CoreError::Validation(format!(
                "latitude must be between -90 and 90, got {}",
                self.latitude
            )));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(CoreError::Validation(format!(
                "longitude must be between -180 and 180, got {}",
                self.longitude
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// A timestamped fix delivered by the positioning source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    /// Ground speed in meters per second. `None` when the source cannot
    /// derive a speed for this fix.
    #[serde(default)]
    pub speed_mps: Option<f64>,
    pub timestamp: Timestamp,
}

impl PositionSample {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Ground speed converted to km/h, if the fix carries one.
    pub fn speed_kmh(&self) -> Option<f64> {
        self.speed_mps.map(ms_to_kmh)
    }

    /// Check the coordinate ranges and, when present, that the speed is a
    /// finite non-negative number.
    pub fn validate(&self) -> Result<(), CoreError> {
        self.coordinate().validate()?;
        if let Some(speed) = self.speed_mps {
            if !(speed.is_finite() && speed >= 0.0) {
                return Err(CoreError::Validation(format!(
                    "speed must be a non-negative number of m/s, got {speed}"
                )));
            }
        }
        Ok(())
    }
}

/// A legal speed limit in whole km/h. Always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeedLimit(NonZeroU32);

impl SpeedLimit {
    /// `None` for zero, which never counts as a usable limit.
    pub fn new(kmh: u32) -> Option<Self> {
        NonZeroU32::new(kmh).map(Self)
    }

    /// Build a limit in a const context. Panics at compile time on zero.
    pub const fn from_const(kmh: u32) -> Self {
        match NonZeroU32::new(kmh) {
            Some(value) => Self(value),
            None => panic!("speed limit must be positive"),
        }
    }

    pub fn kmh(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for SpeedLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} km/h", self.0)
    }
}
