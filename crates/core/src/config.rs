//! Tunable constants for the limit cache, maxspeed normalization and the
//! monitoring session.

use std::time::Duration;

use crate::error::CoreError;
use crate::types::SpeedLimit;

/// Distance from the last queried point beyond which the cached limit is
/// considered stale.
pub const DEFAULT_REFRESH_DISTANCE_KM: f64 = 0.2;

/// Limit assumed before the first successful lookup.
pub const DEFAULT_FALLBACK_LIMIT: SpeedLimit = SpeedLimit::from_const(60);

/// Default jurisdiction code for implicit zone limits (`ES:urban`, `ES:rural`).
pub const DEFAULT_JURISDICTION: &str = "ES";

pub const DEFAULT_URBAN_LIMIT: SpeedLimit = SpeedLimit::from_const(50);

pub const DEFAULT_RURAL_LIMIT: SpeedLimit = SpeedLimit::from_const(90);

/// Statute miles per hour to km/h.
pub const DEFAULT_MPH_TO_KMH: f64 = 1.609;

/// Hard timeout on a single external lookup.
pub const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Expected cadence of position samples.
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_millis(1000);

/// Implicit limits for the named zones of one jurisdiction.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneLimits {
    /// Country prefix of the zone tokens, e.g. `ES` for `ES:urban`.
    pub jurisdiction: String,
    pub urban: SpeedLimit,
    pub rural: SpeedLimit,
}

impl Default for ZoneLimits {
    fn default() -> Self {
        Self {
            jurisdiction: DEFAULT_JURISDICTION.to_string(),
            urban: DEFAULT_URBAN_LIMIT,
            rural: DEFAULT_RURAL_LIMIT,
        }
    }
}

impl ZoneLimits {
    /// Limit for a `<jurisdiction>:<zone>` token, or `None` for zones of
    /// another jurisdiction and unknown zone names.
    pub fn limit_for(&self, token: &str) -> Option<SpeedLimit> {
        let (code, zone) = token.split_once(':')?;
        if code != self.jurisdiction {
            return None;
        }
        match zone {
            "urban" => Some(self.urban),
            "rural" => Some(self.rural),
            _ => None,
        }
    }
}

/// Everything the decision core needs to know, with defaults matching the
/// deployed behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    pub refresh_distance_km: f64,
    pub fallback_limit: SpeedLimit,
    pub mph_to_kmh: f64,
    pub zones: ZoneLimits,
    pub lookup_timeout: Duration,
    pub sample_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            refresh_distance_km: DEFAULT_REFRESH_DISTANCE_KM,
            fallback_limit: DEFAULT_FALLBACK_LIMIT,
            mph_to_kmh: DEFAULT_MPH_TO_KMH,
            zones: ZoneLimits::default(),
            lookup_timeout: DEFAULT_LOOKUP_TIMEOUT,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), CoreError> {
        if !(self.refresh_distance_km.is_finite() && self.refresh_distance_km >= 0.0) {
            return Err(CoreError::Validation(format!(
                "refresh distance must be a non-negative number of km, got {}",
                self.refresh_distance_km
            )));
        }
        if !(self.mph_to_kmh.is_finite() && self.mph_to_kmh > 0.0) {
            return Err(CoreError::Validation(format!(
                "mph conversion factor must be positive, got {}",
                self.mph_to_kmh
            )));
        }
        if self.zones.jurisdiction.is_empty() || self.zones.jurisdiction.contains(':') {
            return Err(CoreError::Validation(format!(
                "jurisdiction code must be non-empty and contain no ':', got {:?}",
                self.zones.jurisdiction
            )));
        }
        if self.lookup_timeout.is_zero() {
            return Err(CoreError::Validation(
                "lookup timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
