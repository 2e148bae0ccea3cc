//! Classification and normalization of raw `maxspeed` tag values.
//!
//! A raw tag is first classified into a [`MaxSpeed`] variant, then converted
//! to km/h by [`MaxSpeedRules`]. Anything that does not classify, or that
//! converts to zero, is not a usable limit.

use crate::config::{MonitorConfig, ZoneLimits};
use crate::types::SpeedLimit;

/// A recognized shape of `maxspeed` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaxSpeed {
    /// Plain number, already in km/h (`"50"`).
    NumericKmh(u32),
    /// Number followed by an `mph` unit (`"30 mph"`).
    NumericMph(u32),
    /// Implicit jurisdiction limit (`"ES:urban"`).
    NamedZone(String),
}

impl MaxSpeed {
    pub fn classify(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return None;
        }

        if raw.bytes().all(|b| b.is_ascii_digit()) {
            return raw.parse().ok().map(MaxSpeed::NumericKmh);
        }

        if raw.contains("mph") {
            let digits: String = raw.chars().take_while(char::is_ascii_digit).collect();
            return digits.parse().ok().map(MaxSpeed::NumericMph);
        }

        match raw.split_once(':') {
            Some((code, zone))
                if !code.is_empty()
                    && code.chars().all(|c| c.is_ascii_alphabetic())
                    && !zone.is_empty() =>
            {
                Some(MaxSpeed::NamedZone(raw.to_string()))
            }
            _ => None,
        }
    }
}

/// Conversion rules applied to a classified [`MaxSpeed`].
#[derive(Debug, Clone, PartialEq)]
pub struct MaxSpeedRules {
    pub mph_to_kmh: f64,
    pub zones: ZoneLimits,
}

impl MaxSpeedRules {
    pub fn from_config(config: &MonitorConfig) -> Self {
        Self {
            mph_to_kmh: config.mph_to_kmh,
            zones: config.zones.clone(),
        }
    }

    pub fn to_limit(&self, value: &MaxSpeed) -> Option<SpeedLimit> {
        match value {
            MaxSpeed::NumericKmh(kmh) => SpeedLimit::new(*kmh),
            MaxSpeed::NumericMph(mph) => {
                // Truncation toward zero: 30 mph -> 48 km/h.
                let kmh = (f64::from(*mph) * self.mph_to_kmh) as u32;
                SpeedLimit::new(kmh)
            }
            MaxSpeed::NamedZone(token) => self.zones.limit_for(token),
        }
    }

    /// Classify and convert in one step.
    pub fn normalize(&self, raw: &str) -> Option<SpeedLimit> {
        MaxSpeed::classify(raw).and_then(|value| self.to_limit(&value))
    }
}

impl Default for MaxSpeedRules {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}
