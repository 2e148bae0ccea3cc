//! Events handed to the presentation layer.

use serde::{Deserialize, Serialize};

/// A change the presentation layer should react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// Speed went above the limit while compliant.
    ViolationStarted { speed_kmh: f64, limit_kmh: u32 },
    /// Speed returned to or below the limit while violating.
    ViolationEnded { speed_kmh: f64, limit_kmh: u32 },
    /// The limit in force differs from the one last reported.
    LimitUpdated { limit_kmh: u32 },
}

impl MonitorEvent {
    /// Dot-separated name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            MonitorEvent::ViolationStarted { .. } => "violation.started",
            MonitorEvent::ViolationEnded { .. } => "violation.ended",
            MonitorEvent::LimitUpdated { .. } => "limit.updated",
        }
    }
}
