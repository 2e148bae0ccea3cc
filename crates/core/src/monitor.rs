//! Two-state violation detector.
//!
//! Turns a stream of `(speed, limit)` readings into discrete
//! [`MonitorEvent::ViolationStarted`] / [`MonitorEvent::ViolationEnded`]
//! transitions. Entering the violating state needs `speed > limit`; leaving
//! it needs `speed <= limit`. Repeated readings on the same side emit
//! nothing, so emitted events always alternate.

use crate::alert::MonitorEvent;
use crate::types::SpeedLimit;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonitorState {
    #[default]
    Compliant,
    Violating,
}

#[derive(Debug, Default)]
pub struct ViolationMonitor {
    state: MonitorState,
}

impl ViolationMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    /// Feed one reading. Returns the transition event, if any.
    ///
    /// `speed_kmh` is compared against the limit as-is; callers convert from
    /// m/s before calling.
    pub fn update(&mut self, speed_kmh: f64, limit: SpeedLimit) -> Option<MonitorEvent> {
        let limit_kmh = limit.kmh();
        let over = speed_kmh > f64::from(limit_kmh);

        match self.state {
            MonitorState::Compliant if over => {
                self.state = MonitorState::Violating;
                Some(MonitorEvent::ViolationStarted {
                    speed_kmh,
                    limit_kmh,
                })
            }
            MonitorState::Violating if speed_kmh <= f64::from(limit_kmh) => {
                self.state = MonitorState::Compliant;
                Some(MonitorEvent::ViolationEnded {
                    speed_kmh,
                    limit_kmh,
                })
            }
            _ => None,
        }
    }

    /// Back to compliant without emitting anything.
    pub fn reset(&mut self) {
        self.state = MonitorState::Compliant;
    }
}
