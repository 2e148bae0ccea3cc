//! In-process event bus for monitoring sessions.
//!
//! - [`EventBus`]: publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`SessionEvent`]: a [`MonitorEvent`] tagged with the session that
//!   produced it and when.

pub mod bus;

pub use bus::{EventBus, SessionEvent};
pub use speedwatch_core::alert::MonitorEvent;
