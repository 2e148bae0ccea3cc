//! Decision core of the speed-limit monitor.
//!
//! - [`limit_cache::LimitCache`] decides when a fresh speed-limit lookup is
//!   warranted and serves the last confirmed limit in between.
//! - [`monitor::ViolationMonitor`] turns `(speed, limit)` readings into
//!   discrete violation start/end events.
//! - [`maxspeed`] normalizes raw `maxspeed` tag values to km/h.
//!
//! Nothing in this crate performs I/O; lookups are reached through the
//! [`lookup::SpeedLimitLookup`] trait.

pub mod alert;
pub mod config;
pub mod error;
pub mod geo;
pub mod limit_cache;
pub mod lookup;
pub mod maxspeed;
pub mod monitor;
pub mod types;
