//! `speedwatch-monitor` library crate.
//!
//! Runs monitoring sessions on top of the decision core: position samples
//! arrive over a channel, speed limits are fetched off the sample path, and
//! violation events go out on the [`EventBus`](speedwatch_events::EventBus).
//! The binary entrypoint lives in `main.rs`.

pub mod config;
pub mod presenter;
pub mod session;
pub mod source;
