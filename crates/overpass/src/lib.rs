//! Overpass API client for speed-limit lookups.
//!
//! Queries OpenStreetMap ways tagged `maxspeed` around a point and turns
//! the first recognizable tag into a [`SpeedLimit`](speedwatch_core::types::SpeedLimit).

pub mod client;
pub mod response;

pub use client::{OverpassClient, OverpassError};
pub use response::{OverpassResponse, WayElement};
