//! Seam to the remote speed-limit data source.

use async_trait::async_trait;

use crate::error::LookupError;
use crate::types::{Coordinate, SpeedLimit};

/// Answers "what is the speed limit near this point?".
///
/// Implementations normalize raw source values themselves and report
/// "nothing usable" as [`LookupError::NoData`], never as a zero limit.
#[async_trait]
pub trait SpeedLimitLookup: Send + Sync {
    async fn lookup(&self, at: Coordinate) -> Result<SpeedLimit, LookupError>;
}
