//! Typed Overpass JSON response and limit selection.

use std::collections::HashMap;

use serde::Deserialize;
use speedwatch_core::error::LookupError;
use speedwatch_core::maxspeed::MaxSpeedRules;
use speedwatch_core::types::SpeedLimit;

/// OSM tag carrying the posted limit.
pub const MAXSPEED_TAG: &str = "maxspeed";

/// Body of an `[out:json]` Overpass answer. Only the parts we read.
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    pub elements: Vec<WayElement>,
}

#[derive(Debug, Deserialize)]
pub struct WayElement {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub tags: HashMap<String, String>,
}

impl OverpassResponse {
    pub fn from_json(body: &str) -> Result<Self, LookupError> {
        serde_json::from_str(body).map_err(|e| LookupError::Parse(e.to_string()))
    }

    /// The first element whose `maxspeed` tag normalizes to a usable limit.
    ///
    /// Elements without the tag, or with a value the rules do not
    /// recognize, are skipped. No ranking across ways.
    pub fn select_limit(&self, rules: &MaxSpeedRules) -> Result<SpeedLimit, LookupError> {
        let (way_id, limit) = self
            .elements
            .iter()
            .find_map(|element| {
                let raw = element.tags.get(MAXSPEED_TAG)?;
                rules.normalize(raw).map(|limit| (element.id, limit))
            })
            .ok_or(LookupError::NoData)?;

        tracing::debug!(way_id = ?way_id, limit_kmh = limit.kmh(), "Selected way for speed limit");
        Ok(limit)
    }
}
