//! HTTP client for the Overpass `interpreter` endpoint.
//!
//! Wraps a [`reqwest::Client`] with connect/read timeouts and exposes the
//! lookup through [`SpeedLimitLookup`].

use async_trait::async_trait;
use speedwatch_core::config::MonitorConfig;
use speedwatch_core::error::LookupError;
use speedwatch_core::lookup::SpeedLimitLookup;
use speedwatch_core::maxspeed::MaxSpeedRules;
use speedwatch_core::types::{Coordinate, SpeedLimit};

use crate::response::OverpassResponse;

/// Public Overpass instance used when none is configured.
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de";

/// Search radius around the queried point, in meters.
pub const DEFAULT_SEARCH_RADIUS_M: u32 = 100;

/// Server-side query timeout in seconds, embedded in the query itself.
const QUERY_TIMEOUT_SECS: u32 = 5;

/// Errors from the Overpass HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum OverpassError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Overpass returned a non-2xx status code.
    #[error("Overpass API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },
}

impl From<OverpassError> for LookupError {
    fn from(err: OverpassError) -> Self {
        match err {
            OverpassError::Request(e) if e.is_timeout() => LookupError::Timeout,
            OverpassError::Request(e) if e.is_decode() => LookupError::Parse(e.to_string()),
            other => LookupError::Unavailable(other.to_string()),
        }
    }
}

/// Speed-limit lookups against one Overpass instance.
pub struct OverpassClient {
    client: reqwest::Client,
    base_url: String,
    radius_m: u32,
    rules: MaxSpeedRules,
}

impl OverpassClient {
    /// Build a client whose requests give up after `config.lookup_timeout`.
    ///
    /// * `base_url` - Instance root, e.g. `https://overpass-api.de`.
    pub fn new(
        base_url: &str,
        radius_m: u32,
        config: &MonitorConfig,
    ) -> Result<Self, OverpassError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.lookup_timeout)
            .timeout(config.lookup_timeout)
            .user_agent(concat!("speedwatch/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url, radius_m, config))
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: &str,
        radius_m: u32,
        config: &MonitorConfig,
    ) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            radius_m,
            rules: MaxSpeedRules::from_config(config),
        }
    }

    pub fn interpreter_url(&self) -> String {
        format!("{}/api/interpreter", self.base_url)
    }

    /// Fetch the raw Overpass answer for ways with a `maxspeed` tag near `at`.
    pub async fn fetch(&self, at: Coordinate) -> Result<String, OverpassError> {
        let query = build_query(at, self.radius_m);
        tracing::debug!(%at, radius_m = self.radius_m, "Querying Overpass");

        let response = self
            .client
            .get(self.interpreter_url())
            .query(&[("data", query.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(OverpassError::ApiError {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl SpeedLimitLookup for OverpassClient {
    async fn lookup(&self, at: Coordinate) -> Result<SpeedLimit, LookupError> {
        let body = self.fetch(at).await?;
        let parsed = OverpassResponse::from_json(&body)?;
        let limit = parsed.select_limit(&self.rules)?;

        tracing::debug!(
            %at,
            ways = parsed.elements.len(),
            limit_kmh = limit.kmh(),
            "Overpass lookup resolved",
        );
        Ok(limit)
    }
}

/// Overpass QL selecting ways with a `maxspeed` tag within `radius_m` of `at`.
pub fn build_query(at: Coordinate, radius_m: u32) -> String {
    format!(
        "[out:json][timeout:{QUERY_TIMEOUT_SECS}];(way(around:{radius_m},{:.6},{:.6})[\"maxspeed\"];);out body;",
        at.latitude, at.longitude,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_embeds_point_and_radius() {
        let q = build_query(Coordinate::new(40.4168, -3.7038), 100);
        assert_eq!(
            q,
            "[out:json][timeout:5];(way(around:100,40.416800,-3.703800)[\"maxspeed\"];);out body;"
        );
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = OverpassClient::with_client(
            reqwest::Client::new(),
            "https://overpass.example/",
            100,
            &MonitorConfig::default(),
        );
        assert_eq!(client.interpreter_url(), "https://overpass.example/api/interpreter");
    }

    #[test]
    fn api_errors_map_to_unavailable() {
        let err: LookupError = OverpassError::ApiError {
            status: 429,
            body: "Too Many Requests".into(),
        }
        .into();
        assert!(matches!(err, LookupError::Unavailable(msg) if msg.contains("429")));
    }
}
