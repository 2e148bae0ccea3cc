use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use speedwatch_core::config::{MonitorConfig, ZoneLimits};
use speedwatch_core::error::CoreError;
use speedwatch_core::types::SpeedLimit;
use speedwatch_overpass::client::{DEFAULT_OVERPASS_URL, DEFAULT_SEARCH_RADIUS_M};

/// Log output format for the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Runtime configuration loaded from environment variables.
///
/// All fields have defaults matching the deployed behaviour.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Overpass instance root (default: `https://overpass-api.de`).
    pub overpass_url: String,
    /// Radius around each position searched for tagged ways (default: `100` m).
    pub lookup_radius_m: u32,
    /// Decision-core tuning.
    pub monitor: MonitorConfig,
    /// JSON-lines position file to replay. Positions are read from stdin
    /// when unset.
    pub position_file: Option<PathBuf>,
    pub log_format: LogFormat,
}

impl AppConfig {
    /// Load configuration from the process environment (after `.env`).
    ///
    /// | Env Var               | Default                   |
    /// |-----------------------|---------------------------|
    /// | `OVERPASS_URL`        | `https://overpass-api.de` |
    /// | `LOOKUP_RADIUS_M`     | `100`                     |
    /// | `LOOKUP_TIMEOUT_SECS` | `10`                      |
    /// | `LIMIT_REFRESH_KM`    | `0.2`                     |
    /// | `FALLBACK_LIMIT_KMH`  | `60`                      |
    /// | `ZONE_JURISDICTION`   | `ES`                      |
    /// | `URBAN_LIMIT_KMH`     | `50`                      |
    /// | `RURAL_LIMIT_KMH`     | `90`                      |
    /// | `MPH_TO_KMH`          | `1.609`                   |
    /// | `SAMPLE_INTERVAL_MS`  | `1000`                    |
    /// | `POSITION_FILE`       | unset (stdin)             |
    /// | `LOG_FORMAT`          | `pretty` (or `json`)      |
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable source.
    pub fn from_vars<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = MonitorConfig::default();

        let overpass_url = get("OVERPASS_URL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_OVERPASS_URL.to_string());

        let lookup_radius_m = parse_or(
            &get,
            "LOOKUP_RADIUS_M",
            DEFAULT_SEARCH_RADIUS_M,
            "an integer number of meters",
        )?;

        let lookup_timeout_secs: u64 = parse_or(
            &get,
            "LOOKUP_TIMEOUT_SECS",
            defaults.lookup_timeout.as_secs(),
            "an integer number of seconds",
        )?;

        let sample_interval_ms: u64 = parse_or(
            &get,
            "SAMPLE_INTERVAL_MS",
            defaults.sample_interval.as_millis() as u64,
            "an integer number of milliseconds",
        )?;

        let monitor = MonitorConfig {
            refresh_distance_km: parse_or(
                &get,
                "LIMIT_REFRESH_KM",
                defaults.refresh_distance_km,
                "a distance in km",
            )?,
            fallback_limit: limit_or(&get, "FALLBACK_LIMIT_KMH", defaults.fallback_limit)?,
            mph_to_kmh: parse_or(&get, "MPH_TO_KMH", defaults.mph_to_kmh, "a number")?,
            zones: ZoneLimits {
                jurisdiction: get("ZONE_JURISDICTION")
                    .map(|s| s.trim().to_string())
                    .unwrap_or(defaults.zones.jurisdiction),
                urban: limit_or(&get, "URBAN_LIMIT_KMH", defaults.zones.urban)?,
                rural: limit_or(&get, "RURAL_LIMIT_KMH", defaults.zones.rural)?,
            },
            lookup_timeout: Duration::from_secs(lookup_timeout_secs),
            sample_interval: Duration::from_millis(sample_interval_ms),
        };
        monitor.validate()?;

        let position_file = get("POSITION_FILE")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        let log_format = match get("LOG_FORMAT").as_deref().map(str::trim) {
            None | Some("") | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                    expected: "`pretty` or `json`",
                })
            }
        };

        Ok(Self {
            overpass_url,
            lookup_radius_m,
            monitor,
            position_file,
            log_format,
        })
    }
}

fn parse_or<F, T>(
    get: &F,
    name: &'static str,
    default: T,
    expected: &'static str,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
            expected,
        }),
    }
}

fn limit_or<F>(get: &F, name: &'static str, default: SpeedLimit) -> Result<SpeedLimit, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let kmh: u32 = parse_or(get, name, default.kmh(), "a positive integer km/h")?;
    SpeedLimit::new(kmh).ok_or(ConfigError::Invalid {
        name,
        value: kmh.to_string(),
        expected: "a positive integer km/h",
    })
}
