//! Distance-gated cache of the speed limit in force.
//!
//! Pure logic, no I/O: the lookup itself is injected by the caller. A new
//! lookup is warranted only once the position has moved more than the
//! refresh distance away from the point of the last successful lookup.
//! Failed lookups leave the cache exactly as it was, so the last confirmed
//! limit keeps being served.

use crate::config::MonitorConfig;
use crate::error::{CoreError, LookupError};
use crate::geo::distance_between;
use crate::types::{Coordinate, SpeedLimit};

/// State owned by [`LimitCache`].
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    /// Limit from the last successful lookup, or the fallback.
    pub last_limit: SpeedLimit,
    /// Where the last successful lookup was made. `None` until the first
    /// success, which makes the very first position always trigger a lookup.
    pub last_query: Option<Coordinate>,
}

#[derive(Debug, Clone)]
pub struct LimitCache {
    entry: CacheEntry,
    refresh_distance_km: f64,
}

impl LimitCache {
    pub fn new(fallback: SpeedLimit, refresh_distance_km: f64) -> Self {
        Self {
            entry: CacheEntry {
                last_limit: fallback,
                last_query: None,
            },
            refresh_distance_km,
        }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.fallback_limit, config.refresh_distance_km)
    }

    pub fn last_limit(&self) -> SpeedLimit {
        self.entry.last_limit
    }

    pub fn last_query(&self) -> Option<Coordinate> {
        self.entry.last_query
    }

    pub fn entry(&self) -> &CacheEntry {
        &self.entry
    }

    /// Whether a lookup at `at` is warranted.
    ///
    /// Rejects malformed coordinates without touching the cache.
    pub fn needs_lookup(&self, at: Coordinate) -> Result<bool, CoreError> {
        at.validate()?;
        Ok(match self.entry.last_query {
            None => true,
            Some(last) => distance_between(last, at) > self.refresh_distance_km,
        })
    }

    /// Record the outcome of a lookup made at `at`.
    ///
    /// On success both the coordinate and the limit are replaced together;
    /// on failure nothing changes. Returns `true` when the served limit
    /// changed value.
    pub fn apply(&mut self, at: Coordinate, outcome: Result<SpeedLimit, LookupError>) -> bool {
        let Ok(limit) = outcome else {
            return false;
        };
        if at.validate().is_err() {
            return false;
        }

        let changed = limit != self.entry.last_limit;
        self.entry = CacheEntry {
            last_limit: limit,
            last_query: Some(at),
        };
        changed
    }

    /// Return the best available limit for `at`, calling `lookup` at most
    /// once if the cached value may be stale.
    pub fn resolve<F>(&mut self, at: Coordinate, lookup: F) -> Result<SpeedLimit, CoreError>
    where
        F: FnOnce(Coordinate) -> Result<SpeedLimit, LookupError>,
    {
        if self.needs_lookup(at)? {
            self.apply(at, lookup(at));
        }
        Ok(self.entry.last_limit)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use assert_matches::assert_matches;

    use super::*;

    fn limit(kmh: u32) -> SpeedLimit {
        SpeedLimit::new(kmh).unwrap()
    }

    fn cache() -> LimitCache {
        LimitCache::from_config(&MonitorConfig::default())
    }

    #[test]
    fn starts_with_fallback_and_no_query_point() {
        let cache = cache();
        assert_eq!(cache.last_limit(), limit(60));
        assert!(cache.last_query().is_none());
    }

    #[test]
    fn first_resolve_always_looks_up() {
        let mut cache = cache();
        let calls = Cell::new(0);
        let result = cache.resolve(Coordinate::new(0.0, 0.0), |_| {
            calls.set(calls.get() + 1);
            Ok(limit(30))
        });
        assert_eq!(result.unwrap(), limit(30));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn nearby_resolve_reuses_cached_limit() {
        let mut cache = cache();
        let calls = Cell::new(0);
        let lookup = |_: Coordinate| {
            calls.set(calls.get() + 1);
            Ok(limit(50))
        };

        assert_eq!(cache.resolve(Coordinate::new(40.0, -3.0), lookup).unwrap(), limit(50));
        assert_eq!(cache.resolve(Coordinate::new(40.001, -3.0), lookup).unwrap(), limit(50));
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.last_query(), Some(Coordinate::new(40.0, -3.0)));
    }

    #[test]
    fn positions_within_threshold_trigger_at_most_one_lookup() {
        let mut cache = cache();
        let calls = Cell::new(0);
        // Each step is ~22 m; all within 0.2 km of the first point.
        for i in 0..9 {
            let at = Coordinate::new(40.0 + f64::from(i) * 0.0002, -3.0);
            cache
                .resolve(at, |_| {
                    calls.set(calls.get() + 1);
                    Ok(limit(80))
                })
                .unwrap();
        }
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn moving_past_threshold_looks_up_again() {
        let mut cache = cache();
        cache.resolve(Coordinate::new(40.0, -3.0), |_| Ok(limit(50))).unwrap();
        // ~0.33 km north.
        let result = cache.resolve(Coordinate::new(40.003, -3.0), |_| Ok(limit(90)));
        assert_eq!(result.unwrap(), limit(90));
        assert_eq!(cache.last_query(), Some(Coordinate::new(40.003, -3.0)));
    }

    #[test]
    fn failed_lookup_leaves_cache_untouched() {
        let mut cache = cache();
        cache.resolve(Coordinate::new(40.0, -3.0), |_| Ok(limit(50))).unwrap();
        let before = cache.entry().clone();

        for error in [
            LookupError::Timeout,
            LookupError::Unavailable("connection refused".into()),
            LookupError::NoData,
            LookupError::Parse("unexpected token".into()),
        ] {
            let result = cache.resolve(Coordinate::new(41.0, -3.0), |_| Err(error.clone()));
            assert_eq!(result.unwrap(), limit(50));
            assert_eq!(cache.entry(), &before);
        }
    }

    #[test]
    fn failed_first_lookup_keeps_fallback_and_retries() {
        let mut cache = cache();
        let at = Coordinate::new(40.0, -3.0);
        assert_eq!(cache.resolve(at, |_| Err(LookupError::NoData)).unwrap(), limit(60));
        assert!(cache.last_query().is_none());

        let calls = Cell::new(0);
        cache
            .resolve(at, |_| {
                calls.set(calls.get() + 1);
                Ok(limit(40))
            })
            .unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(cache.last_limit(), limit(40));
    }

    #[test]
    fn malformed_position_is_rejected_without_lookup() {
        let mut cache = cache();
        let result = cache.resolve(Coordinate::new(123.0, 0.0), |_| {
            panic!("lookup must not run for invalid input")
        });
        assert_matches!(result, Err(CoreError::Validation(_)));
        assert!(cache.last_query().is_none());
        assert_eq!(cache.last_limit(), limit(60));
    }

    #[test]
    fn apply_reports_value_changes() {
        let mut cache = cache();
        let at = Coordinate::new(40.0, -3.0);
        assert!(!cache.apply(at, Ok(limit(60))));
        assert_eq!(cache.last_query(), Some(at));
        assert!(cache.apply(Coordinate::new(41.0, -3.0), Ok(limit(90))));
        assert!(!cache.apply(at, Err(LookupError::Timeout)));
        assert_eq!(cache.last_limit(), limit(90));
    }

    #[test]
    fn exactly_at_threshold_does_not_look_up() {
        let mut cache = LimitCache::new(limit(60), 0.0);
        let at = Coordinate::new(10.0, 10.0);
        cache.apply(at, Ok(limit(70)));
        // Zero distance is not greater than a zero threshold.
        assert!(!cache.needs_lookup(at).unwrap());
    }
}
