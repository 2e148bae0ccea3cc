//! A single monitoring session.
//!
//! [`MonitorSession`] pulls [`PositionSample`]s from an mpsc channel and
//! processes them strictly one at a time: validate, decide whether the
//! cached limit is stale, run the violation check against the limit in
//! force, publish any resulting event.
//!
//! Speed-limit lookups never run on that path. A stale limit spawns one
//! lookup task (bounded by a hard timeout) and the loop keeps consuming
//! samples against the cached limit until the result comes back through
//! `tokio::select!`. At most one lookup is outstanding per session; on
//! stop the outstanding task is aborted and its result discarded.

use std::sync::Arc;
use std::time::Duration;

use speedwatch_core::alert::MonitorEvent;
use speedwatch_core::config::MonitorConfig;
use speedwatch_core::error::LookupError;
use speedwatch_core::limit_cache::LimitCache;
use speedwatch_core::lookup::SpeedLimitLookup;
use speedwatch_core::monitor::{MonitorState, ViolationMonitor};
use speedwatch_core::types::{Coordinate, PositionSample, SpeedLimit};
use speedwatch_events::{EventBus, SessionEvent};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Counters reported when a session stops.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub samples_processed: u64,
    pub samples_rejected: u64,
    pub lookups_issued: u64,
    pub lookups_failed: u64,
    pub violations_started: u64,
}

/// The lookup currently running for this session, if any.
struct PendingLookup {
    at: Coordinate,
    handle: JoinHandle<Result<SpeedLimit, LookupError>>,
}

pub struct MonitorSession {
    id: Uuid,
    cache: LimitCache,
    monitor: ViolationMonitor,
    lookup: Arc<dyn SpeedLimitLookup>,
    bus: Arc<EventBus>,
    lookup_timeout: Duration,
    pending: Option<PendingLookup>,
    /// Limit most recently announced through `LimitUpdated`.
    reported_limit: Option<SpeedLimit>,
    summary: SessionSummary,
}

impl MonitorSession {
    pub fn new(
        config: &MonitorConfig,
        lookup: Arc<dyn SpeedLimitLookup>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            cache: LimitCache::from_config(config),
            monitor: ViolationMonitor::new(),
            lookup,
            bus,
            lookup_timeout: config.lookup_timeout,
            pending: None,
            reported_limit: None,
            summary: SessionSummary::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> MonitorState {
        self.monitor.state()
    }

    /// Limit the next sample will be checked against.
    pub fn current_limit(&self) -> SpeedLimit {
        self.cache.last_limit()
    }

    pub fn summary(&self) -> &SessionSummary {
        &self.summary
    }

    /// Prepare for a new run: back to compliant, limit re-announced on the
    /// next sample, counters cleared. The cached limit is kept.
    pub fn restart(&mut self) {
        self.abandon_lookup();
        self.monitor.reset();
        self.reported_limit = None;
        self.summary = SessionSummary::default();
        tracing::info!(session_id = %self.id, "Monitoring session restarted");
    }

    /// Consume samples until the channel closes or `cancel` fires.
    ///
    /// Returns the counters for this run. Any lookup still in flight when
    /// the loop ends is aborted; its result is never applied.
    pub async fn run(
        &mut self,
        samples: &mut mpsc::Receiver<PositionSample>,
        cancel: &CancellationToken,
    ) -> SessionSummary {
        tracing::info!(
            session_id = %self.id,
            limit_kmh = self.cache.last_limit().kmh(),
            "Monitoring session started",
        );

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    tracing::info!(session_id = %self.id, "Monitoring session cancelled");
                    break;
                }
                (at, outcome) = next_lookup_outcome(&mut self.pending) => {
                    self.pending = None;
                    self.finish_lookup(at, outcome);
                }
                sample = samples.recv() => match sample {
                    Some(sample) => self.handle_sample(sample),
                    None => {
                        tracing::info!(session_id = %self.id, "Position stream closed");
                        break;
                    }
                }
            }
        }

        self.abandon_lookup();
        tracing::info!(session_id = %self.id, summary = ?self.summary, "Monitoring session stopped");
        self.summary.clone()
    }

    /// Process one sample to completion.
    pub fn handle_sample(&mut self, sample: PositionSample) {
        if let Err(e) = sample.validate() {
            self.summary.samples_rejected += 1;
            tracing::warn!(session_id = %self.id, error = %e, "Rejecting position sample");
            return;
        }

        let at = sample.coordinate();
        match self.cache.needs_lookup(at) {
            Ok(true) => self.start_lookup(at),
            Ok(false) => {}
            Err(e) => {
                self.summary.samples_rejected += 1;
                tracing::warn!(session_id = %self.id, error = %e, "Rejecting position sample");
                return;
            }
        }
        self.summary.samples_processed += 1;

        let limit = self.cache.last_limit();
        self.announce_limit(limit);

        let Some(speed_kmh) = sample.speed_kmh() else {
            tracing::debug!(session_id = %self.id, %at, "Sample has no speed, skipping violation check");
            return;
        };

        if let Some(event) = self.monitor.update(speed_kmh, limit) {
            if matches!(event, MonitorEvent::ViolationStarted { .. }) {
                self.summary.violations_started += 1;
            }
            tracing::info!(
                session_id = %self.id,
                event = event.name(),
                speed_kmh,
                limit_kmh = limit.kmh(),
                "Speed state changed",
            );
            self.publish(event);
        }
    }

    fn start_lookup(&mut self, at: Coordinate) {
        if self.pending.is_some() {
            tracing::debug!(session_id = %self.id, %at, "Lookup already in flight, skipping");
            return;
        }

        let lookup = Arc::clone(&self.lookup);
        let timeout = self.lookup_timeout;
        let handle = tokio::spawn(async move {
            match tokio::time::timeout(timeout, lookup.lookup(at)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(LookupError::Timeout),
            }
        });

        self.summary.lookups_issued += 1;
        tracing::debug!(session_id = %self.id, %at, "Speed limit lookup started");
        self.pending = Some(PendingLookup { at, handle });
    }

    fn finish_lookup(&mut self, at: Coordinate, outcome: Result<SpeedLimit, LookupError>) {
        if let Err(e) = &outcome {
            self.summary.lookups_failed += 1;
            tracing::warn!(
                session_id = %self.id,
                %at,
                error = %e,
                limit_kmh = self.cache.last_limit().kmh(),
                "Speed limit lookup failed, keeping cached limit",
            );
        }

        if self.cache.apply(at, outcome) {
            tracing::info!(
                session_id = %self.id,
                %at,
                limit_kmh = self.cache.last_limit().kmh(),
                "Speed limit changed",
            );
        }
        self.announce_limit(self.cache.last_limit());
    }

    /// Publish `LimitUpdated` if `limit` differs from the last one announced.
    fn announce_limit(&mut self, limit: SpeedLimit) {
        if self.reported_limit == Some(limit) {
            return;
        }
        self.reported_limit = Some(limit);
        self.publish(MonitorEvent::LimitUpdated {
            limit_kmh: limit.kmh(),
        });
    }

    fn abandon_lookup(&mut self) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(session_id = %self.id, at = %pending.at, "Abandoning in-flight lookup");
            pending.handle.abort();
        }
    }

    fn publish(&self, event: MonitorEvent) {
        self.bus.publish(SessionEvent::new(self.id, event));
    }
}

impl Drop for MonitorSession {
    fn drop(&mut self) {
        self.abandon_lookup();
    }
}

/// Resolve once the pending lookup finishes; never resolves when idle.
async fn next_lookup_outcome(
    pending: &mut Option<PendingLookup>,
) -> (Coordinate, Result<SpeedLimit, LookupError>) {
    let Some(pending) = pending.as_mut() else {
        return std::future::pending().await;
    };

    let outcome = match (&mut pending.handle).await {
        Ok(outcome) => outcome,
        Err(e) => Err(LookupError::Unavailable(format!("lookup task failed: {e}"))),
    };
    (pending.at, outcome)
}
