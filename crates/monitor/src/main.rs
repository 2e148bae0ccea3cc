//! `speedwatch` -- speed-limit violation monitor.
//!
//! Reads position samples as JSON lines (from `POSITION_FILE`, replayed at
//! `SAMPLE_INTERVAL_MS`, or live from stdin), looks up the posted limit via
//! the Overpass API, and prints a status line plus an audible alert when
//! the speed crosses the limit. See [`AppConfig::from_env`] for the full
//! list of environment variables.

use std::sync::Arc;

use anyhow::Context;
use speedwatch_events::EventBus;
use speedwatch_monitor::config::{AppConfig, LogFormat};
use speedwatch_monitor::presenter::{run_presenter, AlertPattern};
use speedwatch_monitor::session::MonitorSession;
use speedwatch_monitor::source;
use speedwatch_overpass::OverpassClient;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Samples buffered between the position source and the session.
const SAMPLE_CHANNEL_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env().context("invalid configuration")?;
    init_tracing(config.log_format);

    tracing::info!(
        overpass_url = %config.overpass_url,
        radius_m = config.lookup_radius_m,
        refresh_km = config.monitor.refresh_distance_km,
        fallback_kmh = config.monitor.fallback_limit.kmh(),
        "Starting speedwatch",
    );

    let lookup = OverpassClient::new(&config.overpass_url, config.lookup_radius_m, &config.monitor)
        .context("failed to build Overpass client")?;
    let bus = Arc::new(EventBus::default());
    let cancel = CancellationToken::new();

    // Ends once the session and this function drop their bus handles.
    let presenter = tokio::spawn({
        let rx = bus.subscribe();
        async move {
            let mut stdout = tokio::io::stdout();
            run_presenter(rx, &mut stdout, &AlertPattern::default()).await
        }
    });

    let reads_stdin = config.position_file.is_none();
    let (tx, mut samples) = mpsc::channel(SAMPLE_CHANNEL_CAPACITY);
    let reader = tokio::spawn({
        let cancel = cancel.clone();
        let position_file = config.position_file.clone();
        let interval = config.monitor.sample_interval;
        async move {
            match position_file {
                Some(path) => source::replay_file(&path, tx, interval, cancel).await,
                None => source::read_stdin(tx, cancel).await,
            }
        }
    });

    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Interrupt received, stopping");
                cancel.cancel();
            }
        }
    });

    let mut session = MonitorSession::new(&config.monitor, Arc::new(lookup), Arc::clone(&bus));
    let summary = session.run(&mut samples, &cancel).await;
    let interrupted = cancel.is_cancelled();

    // Close the bus so the presenter drains what is queued and returns.
    drop(session);
    drop(bus);

    cancel.cancel();
    match reader.await {
        Ok(Ok(forwarded)) => tracing::debug!(forwarded, "Position source finished"),
        Ok(Err(e)) => tracing::error!(error = %e, "Position source failed"),
        Err(e) => tracing::error!(error = %e, "Position source task panicked"),
    }
    if let Ok(Err(e)) = presenter.await {
        tracing::error!(error = %e, "Failed to write status output");
    }

    tracing::info!(
        samples = summary.samples_processed,
        rejected = summary.samples_rejected,
        lookups = summary.lookups_issued,
        lookup_failures = summary.lookups_failed,
        violations = summary.violations_started,
        "speedwatch stopped",
    );

    // A pending stdin read sits on a blocking thread that cannot be
    // cancelled, and runtime shutdown would wait for it.
    if interrupted && reads_stdin {
        std::process::exit(0);
    }
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "speedwatch=info,speedwatch_monitor=info,speedwatch_overpass=info".into());

    match format {
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}
