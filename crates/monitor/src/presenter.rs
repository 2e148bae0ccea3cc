//! Console presentation of session events.
//!
//! Renders one status line per event and rings the terminal bell on a
//! violation start: three short pulses.

use std::time::Duration;

use speedwatch_core::alert::MonitorEvent;
use speedwatch_events::SessionEvent;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

const BELL: &[u8] = b"\x07";

/// Shape of the audible alert.
#[derive(Debug, Clone)]
pub struct AlertPattern {
    pub pulses: u32,
    /// Pause between pulses.
    pub gap: Duration,
}

impl Default for AlertPattern {
    fn default() -> Self {
        Self {
            pulses: 3,
            gap: Duration::from_millis(300),
        }
    }
}

/// Status line shown for an event.
pub fn render(event: &MonitorEvent) -> String {
    match event {
        MonitorEvent::ViolationStarted {
            speed_kmh,
            limit_kmh,
        } => format!("OVER SPEED: {} km/h (limit {limit_kmh} km/h)", *speed_kmh as u32),
        MonitorEvent::ViolationEnded { speed_kmh, .. } => {
            format!("Speed normal: {} km/h", *speed_kmh as u32)
        }
        MonitorEvent::LimitUpdated { limit_kmh } => format!("Limit: {limit_kmh} km/h"),
    }
}

/// Write status lines for every event received until the bus closes.
///
/// The loop ends only once every sender is dropped and the queue is
/// drained, so the last events of a session are always rendered. Returns
/// the number of events rendered.
pub async fn run_presenter<W>(
    mut rx: broadcast::Receiver<SessionEvent>,
    out: &mut W,
    pattern: &AlertPattern,
) -> std::io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut rendered = 0u64;

    loop {
        let event = match rx.recv().await {
            Ok(event) => event,
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "Presenter fell behind, events dropped");
                continue;
            }
            Err(RecvError::Closed) => break,
        };

        out.write_all(render(&event.event).as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        rendered += 1;

        if matches!(event.event, MonitorEvent::ViolationStarted { .. }) {
            ring(out, pattern).await?;
        }
    }

    Ok(rendered)
}

async fn ring<W>(out: &mut W, pattern: &AlertPattern) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    for pulse in 0..pattern.pulses {
        if pulse > 0 && !pattern.gap.is_zero() {
            tokio::time::sleep(pattern.gap).await;
        }
        out.write_all(BELL).await?;
        out.flush().await?;
    }
    Ok(())
}
