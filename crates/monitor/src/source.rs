//! Position sources feeding a session's sample channel.
//!
//! Samples are read as JSON lines:
//!
//! ```text
//! {"latitude":40.4168,"longitude":-3.7038,"speed_mps":13.9,"timestamp":"2024-05-01T10:00:00Z"}
//! ```
//!
//! Blank lines are ignored and malformed lines are logged and skipped, so
//! one bad fix never ends the stream.

use std::path::Path;
use std::time::Duration;

use speedwatch_core::types::PositionSample;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("Failed to read position stream: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed position sample: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Parse a single JSON-lines record.
pub fn parse_sample(line: &str) -> Result<PositionSample, SourceError> {
    Ok(serde_json::from_str(line)?)
}

/// Forward every sample read from `reader` into `tx`.
///
/// With `pace` set, waits that long after each forwarded sample, which
/// replays a recorded track at its original cadence. Stops at end of input,
/// when the receiver goes away, or when `cancel` fires. Returns the number
/// of samples forwarded.
pub async fn forward_json_lines<R>(
    reader: R,
    tx: mpsc::Sender<PositionSample>,
    pace: Option<Duration>,
    cancel: CancellationToken,
) -> Result<u64, SourceError>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.split(b'\n');
    let mut forwarded = 0u64;
    let mut line_no = 0u64;

    loop {
        let raw = tokio::select! {
            _ = cancel.cancelled() => break,
            raw = lines.next_segment() => raw?,
        };
        let Some(mut raw) = raw else {
            tracing::debug!(forwarded, "Position input exhausted");
            break;
        };
        line_no += 1;

        if raw.last() == Some(&b'\r') {
            raw.pop();
        }
        let line = match std::str::from_utf8(&raw) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "Skipping position line that is not UTF-8");
                continue;
            }
        };

        if line.trim().is_empty() {
            continue;
        }

        let sample = match parse_sample(line) {
            Ok(sample) => sample,
            Err(e) => {
                tracing::warn!(line = line_no, error = %e, "Skipping malformed position line");
                continue;
            }
        };

        if tx.send(sample).await.is_err() {
            tracing::debug!("Sample receiver dropped, stopping position source");
            break;
        }
        forwarded += 1;

        if let Some(delay) = pace {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    Ok(forwarded)
}

/// Replay a recorded JSON-lines track, one sample per `interval`.
pub async fn replay_file(
    path: &Path,
    tx: mpsc::Sender<PositionSample>,
    interval: Duration,
    cancel: CancellationToken,
) -> Result<u64, SourceError> {
    let file = tokio::fs::File::open(path).await?;
    tracing::info!(path = %path.display(), interval_ms = interval.as_millis() as u64, "Replaying position file");
    forward_json_lines(BufReader::new(file), tx, Some(interval), cancel).await
}

/// Read live samples from stdin as they arrive.
pub async fn read_stdin(
    tx: mpsc::Sender<PositionSample>,
    cancel: CancellationToken,
) -> Result<u64, SourceError> {
    tracing::info!("Reading position samples from stdin");
    forward_json_lines(BufReader::new(tokio::io::stdin()), tx, None, cancel).await
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parses_full_and_partial_records() {
        let full = parse_sample(
            r#"{"latitude":40.0,"longitude":-3.0,"speed_mps":10.0,"timestamp":"2024-05-01T10:00:00Z"}"#,
        )
        .expect("valid record");
        assert_eq!(full.speed_mps, Some(10.0));

        let no_speed =
            parse_sample(r#"{"latitude":40.0,"longitude":-3.0,"timestamp":"2024-05-01T10:00:01Z"}"#)
                .expect("speed is optional");
        assert_eq!(no_speed.speed_mps, None);
    }

    #[test]
    fn rejects_records_without_timestamp() {
        assert_matches!(
            parse_sample(r#"{"latitude":40.0,"longitude":-3.0}"#),
            Err(SourceError::Malformed(_))
        );
    }

    #[tokio::test]
    async fn skips_blank_and_malformed_lines() {
        let mut input = Vec::new();
        input.extend_from_slice(
            br#"{"latitude":40.0,"longitude":-3.0,"speed_mps":1.0,"timestamp":"2024-05-01T10:00:00Z"}"#,
        );
        input.extend_from_slice(b"\n\nnot json\n\xff\xfe garbage\n");
        input.extend_from_slice(
            br#"{"latitude":40.1,"longitude":-3.0,"speed_mps":2.0,"timestamp":"2024-05-01T10:00:01Z"}"#,
        );
        input.extend_from_slice(b"\r\n");
        let (tx, mut rx) = mpsc::channel(8);

        let forwarded = forward_json_lines(input.as_slice(), tx, None, CancellationToken::new())
            .await
            .expect("in-memory read cannot fail");

        assert_eq!(forwarded, 2);
        assert_eq!(rx.recv().await.map(|s| s.latitude), Some(40.0));
        assert_eq!(rx.recv().await.map(|s| s.latitude), Some(40.1));
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn stops_when_receiver_is_dropped() {
        let input = concat!(
            r#"{"latitude":40.0,"longitude":-3.0,"timestamp":"2024-05-01T10:00:00Z"}"#,
            "\n",
        );
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let forwarded = forward_json_lines(input.as_bytes(), tx, None, CancellationToken::new())
            .await
            .expect("in-memory read cannot fail");
        assert_eq!(forwarded, 0);
    }

    #[tokio::test]
    async fn cancel_ends_a_stalled_read() {
        // The writer half stays open and silent, so the read never completes.
        let (_writer, reader) = tokio::io::duplex(64);
        let (tx, _rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();

        let task = tokio::spawn(forward_json_lines(BufReader::new(reader), tx, None, cancel.clone()));
        tokio::task::yield_now().await;
        cancel.cancel();

        let forwarded = task
            .await
            .expect("source task")
            .expect("cancel is not an error");
        assert_eq!(forwarded, 0);
    }
}
