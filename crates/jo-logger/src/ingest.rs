//! Frame ingestion loop.
//!
//! Receives one frame at a time, runs it through the odometer integrator and
//! appends the resulting samples to the sink before fetching the next frame.
//! Decode problems skip the frame; source and sink failures end the loop.

use std::time::Duration;

use jo_canbus::{CanError, CanFrame, CanInterface, OdometerIntegrator};
use tokio::sync::watch;

use crate::error::{LoggerError, LoggerResult};
use crate::sink::RecordSink;

/// Counters reported when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Frames received from the source.
    pub frames: u64,
    pub samples_written: u64,
    pub short_payloads: u64,
    pub unrecognized: u64,
    /// Receive waits that ended without a frame.
    pub timeouts: u64,
}

/// Single-owner pipeline from frames to stored samples.
pub struct Ingestor {
    integrator: OdometerIntegrator,
    stats: IngestStats,
}

impl Ingestor {
    pub fn new(integrator: OdometerIntegrator) -> Self {
        Self {
            integrator,
            stats: IngestStats::default(),
        }
    }

    pub fn integrator(&self) -> &OdometerIntegrator {
        &self.integrator
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    /// Decode, integrate and store one frame. Returns the number of samples
    /// written; skipped frames write none.
    pub async fn handle_frame(
        &mut self,
        frame: &CanFrame,
        sink: &dyn RecordSink,
    ) -> LoggerResult<usize> {
        self.stats.frames += 1;

        let samples = match self.integrator.process(frame) {
            Ok(samples) => samples,
            Err(CanError::ShortPayload { pgn, need, got }) => {
                self.stats.short_payloads += 1;
                tracing::warn!(
                    id = format_args!("0x{:08X}", frame.id),
                    %pgn,
                    need,
                    got,
                    data = %frame.hex_data(),
                    "payload too short, frame skipped"
                );
                return Ok(0);
            }
            Err(CanError::UnrecognizedPgn { pgn }) => {
                self.stats.unrecognized += 1;
                tracing::debug!(
                    id = format_args!("0x{:08X}", frame.id),
                    %pgn,
                    "untracked PGN, frame skipped"
                );
                return Ok(0);
            }
            Err(e) => return Err(LoggerError::SourceUnavailable(e.to_string())),
        };

        for sample in &samples {
            sink.insert(sample).await?;
            self.stats.samples_written += 1;
        }
        Ok(samples.len())
    }

    /// Run until `shutdown` flips to `true`, the source faults, or a write fails.
    ///
    /// Shutdown is checked between frames and interrupts an idle receive wait.
    /// A dropped shutdown sender also stops the loop.
    pub async fn run(
        &mut self,
        iface: &dyn CanInterface,
        sink: &dyn RecordSink,
        recv_timeout: Duration,
        mut shutdown: watch::Receiver<bool>,
    ) -> LoggerResult<IngestStats> {
        tracing::info!(
            odometer_km = self.integrator.odometer_km(),
            recv_timeout_ms = recv_timeout.as_millis() as u64,
            "ingestion started"
        );

        loop {
            let stop = *shutdown.borrow_and_update();
            if stop {
                tracing::info!("shutdown requested");
                break;
            }

            let received = tokio::select! {
                received = iface.recv_frame(recv_timeout) => received,
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        tracing::info!("shutdown channel closed");
                        break;
                    }
                    continue;
                }
            };

            match received {
                Ok(frame) => {
                    if let Err(e) = self.handle_frame(&frame, sink).await {
                        tracing::error!(error = %e, "ingestion aborted");
                        return Err(e);
                    }
                }
                Err(CanError::Timeout { .. }) => {
                    self.stats.timeouts += 1;
                    tracing::debug!("no frame received, waiting");
                }
                Err(e) => {
                    tracing::error!(error = %e, "CAN source failed");
                    return Err(LoggerError::SourceUnavailable(e.to_string()));
                }
            }
        }

        tracing::info!(
            frames = self.stats.frames,
            samples_written = self.stats.samples_written,
            short_payloads = self.stats.short_payloads,
            unrecognized = self.stats.unrecognized,
            odometer_km = self.integrator.odometer_km(),
            "ingestion stopped"
        );
        Ok(self.stats)
    }
}
