//! Shared test harness for E2E integration tests.
//!
//! Feeds scripted frames through a filtered `MockCanInterface` into the real
//! ingestion loop, so every test crosses the canbus, logger and sink code.

#![allow(dead_code)]

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};

use jo_canbus::j1939::{build_engine_speed_frame, build_vehicle_distance_frame};
use jo_canbus::types::J1939_FILTERS;
use jo_canbus::{CanError, CanFrame, MockCanInterface, OdometerIntegrator, SpeedModel};
use jo_logger::error::LoggerError;
use jo_logger::ingest::{IngestStats, Ingestor};
use jo_logger::sink::RecordSink;

/// Receive timeout used by every harness run.
pub const RECV_TIMEOUT: Duration = Duration::from_millis(50);

const END_OF_CAPTURE: &str = "end of scripted capture";

/// Scripted CAN bus with timestamps relative to a fixed start time.
pub struct TestHarness {
    /// Mock bus filtered like the deployed SocketCAN interface.
    pub can: MockCanInterface,
    /// Timestamp of second zero.
    pub t0: DateTime<Utc>,
}

impl TestHarness {
    pub fn new() -> Self {
        Self {
            can: MockCanInterface::new().filtered(&J1939_FILTERS),
            t0: Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap(),
        }
    }

    pub fn at(&self, secs: f64) -> DateTime<Utc> {
        self.t0 + chrono::Duration::microseconds((secs * 1e6) as i64)
    }

    pub fn queue_rpm(&self, rpm: f64, secs: f64) {
        self.can
            .queue_frame(build_engine_speed_frame(rpm, self.at(secs)).unwrap());
    }

    pub fn queue_distance(&self, km: f64, secs: f64) {
        self.can
            .queue_frame(build_vehicle_distance_frame(km, self.at(secs)).unwrap());
    }

    pub fn queue_raw(&self, id: u32, data: Vec<u8>, secs: f64) {
        self.can
            .queue_frame(CanFrame::with_timestamp(id, data, self.at(secs)));
    }

    /// Run the ingestion loop until the scripted frames run out.
    ///
    /// The script ends with a source fault, which is the only way the loop
    /// returns without a shutdown signal.
    pub async fn drain(&self, ingestor: &mut Ingestor, sink: &dyn RecordSink) -> IngestStats {
        self.can
            .queue_error(CanError::SourceUnavailable(END_OF_CAPTURE.into()));
        let (_tx, rx) = tokio::sync::watch::channel(false);

        match ingestor.run(&self.can, sink, RECV_TIMEOUT, rx).await {
            Err(LoggerError::SourceUnavailable(msg)) if msg.contains(END_OF_CAPTURE) => {}
            other => panic!("ingestion ended unexpectedly: {other:?}"),
        }
        ingestor.stats()
    }
}

/// Ingestor with the reference wheel model.
pub fn ingestor_from(odometer_km: f64) -> Ingestor {
    Ingestor::new(OdometerIntegrator::seeded(SpeedModel::default(), odometer_km))
}

/// Road speed at `rpm` with the reference 0.8 m wheel.
pub fn speed_kmh(rpm: f64) -> f64 {
    SpeedModel::default().speed_kmh(rpm)
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
