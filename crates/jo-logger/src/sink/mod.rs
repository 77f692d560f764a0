//! Record sinks for decoded samples.
//!
//! A sink is append-only and must answer "most recent Odometer value" so
//! the integrator can resume after a restart.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::Utc;
use jo_protocol::DecodedSample;

use crate::error::LoggerResult;

pub use memory::MemorySink;
pub use sqlite::SqliteSink;

/// Persistent destination for decoded samples.
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// Append one sample.
    async fn insert(&self, sample: &DecodedSample) -> LoggerResult<()>;

    /// Value of the most recent Odometer record, if any.
    async fn latest_odometer(&self) -> LoggerResult<Option<f64>>;
}

/// Resolve the odometer value the integrator starts from.
///
/// An empty store is initialized with a `default_km` Odometer record so the
/// next start resumes from it.
pub async fn seed_odometer(sink: &dyn RecordSink, default_km: f64) -> LoggerResult<f64> {
    if let Some(km) = sink.latest_odometer().await? {
        tracing::info!(odometer_km = km, "resuming from stored odometer");
        return Ok(km);
    }

    sink.insert(&DecodedSample::odometer(default_km, Utc::now()))
        .await?;
    tracing::info!(odometer_km = default_km, "initialized odometer");
    Ok(default_km)
}
