//! In-memory record sink for tests and dry runs.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use jo_protocol::{DecodedSample, Parameter, SampleRecord};
use tokio::sync::RwLock;

use super::RecordSink;
use crate::error::{LoggerError, LoggerResult};

/// Keeps records in insertion order.
#[derive(Default)]
pub struct MemorySink {
    records: RwLock<Vec<SampleRecord>>,
    reject_writes: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `insert` fail (or succeed again).
    pub fn reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Snapshot of all stored records.
    pub async fn records(&self) -> Vec<SampleRecord> {
        self.records.read().await.clone()
    }

    /// Stored records for one parameter, in insertion order.
    pub async fn values(&self, parameter: Parameter) -> Vec<f64> {
        self.records
            .read()
            .await
            .iter()
            .filter(|r| r.parameter == parameter.as_str())
            .map(|r| r.value)
            .collect()
    }
}

#[async_trait]
impl RecordSink for MemorySink {
    async fn insert(&self, sample: &DecodedSample) -> LoggerResult<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(LoggerError::SinkWrite("memory sink is rejecting writes".into()));
        }
        self.records.write().await.push(SampleRecord::from(sample));
        Ok(())
    }

    async fn latest_odometer(&self) -> LoggerResult<Option<f64>> {
        let records = self.records.read().await;
        // Latest timestamp wins; among equal timestamps the last insert wins.
        let latest = records
            .iter()
            .filter(|r| r.parameter == Parameter::Odometer.as_str())
            .fold(None::<&SampleRecord>, |best, r| match best {
                Some(b) if b.timestamp > r.timestamp => Some(b),
                _ => Some(r),
            });
        Ok(latest.map(|r| r.value))
    }
}
