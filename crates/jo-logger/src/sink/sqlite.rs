//! SQLite-backed record sink.

use std::str::FromStr;

use async_trait::async_trait;
use jo_protocol::{DecodedSample, SampleRecord};
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use super::RecordSink;
use crate::error::{LoggerError, LoggerResult};

/// Row of the `vehicle_data` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VehicleDataRow {
    pub timestamp: String,
    pub pgn: i64,
    pub parameter: String,
    pub value: f64,
}

impl From<VehicleDataRow> for SampleRecord {
    fn from(row: VehicleDataRow) -> Self {
        Self {
            timestamp: row.timestamp,
            pgn: row.pgn,
            parameter: row.parameter,
            value: row.value,
        }
    }
}

/// Writes samples to the `vehicle_data` table.
pub struct SqliteSink {
    pool: SqlitePool,
}

impl SqliteSink {
    /// Open (creating if missing) the database and ensure the schema exists.
    ///
    /// A single pooled connection keeps writes ordered and lets
    /// `sqlite::memory:` behave as one database.
    pub async fn connect(database_url: &str) -> LoggerResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| LoggerError::Config(format!("database_url {database_url}: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| LoggerError::SinkQuery(format!("connect {database_url}: {e}")))?;

        tracing::info!("running database migrations");
        sqlx::raw_sql(include_str!("../../migrations/001_vehicle_data.sql"))
            .execute(&pool)
            .await
            .map_err(|e| LoggerError::SinkQuery(format!("migration: {e}")))?;
        tracing::info!("migrations complete");

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Most recent records, newest first.
    pub async fn recent(&self, limit: u32) -> LoggerResult<Vec<SampleRecord>> {
        let rows = sqlx::query_as::<_, VehicleDataRow>(
            "SELECT timestamp, pgn, parameter, value FROM vehicle_data
             ORDER BY timestamp DESC, rowid DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| LoggerError::SinkQuery(e.to_string()))?;

        Ok(rows.into_iter().map(SampleRecord::from).collect())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        tracing::info!("database connection closed");
    }
}

#[async_trait]
impl RecordSink for SqliteSink {
    async fn insert(&self, sample: &DecodedSample) -> LoggerResult<()> {
        let record = SampleRecord::from(sample);
        sqlx::query(
            "INSERT INTO vehicle_data (timestamp, pgn, parameter, value)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&record.timestamp)
        .bind(record.pgn)
        .bind(&record.parameter)
        .bind(record.value)
        .execute(&self.pool)
        .await
        .map_err(|e| LoggerError::SinkWrite(e.to_string()))?;

        tracing::debug!(
            parameter = %record.parameter,
            value = record.value,
            pgn = record.pgn,
            timestamp = %record.timestamp,
            "stored"
        );
        Ok(())
    }

    async fn latest_odometer(&self) -> LoggerResult<Option<f64>> {
        sqlx::query_scalar::<_, f64>(
            "SELECT value FROM vehicle_data WHERE parameter = 'Odometer'
             ORDER BY timestamp DESC, rowid DESC LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LoggerError::SinkQuery(e.to_string()))
    }
}
