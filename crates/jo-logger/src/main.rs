//! J1939 odometer logger. Records engine speed and odometer readings.
//!
//! Reads J1939 frames from SocketCAN, integrates distance from engine RPM
//! and appends every decoded sample to a SQLite store.

use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use jo_canbus::OdometerIntegrator;
use jo_logger::config::LoggerConfig;
use jo_logger::ingest::Ingestor;
use jo_logger::sink::{SqliteSink, seed_odometer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "jo-logger starting");

    // ── Load config ─────────────────────────────────────────────
    let config = match std::env::args().nth(1) {
        Some(path) => LoggerConfig::from_file(&path)?,
        None => {
            tracing::info!("no config path given, using defaults");
            LoggerConfig::default()
        }
    }
    .with_env_overrides();
    config.validate()?;
    tracing::info!(
        can_interface = %config.can_interface,
        database_url = %config.database_url,
        wheel_diameter_m = config.vehicle.wheel_diameter_m,
        "config loaded"
    );

    // ── Record store + odometer seed ────────────────────────────
    let sink = SqliteSink::connect(&config.database_url).await?;
    let seed_km = seed_odometer(&sink, config.initial_odometer_km).await?;

    // ── CAN interface ───────────────────────────────────────────
    #[cfg(target_os = "linux")]
    let can_interface = jo_canbus::SocketCanInterface::open(
        &config.can_interface,
        &jo_canbus::types::J1939_FILTERS,
    )?;
    #[cfg(not(target_os = "linux"))]
    let can_interface = {
        tracing::warn!("SocketCAN unavailable on this platform, using an idle mock bus");
        jo_canbus::MockCanInterface::new()
    };

    // ── Graceful shutdown on SIGINT ─────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown signal received");
            let _ = shutdown_tx.send(true);
        }
    });

    tracing::info!("jo-logger ready");

    let mut ingestor = Ingestor::new(OdometerIntegrator::seeded(
        config.vehicle.speed_model(),
        seed_km,
    ));
    let result = ingestor
        .run(&can_interface, &sink, config.recv_timeout(), shutdown_rx)
        .await;

    sink.close().await;
    result?;

    tracing::info!("jo-logger stopped");
    Ok(())
}
