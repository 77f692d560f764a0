//! Bench transmitter: puts synthetic J1939 traffic on a CAN interface.
//!
//! Usage: `jo-bench-tx <interface> [rpm] [period_ms]`
//!
//! Sends engine speed at a fixed RPM every `period_ms` and a vehicle distance
//! frame once per second, the distance advancing as the same wheel model
//! would integrate it.

use std::time::Duration;

use chrono::Utc;
use tracing_subscriber::EnvFilter;

use jo_canbus::j1939::{build_engine_speed_frame, build_vehicle_distance_frame};
use jo_canbus::odometer::DEFAULT_INITIAL_ODOMETER_KM;
use jo_canbus::{CanInterface, SpeedModel};

const DEFAULT_RPM: f64 = 200.0;
const DEFAULT_PERIOD_MS: u64 = 10;
const DISTANCE_PERIOD: Duration = Duration::from_secs(1);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let mut args = std::env::args().skip(1);
    let interface = args.next().unwrap_or_else(|| "vcan0".to_string());
    let rpm: f64 = match args.next() {
        Some(v) => v.parse()?,
        None => DEFAULT_RPM,
    };
    let period_ms: u64 = match args.next() {
        Some(v) => v.parse()?,
        None => DEFAULT_PERIOD_MS,
    };
    anyhow::ensure!(period_ms > 0, "period_ms must be non-zero");

    #[cfg(target_os = "linux")]
    let can_interface = jo_canbus::SocketCanInterface::open(&interface, &[])?;
    #[cfg(not(target_os = "linux"))]
    let can_interface = {
        tracing::warn!("SocketCAN unavailable on this platform, frames go to a mock bus");
        jo_canbus::MockCanInterface::new()
    };

    tracing::info!(interface = %interface, rpm, period_ms, "jo-bench-tx starting");

    let model = SpeedModel::default();
    let mut odometer_km = DEFAULT_INITIAL_ODOMETER_KM;
    let mut ticker = tokio::time::interval(Duration::from_millis(period_ms));
    let mut distance_ticker = tokio::time::interval(DISTANCE_PERIOD);
    let mut sent: u64 = 0;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                odometer_km += model.speed_kmh(rpm) * period_ms as f64 / 3_600_000.0;
                let frame = build_engine_speed_frame(rpm, Utc::now())?;
                if let Err(e) = can_interface.send_frame(&frame).await {
                    tracing::warn!(error = %e, "failed to send engine speed");
                } else {
                    sent += 1;
                }
            }
            _ = distance_ticker.tick() => {
                let frame = build_vehicle_distance_frame(odometer_km, Utc::now())?;
                if let Err(e) = can_interface.send_frame(&frame).await {
                    tracing::warn!(error = %e, "failed to send vehicle distance");
                } else {
                    sent += 1;
                    tracing::debug!(odometer_km, sent, "vehicle distance sent");
                }
            }
            _ = &mut shutdown => {
                tracing::info!("shutdown signal received");
                break;
            }
        }
    }

    tracing::info!(sent, "jo-bench-tx stopped");
    Ok(())
}
