//! Logger configuration, loadable from TOML with environment overrides.

use std::time::Duration;

use jo_canbus::SpeedModel;
use jo_canbus::odometer::{DEFAULT_INITIAL_ODOMETER_KM, DEFAULT_WHEEL_DIAMETER_M};
use serde::Deserialize;

use crate::error::{LoggerError, LoggerResult};

/// Top-level configuration for the logger.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    /// SocketCAN interface name (e.g., "can0", "vcan0").
    #[serde(default = "default_can_interface")]
    pub can_interface: String,
    /// SQLite connection URL for the record store.
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// Bounded wait per receive before checking for shutdown again.
    #[serde(default = "default_recv_timeout_ms")]
    pub recv_timeout_ms: u64,
    /// Odometer seed when the record store is empty.
    #[serde(default = "default_initial_odometer_km")]
    pub initial_odometer_km: f64,
    /// Wheel model used to derive speed from engine RPM.
    #[serde(default)]
    pub vehicle: VehicleConfig,
}

/// Wheel geometry for the RPM-to-speed conversion.
#[derive(Debug, Clone, Deserialize)]
pub struct VehicleConfig {
    #[serde(default = "default_wheel_diameter_m")]
    pub wheel_diameter_m: f64,
    /// Wheel revolutions per engine revolution (1.0 = no gearing).
    #[serde(default = "default_wheel_revs_per_engine_rev")]
    pub wheel_revs_per_engine_rev: f64,
}

fn default_can_interface() -> String {
    "vcan0".to_string()
}

fn default_database_url() -> String {
    "sqlite://j1939_data.db?mode=rwc".to_string()
}

fn default_recv_timeout_ms() -> u64 {
    1000
}

fn default_initial_odometer_km() -> f64 {
    DEFAULT_INITIAL_ODOMETER_KM
}

fn default_wheel_diameter_m() -> f64 {
    DEFAULT_WHEEL_DIAMETER_M
}

fn default_wheel_revs_per_engine_rev() -> f64 {
    1.0
}

impl Default for VehicleConfig {
    fn default() -> Self {
        Self {
            wheel_diameter_m: default_wheel_diameter_m(),
            wheel_revs_per_engine_rev: default_wheel_revs_per_engine_rev(),
        }
    }
}

impl VehicleConfig {
    pub fn speed_model(&self) -> SpeedModel {
        SpeedModel::new(self.wheel_diameter_m, self.wheel_revs_per_engine_rev)
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            can_interface: default_can_interface(),
            database_url: default_database_url(),
            recv_timeout_ms: default_recv_timeout_ms(),
            initial_odometer_km: default_initial_odometer_km(),
            vehicle: VehicleConfig::default(),
        }
    }
}

impl LoggerConfig {
    /// Load config from a TOML file path.
    pub fn from_file(path: &str) -> LoggerResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LoggerError::Config(format!("{path}: {e}")))?;
        Self::from_toml(&contents).map_err(|e| match e {
            LoggerError::Config(msg) => LoggerError::Config(format!("{path}: {msg}")),
            other => other,
        })
    }

    pub fn from_toml(contents: &str) -> LoggerResult<Self> {
        toml::from_str(contents).map_err(|e| LoggerError::Config(e.to_string()))
    }

    /// Apply `DATABASE_URL` and `CAN_INTERFACE` from the process environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(iface) = lookup("CAN_INTERFACE") {
            self.can_interface = iface;
        }
        self
    }

    /// Reject values the integrator cannot work with.
    pub fn validate(&self) -> LoggerResult<()> {
        let positive = |name: &str, v: f64| {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(LoggerError::Config(format!("{name} must be positive, got {v}")))
            }
        };
        positive("vehicle.wheel_diameter_m", self.vehicle.wheel_diameter_m)?;
        positive(
            "vehicle.wheel_revs_per_engine_rev",
            self.vehicle.wheel_revs_per_engine_rev,
        )?;

        if !self.initial_odometer_km.is_finite() || self.initial_odometer_km < 0.0 {
            return Err(LoggerError::Config(format!(
                "initial_odometer_km must be non-negative, got {}",
                self.initial_odometer_km
            )));
        }
        if self.recv_timeout_ms == 0 {
            return Err(LoggerError::Config("recv_timeout_ms must be non-zero".into()));
        }
        if self.can_interface.is_empty() {
            return Err(LoggerError::Config("can_interface must not be empty".into()));
        }
        Ok(())
    }

    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms)
    }
}
