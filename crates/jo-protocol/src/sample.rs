use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pgn::Pgn;

/// Physical quantity carried by a decoded sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Parameter {
    /// Engine speed in revolutions per minute.
    #[serde(rename = "RPM")]
    Rpm,
    /// Odometer reading in kilometres.
    #[serde(rename = "Odometer")]
    Odometer,
}

impl Parameter {
    /// Name stored in the `parameter` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Parameter::Rpm => "RPM",
            Parameter::Odometer => "Odometer",
        }
    }

    pub fn unit(self) -> &'static str {
        match self {
            Parameter::Rpm => "rpm",
            Parameter::Odometer => "km",
        }
    }
}

impl std::fmt::Display for Parameter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown parameter name: {0:?}")]
pub struct UnknownParameter(pub String);

impl std::str::FromStr for Parameter {
    type Err = UnknownParameter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "RPM" => Ok(Parameter::Rpm),
            "Odometer" => Ok(Parameter::Odometer),
            other => Err(UnknownParameter(other.to_string())),
        }
    }
}

/// A physical measurement decoded from one CAN frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodedSample {
    /// PGN the value was attributed to.
    pub pgn: Pgn,
    pub parameter: Parameter,
    /// Scaled value in the parameter's unit.
    pub value: f64,
    /// Timestamp of the frame that produced the sample.
    pub timestamp: DateTime<Utc>,
}

impl DecodedSample {
    pub fn rpm(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            pgn: Pgn::EngineSpeed,
            parameter: Parameter::Rpm,
            value,
            timestamp,
        }
    }

    /// Odometer samples are attributed to the vehicle distance PGN whether they
    /// come from the ECU or from the RPM integrator.
    pub fn odometer(value: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            pgn: Pgn::VehicleDistance,
            parameter: Parameter::Odometer,
            value,
            timestamp,
        }
    }
}

/// One row of the append-only `vehicle_data` record table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleRecord {
    /// RFC 3339 UTC timestamp with fixed microsecond precision.
    pub timestamp: String,
    pub pgn: i64,
    pub parameter: String,
    pub value: f64,
}

impl From<&DecodedSample> for SampleRecord {
    fn from(sample: &DecodedSample) -> Self {
        Self {
            timestamp: record_timestamp(sample.timestamp),
            pgn: i64::from(sample.pgn.raw()),
            parameter: sample.parameter.as_str().to_string(),
            value: sample.value,
        }
    }
}

/// Format an instant for the `timestamp` column.
///
/// Fixed precision keeps lexical order equal to chronological order.
pub fn record_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Micros, true)
}
