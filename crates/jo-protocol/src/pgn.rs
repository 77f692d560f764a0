//! J1939 Parameter Group Numbers tracked by the odometer logger.

use serde::{Deserialize, Serialize};

// ── PGNs ────────────────────────────────────────────────────────

/// Electronic Engine Controller 1 (EEC1), carries engine speed.
pub const PGN_ENGINE_SPEED: u32 = 61444;

/// High Resolution Vehicle Distance (VDHR).
pub const PGN_VEHICLE_DISTANCE: u32 = 65217;

/// Width of the PGN field inside a 29-bit identifier.
pub const PGN_MASK: u32 = 0x1FFFF;

// ── Scale factors ───────────────────────────────────────────────

/// Engine speed resolution, rpm per bit.
pub const ENGINE_SPEED_SCALE: f64 = 0.125;

/// Vehicle distance resolution, km per bit (5 m/bit).
pub const VEHICLE_DISTANCE_SCALE: f64 = 0.005;

/// Minimum payload length carrying engine speed (bytes 3-4).
pub const ENGINE_SPEED_MIN_LEN: usize = 5;

/// Minimum payload length carrying vehicle distance (bytes 0-3).
pub const VEHICLE_DISTANCE_MIN_LEN: usize = 4;

/// A classified Parameter Group Number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pgn {
    EngineSpeed,
    VehicleDistance,
    /// Any PGN outside the tracked set, carrying the raw number.
    Unrecognized(u32),
}

impl Pgn {
    /// Map a raw 17-bit PGN onto the tracked set.
    pub fn from_raw(raw: u32) -> Self {
        match raw {
            PGN_ENGINE_SPEED => Pgn::EngineSpeed,
            PGN_VEHICLE_DISTANCE => Pgn::VehicleDistance,
            other => Pgn::Unrecognized(other),
        }
    }

    /// Numeric PGN value as written to records.
    pub fn raw(self) -> u32 {
        match self {
            Pgn::EngineSpeed => PGN_ENGINE_SPEED,
            Pgn::VehicleDistance => PGN_VEHICLE_DISTANCE,
            Pgn::Unrecognized(raw) => raw,
        }
    }

    pub fn is_recognized(self) -> bool {
        !matches!(self, Pgn::Unrecognized(_))
    }
}

impl std::fmt::Display for Pgn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:05X}", self.raw())
    }
}
