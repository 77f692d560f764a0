//! J1939 helpers: PGN classification, per-PGN payload decoders, and bench
//! frame builders.

use chrono::{DateTime, Utc};
use jo_protocol::*;

use crate::error::{CanError, CanResult};
use crate::types::{CanFrame, ENGINE_SPEED_ID, VEHICLE_DISTANCE_ID};

/// J1939 "not available" filler byte.
const NOT_AVAILABLE: u8 = 0xFF;

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Extract the PGN from a 29-bit arbitration ID.
pub fn classify(arbitration_id: u32) -> Pgn {
    Pgn::from_raw((arbitration_id >> 8) & PGN_MASK)
}

// ---------------------------------------------------------------------------
// Parameter decoders
// ---------------------------------------------------------------------------

/// Stateless decoder turning one PGN's payload into a physical value.
pub trait ParameterDecoder: Send + Sync {
    /// PGN this decoder understands.
    fn pgn(&self) -> Pgn;

    /// Parameter produced by this decoder.
    fn parameter(&self) -> Parameter;

    /// Minimum payload length in bytes.
    fn min_len(&self) -> usize;

    /// Scaled value. Callers guarantee `payload.len() >= self.min_len()`.
    fn scale(&self, payload: &[u8]) -> f64;

    /// Check the payload length, then scale.
    fn decode(&self, payload: &[u8]) -> CanResult<f64> {
        if payload.len() < self.min_len() {
            return Err(CanError::ShortPayload {
                pgn: self.pgn(),
                need: self.min_len(),
                got: payload.len(),
            });
        }
        Ok(self.scale(payload))
    }
}

/// EEC1 engine speed: 16-bit big-endian at bytes 3-4, 0.125 rpm/bit.
pub struct EngineSpeedDecoder;

impl EngineSpeedDecoder {
    pub fn raw(payload: &[u8]) -> u16 {
        u16::from_be_bytes([payload[3], payload[4]])
    }
}

impl ParameterDecoder for EngineSpeedDecoder {
    fn pgn(&self) -> Pgn {
        Pgn::EngineSpeed
    }

    fn parameter(&self) -> Parameter {
        Parameter::Rpm
    }

    fn min_len(&self) -> usize {
        ENGINE_SPEED_MIN_LEN
    }

    fn scale(&self, payload: &[u8]) -> f64 {
        f64::from(Self::raw(payload)) * ENGINE_SPEED_SCALE
    }
}

/// VDHR total distance: 32-bit little-endian at bytes 0-3, 5 m/bit.
pub struct VehicleDistanceDecoder;

impl VehicleDistanceDecoder {
    pub fn raw(payload: &[u8]) -> u32 {
        u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]])
    }
}

impl ParameterDecoder for VehicleDistanceDecoder {
    fn pgn(&self) -> Pgn {
        Pgn::VehicleDistance
    }

    fn parameter(&self) -> Parameter {
        Parameter::Odometer
    }

    fn min_len(&self) -> usize {
        VEHICLE_DISTANCE_MIN_LEN
    }

    fn scale(&self, payload: &[u8]) -> f64 {
        f64::from(Self::raw(payload)) * VEHICLE_DISTANCE_SCALE
    }
}

/// Look up the decoder for a PGN. Unrecognized PGNs have none.
pub fn decoder_for(pgn: Pgn) -> Option<&'static dyn ParameterDecoder> {
    match pgn {
        Pgn::EngineSpeed => Some(&EngineSpeedDecoder as &dyn ParameterDecoder),
        Pgn::VehicleDistance => Some(&VehicleDistanceDecoder as &dyn ParameterDecoder),
        Pgn::Unrecognized(_) => None,
    }
}

/// Classify and decode a frame into a single sample.
pub fn decode_frame(frame: &CanFrame) -> CanResult<DecodedSample> {
    let pgn = classify(frame.id);
    let decoder = decoder_for(pgn).ok_or(CanError::UnrecognizedPgn { pgn })?;
    let value = decoder.decode(&frame.data)?;

    tracing::trace!(
        id = format_args!("0x{:08X}", frame.id),
        %pgn,
        data = %frame.hex_data(),
        value,
        "decoded frame"
    );

    Ok(DecodedSample {
        pgn,
        parameter: decoder.parameter(),
        value,
        timestamp: frame.timestamp,
    })
}

// ---------------------------------------------------------------------------
// Bench frame builders
// ---------------------------------------------------------------------------

/// Build an EEC1 frame carrying `rpm`, saturating to the 16-bit raw range.
pub fn build_engine_speed_frame(rpm: f64, timestamp: DateTime<Utc>) -> CanResult<CanFrame> {
    let raw = to_raw(rpm, ENGINE_SPEED_SCALE, f64::from(u16::MAX))? as u16;
    let [hi, lo] = raw.to_be_bytes();
    let data = vec![
        NOT_AVAILABLE,
        NOT_AVAILABLE,
        NOT_AVAILABLE,
        hi,
        lo,
        NOT_AVAILABLE,
        NOT_AVAILABLE,
        NOT_AVAILABLE,
    ];
    Ok(CanFrame::with_timestamp(ENGINE_SPEED_ID, data, timestamp))
}

/// Build a VDHR frame carrying `odometer_km`, saturating to the 32-bit raw range.
pub fn build_vehicle_distance_frame(
    odometer_km: f64,
    timestamp: DateTime<Utc>,
) -> CanResult<CanFrame> {
    let raw = to_raw(odometer_km, VEHICLE_DISTANCE_SCALE, f64::from(u32::MAX))? as u32;
    let mut data = raw.to_le_bytes().to_vec();
    data.extend_from_slice(&[NOT_AVAILABLE; 4]);
    Ok(CanFrame::with_timestamp(VEHICLE_DISTANCE_ID, data, timestamp))
}

fn to_raw(value: f64, scale: f64, max: f64) -> CanResult<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(CanError::Encode(format!(
            "value {value} is not a finite non-negative number"
        )));
    }
    Ok((value / scale).round().min(max))
}
