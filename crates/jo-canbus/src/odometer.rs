//! Odometer integration from engine speed.
//!
//! Vehicle speed is derived from RPM through a fixed wheel model, then
//! integrated over the time between consecutive engine speed frames.
//! Vehicle distance frames from the ECU are reported as-is and never fold
//! into the integrated total.

use std::f64::consts::PI;

use chrono::{DateTime, Utc};
use jo_protocol::{DecodedSample, Pgn};

use crate::error::CanResult;
use crate::j1939::decode_frame;
use crate::types::CanFrame;

/// Default wheel diameter in metres.
pub const DEFAULT_WHEEL_DIAMETER_M: f64 = 0.8;

/// Odometer value used when no prior reading exists.
pub const DEFAULT_INITIAL_ODOMETER_KM: f64 = 1000.0;

const SECS_PER_HOUR: f64 = 3600.0;

/// Maps engine speed to road speed.
///
/// There is no gearbox model: the wheel turns `wheel_revs_per_engine_rev`
/// times per engine revolution (1.0 by default).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedModel {
    pub wheel_diameter_m: f64,
    pub wheel_revs_per_engine_rev: f64,
}

impl SpeedModel {
    pub fn new(wheel_diameter_m: f64, wheel_revs_per_engine_rev: f64) -> Self {
        Self {
            wheel_diameter_m,
            wheel_revs_per_engine_rev,
        }
    }

    pub fn wheel_circumference_m(&self) -> f64 {
        PI * self.wheel_diameter_m
    }

    /// Road speed in km/h for an engine speed in rpm.
    pub fn speed_kmh(&self, rpm: f64) -> f64 {
        rpm * self.wheel_revs_per_engine_rev * self.wheel_circumference_m() * 60.0 / 1000.0
    }
}

impl Default for SpeedModel {
    fn default() -> Self {
        Self::new(DEFAULT_WHEEL_DIAMETER_M, 1.0)
    }
}

/// Integration state carried from one engine speed frame to the next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntegratorState {
    /// Timestamp of the last decoded engine speed frame.
    pub last_rpm_timestamp: Option<DateTime<Utc>>,
    /// Running total, never decreases.
    pub cumulative_odometer_km: f64,
}

impl IntegratorState {
    pub fn seeded(odometer_km: f64) -> Self {
        Self {
            last_rpm_timestamp: None,
            cumulative_odometer_km: odometer_km,
        }
    }

    /// Fold one engine speed observation into the state and return the
    /// distance added.
    ///
    /// Distance accrues only when `rpm > 0` and a previous timestamp exists.
    /// The timestamp advances on every observation, including idle ones.
    pub fn advance(&mut self, model: &SpeedModel, rpm: f64, now: DateTime<Utc>) -> f64 {
        let increment = match self.last_rpm_timestamp {
            Some(last) if rpm > 0.0 => {
                // A clock stepping backwards yields zero elapsed time.
                let elapsed = (now - last).to_std().unwrap_or_default();
                let hours = elapsed.as_secs_f64() / SECS_PER_HOUR;
                (model.speed_kmh(rpm) * hours).max(0.0)
            }
            _ => 0.0,
        };

        self.cumulative_odometer_km += increment;
        self.last_rpm_timestamp = Some(now);
        increment
    }
}

impl Default for IntegratorState {
    fn default() -> Self {
        Self::seeded(DEFAULT_INITIAL_ODOMETER_KM)
    }
}

/// Owns the integration state for a single ingestion loop.
///
/// Mutation goes through `&mut self`; concurrent producers have to wrap the
/// integrator in a lock.
#[derive(Debug, Clone)]
pub struct OdometerIntegrator {
    model: SpeedModel,
    state: IntegratorState,
}

impl OdometerIntegrator {
    pub fn new(model: SpeedModel, state: IntegratorState) -> Self {
        Self { model, state }
    }

    /// Start from a known odometer value with no prior engine speed frame.
    pub fn seeded(model: SpeedModel, odometer_km: f64) -> Self {
        Self::new(model, IntegratorState::seeded(odometer_km))
    }

    pub fn model(&self) -> &SpeedModel {
        &self.model
    }

    pub fn state(&self) -> IntegratorState {
        self.state
    }

    pub fn odometer_km(&self) -> f64 {
        self.state.cumulative_odometer_km
    }

    /// Decode a frame and, for engine speed, integrate it.
    ///
    /// Engine speed yields an RPM sample plus, when `rpm > 0`, an Odometer
    /// sample with the updated running total. Vehicle distance yields one
    /// Odometer sample with the ECU value. Decode errors leave state untouched.
    pub fn process(&mut self, frame: &CanFrame) -> CanResult<Vec<DecodedSample>> {
        let sample = decode_frame(frame)?;

        match sample.pgn {
            Pgn::EngineSpeed => {
                let rpm = sample.value;
                let timestamp = sample.timestamp;
                let increment = self.state.advance(&self.model, rpm, timestamp);

                tracing::debug!(
                    rpm,
                    speed_kmh = self.model.speed_kmh(rpm),
                    increment_km = increment,
                    odometer_km = self.state.cumulative_odometer_km,
                    "engine speed integrated"
                );

                let mut samples = vec![sample];
                if rpm > 0.0 {
                    samples.push(DecodedSample::odometer(
                        self.state.cumulative_odometer_km,
                        timestamp,
                    ));
                }
                Ok(samples)
            }
            _ => {
                tracing::debug!(odometer_km = sample.value, "ECU vehicle distance");
                Ok(vec![sample])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CanError;
    use crate::j1939::{build_engine_speed_frame, build_vehicle_distance_frame};
    use crate::types::ENGINE_SPEED_ID;
    use chrono::{Duration, TimeZone};
    use jo_protocol::Parameter;

    /// 200 rpm on a 0.8 m wheel.
    const SPEED_AT_200_RPM: f64 = 200.0 * PI * 0.8 * 60.0 / 1000.0;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 8, 0, 0).unwrap()
    }

    fn rpm_frame(rpm: f64, at: DateTime<Utc>) -> CanFrame {
        build_engine_speed_frame(rpm, at).unwrap()
    }

    #[test]
    fn speed_model_reference_values() {
        let model = SpeedModel::default();
        assert!((model.wheel_circumference_m() - 2.513_274).abs() < 1e-6);
        assert!((model.speed_kmh(200.0) - 30.159).abs() < 1e-3);
        assert_eq!(model.speed_kmh(0.0), 0.0);
    }

    #[test]
    fn speed_model_ratio_scales_speed() {
        let geared = SpeedModel::new(0.8, 0.25);
        let direct = SpeedModel::default();
        assert!((geared.speed_kmh(2000.0) - direct.speed_kmh(500.0)).abs() < 1e-9);
    }

    #[test]
    fn first_frame_never_increments() {
        let mut state = IntegratorState::seeded(1000.0);
        let increment = state.advance(&SpeedModel::default(), 3000.0, t0());
        assert_eq!(increment, 0.0);
        assert_eq!(state.cumulative_odometer_km, 1000.0);
        assert_eq!(state.last_rpm_timestamp, Some(t0()));
    }

    #[test]
    fn one_hour_at_200_rpm() {
        let mut integrator = OdometerIntegrator::seeded(SpeedModel::default(), 1000.0);
        integrator.process(&rpm_frame(200.0, t0())).unwrap();
        let samples = integrator
            .process(&rpm_frame(200.0, t0() + Duration::seconds(3600)))
            .unwrap();

        let expected = 1000.0 + SPEED_AT_200_RPM;
        assert!((integrator.odometer_km() - expected).abs() < 1e-9);
        assert!((integrator.odometer_km() - 1030.159).abs() < 1e-3);

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].parameter, Parameter::Rpm);
        assert_eq!(samples[0].value, 200.0);
        assert_eq!(samples[1].parameter, Parameter::Odometer);
        assert_eq!(samples[1].pgn, Pgn::VehicleDistance);
        assert!((samples[1].value - expected).abs() < 1e-9);
    }

    #[test]
    fn first_positive_rpm_frame_reports_unchanged_odometer() {
        let mut integrator = OdometerIntegrator::seeded(SpeedModel::default(), 1000.0);
        let samples = integrator.process(&rpm_frame(800.0, t0())).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[1].value, 1000.0);
    }

    #[test]
    fn zero_rpm_emits_only_rpm_and_advances_timestamp() {
        let mut integrator = OdometerIntegrator::seeded(SpeedModel::default(), 1000.0);
        integrator.process(&rpm_frame(200.0, t0())).unwrap();

        let idle_at = t0() + Duration::seconds(1800);
        let samples = integrator.process(&rpm_frame(0.0, idle_at)).unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].value, 0.0);
        assert_eq!(integrator.odometer_km(), 1000.0);
        assert_eq!(integrator.state().last_rpm_timestamp, Some(idle_at));

        // Only the 60 s since the idle frame count.
        integrator
            .process(&rpm_frame(200.0, idle_at + Duration::seconds(60)))
            .unwrap();
        let expected = 1000.0 + SPEED_AT_200_RPM / 60.0;
        assert!((integrator.odometer_km() - expected).abs() < 1e-9);
    }

    #[test]
    fn backwards_clock_adds_nothing() {
        let mut integrator = OdometerIntegrator::seeded(SpeedModel::default(), 1000.0);
        integrator.process(&rpm_frame(200.0, t0())).unwrap();
        integrator
            .process(&rpm_frame(200.0, t0() - Duration::seconds(10)))
            .unwrap();
        assert_eq!(integrator.odometer_km(), 1000.0);
    }

    #[test]
    fn vehicle_distance_does_not_touch_state() {
        let mut integrator = OdometerIntegrator::seeded(SpeedModel::default(), 1000.0);
        let before = integrator.state();
        let samples = integrator
            .process(&build_vehicle_distance_frame(0.5, t0()).unwrap())
            .unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].parameter, Parameter::Odometer);
        assert_eq!(samples[0].value, 0.5);
        assert_eq!(integrator.state(), before);
    }

    #[test]
    fn short_payload_does_not_touch_state() {
        let mut integrator = OdometerIntegrator::seeded(SpeedModel::default(), 1000.0);
        integrator.process(&rpm_frame(200.0, t0())).unwrap();
        let before = integrator.state();

        let short = CanFrame::with_timestamp(
            ENGINE_SPEED_ID,
            vec![0x00, 0x00, 0x00, 0x06],
            t0() + Duration::seconds(60),
        );
        assert!(matches!(
            integrator.process(&short),
            Err(CanError::ShortPayload { .. })
        ));
        assert_eq!(integrator.state(), before);
    }

    #[test]
    fn unrecognized_pgn_does_not_touch_state() {
        let mut integrator = OdometerIntegrator::seeded(SpeedModel::default(), 1000.0);
        let before = integrator.state();
        let frame = CanFrame::with_timestamp(0x18FE_EE00, vec![0; 8], t0());
        assert!(matches!(
            integrator.process(&frame),
            Err(CanError::UnrecognizedPgn { .. })
        ));
        assert_eq!(integrator.state(), before);
    }

    #[test]
    fn odometer_is_monotonic() {
        let mut integrator = OdometerIntegrator::seeded(SpeedModel::default(), 1000.0);
        let rpms = [0.0, 650.0, 1200.5, 0.0, 0.0, 2500.0, 8191.875, 125.0, 0.0, 900.0];
        let mut last = integrator.odometer_km();
        let mut at = t0();
        for (i, rpm) in rpms.iter().enumerate() {
            at += Duration::milliseconds(100 * i as i64);
            integrator.process(&rpm_frame(*rpm, at)).unwrap();
            assert!(integrator.odometer_km() >= last);
            last = integrator.odometer_km();
        }
        assert!(last > 1000.0);
    }
}
