//! Scripted flight generation for exercising the bridge without a
//! simulator attached.
//!
//! The simulated aircraft flies a coordinated orbit around a fixed
//! point, with optional turbulence jitter on top. Frames come out in the
//! same native units the real simulator broadcasts, and the sentence
//! formatters produce exactly what the wire parser accepts.

use std::f64::consts::TAU;

use rand::RngExt;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::telemetry::{AttitudeFrame, PositionFrame};

/// Meters per degree of latitude, good enough for a local orbit.
const METERS_PER_DEG_LAT: f64 = 111_320.0;

const GRAVITY_MPS2: f64 = 9.81;

/// Parameters of the scripted flight.
#[derive(Debug, Clone)]
pub struct FlightProfile {
    pub center_latitude: f64,
    pub center_longitude: f64,
    /// Orbit radius in meters
    pub radius_m: f64,
    /// Starting altitude in meters MSL
    pub altitude_m: f64,
    /// Ground speed along the orbit in m/s
    pub ground_speed_mps: f64,
    /// Steady climb (positive) or descent (negative) in m/s
    pub climb_rate_mps: f64,
    /// Jitter scale, 0.0 for a perfectly smooth ride
    pub turbulence: f64,
    /// Fixed seed for reproducible flights
    pub seed: Option<u64>,
}

impl Default for FlightProfile {
    fn default() -> Self {
        Self {
            // Overhead Zurich LSZH
            center_latitude: 47.45806,
            center_longitude: 8.54806,
            radius_m: 5_000.0,
            altitude_m: 800.0,
            ground_speed_mps: 77.0,
            climb_rate_mps: 0.0,
            turbulence: 0.2,
            seed: None,
        }
    }
}

/// Steps a flight along its orbit, producing telemetry frames.
pub struct FlightSimulator {
    profile: FlightProfile,
    rng: StdRng,
    /// Angular position on the orbit, radians from north
    angle_rad: f64,
    altitude_m: f64,
}

impl FlightSimulator {
    pub fn new(profile: FlightProfile) -> Self {
        let rng = create_rng(profile.seed);
        let altitude_m = profile.altitude_m;
        Self {
            profile,
            rng,
            angle_rad: 0.0,
            altitude_m,
        }
    }

    /// Advance the flight by `dt` seconds and return the new frames.
    pub fn step(&mut self, dt: f64) -> (PositionFrame, AttitudeFrame) {
        let omega = self.profile.ground_speed_mps / self.profile.radius_m;
        self.angle_rad = (self.angle_rad + omega * dt) % TAU;
        self.altitude_m += self.profile.climb_rate_mps * dt;

        let north_m = self.profile.radius_m * self.angle_rad.cos();
        let east_m = self.profile.radius_m * self.angle_rad.sin();
        let latitude = self.profile.center_latitude + north_m / METERS_PER_DEG_LAT;
        let longitude = self.profile.center_longitude
            + east_m / (METERS_PER_DEG_LAT * self.profile.center_latitude.to_radians().cos());

        // The track is tangent to the orbit.
        let track_deg = (self.angle_rad.to_degrees() + 90.0).rem_euclid(360.0);

        // Bank angle of a coordinated turn at this speed and radius.
        let bank_deg = (self.profile.ground_speed_mps * omega / GRAVITY_MPS2)
            .atan()
            .to_degrees();
        let pitch_deg = (self.profile.climb_rate_mps / self.profile.ground_speed_mps)
            .atan()
            .to_degrees();

        let position = PositionFrame {
            latitude,
            longitude,
            altitude_m: self.altitude_m + self.jitter(3.0),
            track_deg: (track_deg + self.jitter(2.0)).rem_euclid(360.0),
            ground_speed_mps: (self.profile.ground_speed_mps + self.jitter(1.5)).max(0.0),
        };
        let attitude = AttitudeFrame {
            true_heading_deg: (track_deg + self.jitter(1.0)).rem_euclid(360.0),
            pitch_deg: pitch_deg + self.jitter(0.8),
            roll_deg: bank_deg + self.jitter(1.5),
        };

        (position, attitude)
    }

    fn jitter(&mut self, scale: f64) -> f64 {
        if self.profile.turbulence == 0.0 {
            return 0.0;
        }
        (self.rng.random::<f64>() - 0.5) * 2.0 * scale * self.profile.turbulence
    }
}

fn create_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(s) => StdRng::seed_from_u64(s),
        None => rand::make_rng(),
    }
}

/// Format a position frame as the XGPS sentence the parser accepts.
pub fn xgps_sentence(sim_name: &str, frame: &PositionFrame) -> String {
    format!(
        "XGPS{},{:.6},{:.6},{:.2},{:.2},{:.2}",
        sim_name,
        frame.longitude,
        frame.latitude,
        frame.altitude_m,
        frame.track_deg,
        frame.ground_speed_mps
    )
}

/// Format an attitude frame as the XATT sentence the parser accepts.
pub fn xatt_sentence(sim_name: &str, frame: &AttitudeFrame) -> String {
    format!(
        "XATT{},{:.2},{:.2},{:.2}",
        sim_name, frame.true_heading_deg, frame.pitch_deg, frame.roll_deg
    )
}
