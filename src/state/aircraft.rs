use std::time::Instant;

use chrono::{Datelike, Local, Timelike, Utc};

use crate::constants::{GROUND_SPEED_STATIONARY_MPS, METERS_TO_FEET};
use crate::telemetry::{AttitudeFrame, PositionFrame};

/// Fallback callsign reported until the user sets a real one.
pub const FALLBACK_CALLSIGN: &str = "aabbcc";

/// Engine type codes defined by the ATC service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineType {
    Piston,
    Jet,
    None,
    Helo,
    Unsupported,
    Turboprop,
}

impl EngineType {
    /// Parse the numeric engine type. Returns `None` for codes outside 0-5.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(EngineType::Piston),
            1 => Some(EngineType::Jet),
            2 => Some(EngineType::None),
            3 => Some(EngineType::Helo),
            4 => Some(EngineType::Unsupported),
            5 => Some(EngineType::Turboprop),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            EngineType::Piston => 0,
            EngineType::Jet => 1,
            EngineType::None => 2,
            EngineType::Helo => 3,
            EngineType::Unsupported => 4,
            EngineType::Turboprop => 5,
        }
    }
}

/// Live aircraft state in native units.
///
/// Telemetry quantities keep the units the simulator broadcasts (meters,
/// m/s, true degrees); the snapshot builder converts to the service's
/// aviation units at the boundary. Display strings come from the
/// formatting helpers, never from stored text.
#[derive(Debug, Clone, PartialEq)]
pub struct AircraftState {
    pub callsign: String,
    pub aircraft_type: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Ground speed in m/s as broadcast by the simulator
    pub ground_speed_mps: f64,
    /// Altitude above mean sea level in meters
    pub altitude_m: f64,
    /// True heading in degrees
    pub heading_true_deg: f64,
    pub bank_deg: f64,
    pub pitch_deg: f64,
    /// Derived climb rate in feet per minute
    pub vertical_speed_fpm: i32,
    pub on_ground: bool,
    pub engine_type: EngineType,
    /// Total weight in pounds
    pub total_weight_lbs: i32,
    /// Sea level pressure in hundredths of inHg (2992 = 29.92)
    pub sea_level_pressure: i32,
    /// Magnetic variation in whole degrees, east positive
    pub magvar_deg: i32,
    /// Typical descent rate in feet per minute
    pub typical_descent_rate_fpm: i32,
    pub electrical_master_battery: bool,
    pub circuit_com1: bool,
    pub circuit_com2: bool,
    /// Wind direction in degrees true
    pub ambient_wind_direction_deg: i32,
    /// Wind speed in knots
    pub ambient_wind_velocity_kts: i32,
    /// Local wall-clock time as seconds since midnight
    pub local_time_s: f64,
    /// UTC time as seconds since midnight
    pub zulu_time_s: f64,
}

impl Default for AircraftState {
    fn default() -> Self {
        Self {
            callsign: FALLBACK_CALLSIGN.to_string(),
            aircraft_type: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            ground_speed_mps: 0.0,
            altitude_m: 0.0,
            heading_true_deg: 0.0,
            bank_deg: 0.0,
            pitch_deg: 0.0,
            vertical_speed_fpm: 0,
            on_ground: true,
            engine_type: EngineType::Jet,
            total_weight_lbs: 150_000,
            sea_level_pressure: 2992,
            magvar_deg: 0,
            typical_descent_rate_fpm: 1000,
            electrical_master_battery: true,
            circuit_com1: true,
            circuit_com2: true,
            ambient_wind_direction_deg: 0,
            ambient_wind_velocity_kts: 0,
            local_time_s: 0.0,
            zulu_time_s: 0.0,
        }
    }
}

impl AircraftState {
    /// "lat, lon" to four decimal places
    pub fn position_text(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Altitude in feet, e.g. "1200 ft"
    pub fn altitude_text(&self) -> String {
        format!("{} ft", (self.altitude_m * METERS_TO_FEET) as i64)
    }

    /// True heading with a degree sign, e.g. "245.5°"
    pub fn heading_text(&self) -> String {
        format!("{:.1}°", self.heading_true_deg)
    }
}

/// Owns the aircraft state and derives the quantities telemetry does not
/// carry directly: vertical speed, magnetic variation, clock fields.
pub struct AircraftStateManager {
    state: AircraftState,
    last_altitude_m: f64,
    last_sample: Option<Instant>,
}

impl Default for AircraftStateManager {
    fn default() -> Self {
        Self::new()
    }
}

impl AircraftStateManager {
    pub fn new() -> Self {
        Self {
            state: AircraftState::default(),
            last_altitude_m: 0.0,
            last_sample: None,
        }
    }

    pub fn state(&self) -> &AircraftState {
        &self.state
    }

    /// Fold one telemetry sample into the state.
    ///
    /// The attitude frame is optional; when present its true heading wins
    /// over the position frame's ground track. Also refreshes the derived
    /// fields (vertical speed, clock, magnetic variation).
    pub fn update_from_telemetry(
        &mut self,
        position: &PositionFrame,
        attitude: Option<&AttitudeFrame>,
    ) {
        self.apply_position(position, attitude, Instant::now());
    }

    fn apply_position(
        &mut self,
        position: &PositionFrame,
        attitude: Option<&AttitudeFrame>,
        now: Instant,
    ) {
        self.state.latitude = position.latitude;
        self.state.longitude = position.longitude;
        self.state.ground_speed_mps = position.ground_speed_mps;
        self.state.altitude_m = position.altitude_m;

        self.state.heading_true_deg = match attitude {
            Some(attitude) => attitude.true_heading_deg,
            None => position.track_deg,
        };

        self.state.vertical_speed_fpm = self.vertical_speed_fpm(position.altitude_m, now);
        self.state.on_ground = position.ground_speed_mps < GROUND_SPEED_STATIONARY_MPS;

        if let Some(attitude) = attitude {
            self.state.bank_deg = attitude.roll_deg;
            self.state.pitch_deg = attitude.pitch_deg;
        }

        self.update_clock();
        self.update_magnetic_variation();
    }

    /// Climb rate from consecutive altitude samples, truncated to ft/min.
    ///
    /// The first sample and zero-elapsed samples report 0; zero-elapsed
    /// samples also leave the stored previous sample untouched so the next
    /// real sample still has a baseline.
    fn vertical_speed_fpm(&mut self, altitude_m: f64, now: Instant) -> i32 {
        let Some(last) = self.last_sample else {
            self.last_altitude_m = altitude_m;
            self.last_sample = Some(now);
            return 0;
        };

        let elapsed = now.duration_since(last).as_secs_f64();
        if elapsed <= 0.0 {
            return 0;
        }

        let climb_ft = (altitude_m - self.last_altitude_m) * METERS_TO_FEET;
        self.last_altitude_m = altitude_m;
        self.last_sample = Some(now);
        (climb_ft / elapsed * 60.0) as i32
    }

    fn update_clock(&mut self) {
        self.state.local_time_s = Local::now().num_seconds_from_midnight() as f64;
        self.state.zulu_time_s = Utc::now().num_seconds_from_midnight() as f64;
    }

    /// Dipole-style approximation of magnetic variation.
    ///
    /// Not a WMM implementation; good enough for the service's compass
    /// display. East declination is positive.
    fn update_magnetic_variation(&mut self) {
        let lat_rad = self.state.latitude.to_radians();
        let lon_rad = self.state.longitude.to_radians();

        let now = Utc::now();
        let year_fraction = now.year() as f64 + now.ordinal() as f64 / 365.0;

        let base = 11.0 * lat_rad.sin() + 0.5 * (2.0 * lat_rad).sin() * lon_rad.cos();
        let secular = 0.1 * (year_fraction - 2020.0);

        self.state.magvar_deg = (base + secular).round() as i32;
    }

    /// Magnetic heading in whole degrees, always within [0, 360).
    pub fn magnetic_heading(&self) -> i32 {
        let magnetic = (self.state.heading_true_deg - self.state.magvar_deg as f64)
            .rem_euclid(360.0);
        // Rounding 359.6 would otherwise report 360.
        (magnetic.round() as i32).rem_euclid(360)
    }

    /// Set the callsign; empty input falls back to the placeholder.
    pub fn set_callsign(&mut self, callsign: &str) {
        self.state.callsign = if callsign.is_empty() {
            FALLBACK_CALLSIGN.to_string()
        } else {
            callsign.to_string()
        };
    }

    pub fn set_aircraft_type(&mut self, aircraft_type: &str) {
        self.state.aircraft_type = aircraft_type.to_string();
    }

    pub fn set_engine_type(&mut self, engine_type: EngineType) {
        self.state.engine_type = engine_type;
    }

    /// Set total weight in pounds; non-positive values are ignored.
    pub fn set_total_weight(&mut self, weight_lbs: i32) {
        if weight_lbs > 0 {
            self.state.total_weight_lbs = weight_lbs;
        }
    }

    /// Set sea level pressure in hundredths of inHg.
    ///
    /// Values outside 2800-3100 (28.00-31.00 inHg) are ignored, not
    /// clamped.
    pub fn set_sea_level_pressure(&mut self, pressure: i32) {
        if (2800..=3100).contains(&pressure) {
            self.state.sea_level_pressure = pressure;
        }
    }

    /// Set typical descent rate in ft/min; non-positive values are ignored.
    pub fn set_typical_descent_rate(&mut self, rate_fpm: i32) {
        if rate_fpm > 0 {
            self.state.typical_descent_rate_fpm = rate_fpm;
        }
    }

    pub fn set_electrical_state(&mut self, master: bool, com1: bool, com2: bool) {
        self.state.electrical_master_battery = master;
        self.state.circuit_com1 = com1;
        self.state.circuit_com2 = com2;
    }

    /// Set wind data; each field is validated independently, so a bad
    /// direction does not block a good velocity.
    pub fn set_wind_data(&mut self, direction_deg: i32, velocity_kts: i32) {
        if (0..=360).contains(&direction_deg) {
            self.state.ambient_wind_direction_deg = direction_deg;
        }
        if velocity_kts >= 0 {
            self.state.ambient_wind_velocity_kts = velocity_kts;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn position(latitude: f64, longitude: f64, altitude_m: f64, track: f64, gs: f64) -> PositionFrame {
        PositionFrame {
            latitude,
            longitude,
            altitude_m,
            track_deg: track,
            ground_speed_mps: gs,
        }
    }

    #[test]
    fn test_heading_prefers_attitude_over_track() {
        let mut manager = AircraftStateManager::new();
        let attitude = AttitudeFrame {
            true_heading_deg: 270.0,
            pitch_deg: 2.5,
            roll_deg: -1.0,
        };

        manager.update_from_telemetry(&position(47.0, 8.0, 500.0, 90.0, 60.0), Some(&attitude));
        assert_eq!(manager.state().heading_true_deg, 270.0);
        assert_eq!(manager.state().pitch_deg, 2.5);
        assert_eq!(manager.state().bank_deg, -1.0);

        manager.update_from_telemetry(&position(47.0, 8.0, 500.0, 90.0, 60.0), None);
        assert_eq!(manager.state().heading_true_deg, 90.0);
    }

    #[test]
    fn test_on_ground_follows_ground_speed() {
        let mut manager = AircraftStateManager::new();
        manager.update_from_telemetry(&position(47.0, 8.0, 400.0, 0.0, 0.05), None);
        assert!(manager.state().on_ground);

        manager.update_from_telemetry(&position(47.0, 8.0, 400.0, 0.0, 0.1), None);
        assert!(!manager.state().on_ground, "0.1 m/s should count as moving");
    }

    #[test]
    fn test_vertical_speed_from_altitude_samples() {
        let mut manager = AircraftStateManager::new();
        let t0 = Instant::now();

        manager.apply_position(&position(47.0, 8.0, 100.0, 0.0, 50.0), None, t0);
        assert_eq!(
            manager.state().vertical_speed_fpm,
            0,
            "first sample has no baseline"
        );

        // 30 m in 2 s = 98.4252 ft over 2 s = 2952.756 ft/min, truncated
        manager.apply_position(
            &position(47.0, 8.0, 130.0, 0.0, 50.0),
            None,
            t0 + Duration::from_secs(2),
        );
        assert_eq!(manager.state().vertical_speed_fpm, 2952);

        // Descent back down
        manager.apply_position(
            &position(47.0, 8.0, 100.0, 0.0, 50.0),
            None,
            t0 + Duration::from_secs(4),
        );
        assert_eq!(manager.state().vertical_speed_fpm, -2952);
    }

    #[test]
    fn test_vertical_speed_zero_elapsed_keeps_baseline() {
        let mut manager = AircraftStateManager::new();
        let t0 = Instant::now();

        manager.apply_position(&position(47.0, 8.0, 100.0, 0.0, 50.0), None, t0);
        manager.apply_position(&position(47.0, 8.0, 200.0, 0.0, 50.0), None, t0);
        assert_eq!(
            manager.state().vertical_speed_fpm,
            0,
            "zero elapsed time cannot produce a rate"
        );

        // The 100 m baseline must survive the zero-elapsed sample.
        manager.apply_position(
            &position(47.0, 8.0, 130.0, 0.0, 50.0),
            None,
            t0 + Duration::from_secs(2),
        );
        assert_eq!(manager.state().vertical_speed_fpm, 2952);
    }

    #[test]
    fn test_magnetic_variation_sign_follows_hemisphere() {
        let mut manager = AircraftStateManager::new();
        manager.update_from_telemetry(&position(45.0, 0.0, 1000.0, 0.0, 60.0), None);
        assert!(
            manager.state().magvar_deg > 0,
            "northern mid-latitudes should have positive variation, got {}",
            manager.state().magvar_deg
        );

        manager.update_from_telemetry(&position(-45.0, 0.0, 1000.0, 0.0, 60.0), None);
        assert!(
            manager.state().magvar_deg < 0,
            "southern mid-latitudes should have negative variation, got {}",
            manager.state().magvar_deg
        );
    }

    #[test]
    fn test_magnetic_heading_stays_in_range() {
        let mut manager = AircraftStateManager::new();
        manager.state.heading_true_deg = 359.6;
        manager.state.magvar_deg = 0;
        assert_eq!(manager.magnetic_heading(), 0, "359.6 rounds up and wraps");

        manager.state.heading_true_deg = 10.0;
        manager.state.magvar_deg = 15;
        assert_eq!(manager.magnetic_heading(), 355);

        for heading in [0.0, 90.0, 180.0, 270.0, 359.9] {
            for magvar in [-20, -1, 0, 1, 20] {
                manager.state.heading_true_deg = heading;
                manager.state.magvar_deg = magvar;
                let magnetic = manager.magnetic_heading();
                assert!(
                    (0..360).contains(&magnetic),
                    "heading {heading} magvar {magvar} gave {magnetic}"
                );
            }
        }
    }

    #[test]
    fn test_sea_level_pressure_rejects_out_of_range() {
        let mut manager = AircraftStateManager::new();
        manager.set_sea_level_pressure(2700);
        assert_eq!(manager.state().sea_level_pressure, 2992);

        manager.set_sea_level_pressure(3150);
        assert_eq!(manager.state().sea_level_pressure, 2992);

        manager.set_sea_level_pressure(2800);
        assert_eq!(manager.state().sea_level_pressure, 2800);
        manager.set_sea_level_pressure(3100);
        assert_eq!(manager.state().sea_level_pressure, 3100);
    }

    #[test]
    fn test_weight_and_descent_rate_must_be_positive() {
        let mut manager = AircraftStateManager::new();
        manager.set_total_weight(0);
        manager.set_total_weight(-500);
        assert_eq!(manager.state().total_weight_lbs, 150_000);
        manager.set_total_weight(12_500);
        assert_eq!(manager.state().total_weight_lbs, 12_500);

        manager.set_typical_descent_rate(0);
        assert_eq!(manager.state().typical_descent_rate_fpm, 1000);
        manager.set_typical_descent_rate(700);
        assert_eq!(manager.state().typical_descent_rate_fpm, 700);
    }

    #[test]
    fn test_wind_fields_validated_independently() {
        let mut manager = AircraftStateManager::new();
        manager.set_wind_data(400, 15);
        assert_eq!(
            manager.state().ambient_wind_direction_deg,
            0,
            "bad direction should be dropped"
        );
        assert_eq!(
            manager.state().ambient_wind_velocity_kts,
            15,
            "good velocity should still land"
        );

        manager.set_wind_data(240, -3);
        assert_eq!(manager.state().ambient_wind_direction_deg, 240);
        assert_eq!(manager.state().ambient_wind_velocity_kts, 15);
    }

    #[test]
    fn test_empty_callsign_falls_back() {
        let mut manager = AircraftStateManager::new();
        manager.set_callsign("N123AB");
        assert_eq!(manager.state().callsign, "N123AB");
        manager.set_callsign("");
        assert_eq!(manager.state().callsign, FALLBACK_CALLSIGN);
    }

    #[test]
    fn test_formatting_helpers() {
        let mut state = AircraftState::default();
        state.latitude = 47.45806;
        state.longitude = 8.54806;
        state.altitude_m = 365.76;
        state.heading_true_deg = 245.52;

        assert_eq!(state.position_text(), "47.4581, 8.5481");
        assert_eq!(state.altitude_text(), "1200 ft");
        assert_eq!(state.heading_text(), "245.5°");
    }

    #[test]
    fn test_clock_fields_update() {
        let mut manager = AircraftStateManager::new();
        manager.update_from_telemetry(&position(47.0, 8.0, 500.0, 0.0, 10.0), None);
        assert!(manager.state().local_time_s < 86_400.0);
        assert!(manager.state().zulu_time_s < 86_400.0);
    }
}
