//! Snapshot assembly: the flat variable document the ATC service reads.
//!
//! The variable names are an external contract and appear here verbatim,
//! including their suffix convention (`:1`/`:2` for radio index, `:0` for
//! the single electrical bus). All unit conversion from the metric
//! telemetry happens here, nowhere else.

use chrono::{Datelike, Utc};
use serde::Serialize;

use crate::config::SimConfig;
use crate::constants::{
    GROUND_SPEED_STATIONARY_MPS, METERS_TO_FEET, MPS_TO_KNOTS, STANDARD_PRESSURE,
};
use crate::state::{AircraftState, RadioExport, TransponderExport};

/// Volume levels the service expects to see; the model has no real audio
/// path, so these are reported as-is.
const AUDIO_PANEL_VOLUME: i32 = 75;
const COM1_VOLUME: i32 = 46;
const COM2_VOLUME: i32 = 81;

const WING_SPAN: i32 = 36;

/// The flat `variables` map. Field order is the file order.
#[derive(Debug, Serialize)]
pub struct SnapshotVariables {
    #[serde(rename = "AIRSPEED INDICATED")]
    pub airspeed_indicated: i32,
    #[serde(rename = "AIRSPEED TRUE")]
    pub airspeed_true: i32,
    #[serde(rename = "ENGINE TYPE")]
    pub engine_type: i32,
    #[serde(rename = "INDICATED ALTITUDE")]
    pub indicated_altitude: i32,
    #[serde(rename = "MAGNETIC COMPASS")]
    pub magnetic_compass: i32,
    #[serde(rename = "MAGVAR")]
    pub magvar: i32,
    #[serde(rename = "PLANE ALT ABOVE GROUND MINUS CG")]
    pub alt_above_ground: i32,
    #[serde(rename = "PLANE ALTITUDE")]
    pub plane_altitude: i32,
    #[serde(rename = "PLANE BANK DEGREES")]
    pub bank: i32,
    #[serde(rename = "PLANE HEADING DEGREES TRUE")]
    pub heading_true: i32,
    #[serde(rename = "PLANE LATITUDE")]
    pub latitude: f64,
    #[serde(rename = "PLANE LONGITUDE")]
    pub longitude: f64,
    #[serde(rename = "PLANE PITCH DEGREES")]
    pub pitch: i32,
    #[serde(rename = "SEA LEVEL PRESSURE")]
    pub sea_level_pressure: i32,
    #[serde(rename = "SIM ON GROUND")]
    pub sim_on_ground: i32,
    #[serde(rename = "TOTAL WEIGHT")]
    pub total_weight: i32,
    #[serde(rename = "VERTICAL SPEED")]
    pub vertical_speed: i32,
    #[serde(rename = "WHEEL RPM:1")]
    pub wheel_rpm: i32,
    #[serde(rename = "TYPICAL DESCENT RATE")]
    pub typical_descent_rate: i32,
    #[serde(rename = "AMBIENT WIND DIRECTION")]
    pub wind_direction: i32,
    #[serde(rename = "AMBIENT WIND VELOCITY")]
    pub wind_velocity: i32,
    #[serde(rename = "LOCAL TIME")]
    pub local_time: f64,
    #[serde(rename = "ZULU TIME")]
    pub zulu_time: f64,
    #[serde(rename = "ELECTRICAL MASTER BATTERY:0")]
    pub master_battery: i32,
    #[serde(rename = "CIRCUIT COM ON:1")]
    pub circuit_com1: i32,
    #[serde(rename = "CIRCUIT COM ON:2")]
    pub circuit_com2: i32,
    #[serde(rename = "TITLE")]
    pub title: String,
    #[serde(rename = "ATC MODEL")]
    pub atc_model: String,
    #[serde(rename = "PLANE TOUCHDOWN LATITUDE")]
    pub touchdown_latitude: i32,
    #[serde(rename = "PLANE TOUCHDOWN LONGITUDE")]
    pub touchdown_longitude: i32,
    #[serde(rename = "PLANE TOUCHDOWN NORMAL VELOCITY")]
    pub touchdown_normal_velocity: i32,
    #[serde(rename = "INTERCOM SYSTEM ACTIVE")]
    pub intercom_active: i32,
    #[serde(rename = "AUDIO PANEL VOLUME")]
    pub audio_panel_volume: i32,
    #[serde(rename = "COM VOLUME:1")]
    pub com1_volume: i32,
    #[serde(rename = "COM VOLUME:2")]
    pub com2_volume: i32,
    #[serde(rename = "WING SPAN")]
    pub wing_span: i32,
    #[serde(rename = "ZULU DAY OF YEAR")]
    pub zulu_day_of_year: i32,
    #[serde(flatten)]
    pub radio: RadioExport,
    #[serde(flatten)]
    pub transponder: TransponderExport,
}

#[derive(Debug, Serialize)]
pub struct SimSection {
    pub variables: SnapshotVariables,
    pub exe: String,
    pub simapi_version: String,
    pub name: String,
    pub version: String,
    pub adapter_version: String,
}

/// The full input-file document: `{"sim": {...}}`.
#[derive(Debug, Serialize)]
pub struct SimApiEnvelope {
    pub sim: SimSection,
}

/// Assemble one snapshot from the current model state.
///
/// Indicated airspeed is reported as ground speed until the simulator
/// exports a real IAS; true airspeed is derived from it with a 2% per
/// 1000 ft correction.
pub fn build_snapshot(
    config: &SimConfig,
    state: &AircraftState,
    radio: RadioExport,
    transponder: TransponderExport,
) -> SimApiEnvelope {
    let ground_speed_kts = (state.ground_speed_mps * MPS_TO_KNOTS) as i32;
    let altitude_ft = (state.altitude_m * METERS_TO_FEET) as i32;

    let indicated_airspeed = ground_speed_kts;
    let airspeed_true =
        (indicated_airspeed as f64 * (1.0 + (altitude_ft as f64 / 1000.0) * 0.02)) as i32;

    // Wheels only spin while rolling on the ground.
    let wheel_rpm = if state.on_ground && state.ground_speed_mps > GROUND_SPEED_STATIONARY_MPS {
        (state.ground_speed_mps * 10.0) as i32
    } else {
        0
    };

    let heading_true = state.heading_true_deg as i32;
    let magnetic_compass = (heading_true - state.magvar_deg).rem_euclid(360);

    // Altimeter setting correction: 1000 ft per inHg of deviation from
    // the 29.92 standard.
    let pressure_diff = STANDARD_PRESSURE as f64 / 100.0 - state.sea_level_pressure as f64 / 100.0;
    let indicated_altitude = altitude_ft + (pressure_diff * 1000.0) as i32;

    SimApiEnvelope {
        sim: SimSection {
            variables: SnapshotVariables {
                airspeed_indicated: indicated_airspeed,
                airspeed_true,
                engine_type: state.engine_type.code(),
                indicated_altitude,
                magnetic_compass,
                magvar: state.magvar_deg,
                alt_above_ground: if state.on_ground { 0 } else { altitude_ft },
                plane_altitude: altitude_ft,
                bank: state.bank_deg as i32,
                heading_true,
                latitude: state.latitude,
                longitude: state.longitude,
                pitch: state.pitch_deg as i32,
                sea_level_pressure: state.sea_level_pressure,
                sim_on_ground: state.on_ground as i32,
                total_weight: state.total_weight_lbs,
                vertical_speed: state.vertical_speed_fpm,
                wheel_rpm,
                typical_descent_rate: state.typical_descent_rate_fpm,
                wind_direction: state.ambient_wind_direction_deg,
                wind_velocity: state.ambient_wind_velocity_kts,
                local_time: state.local_time_s,
                zulu_time: state.zulu_time_s,
                master_battery: state.electrical_master_battery as i32,
                circuit_com1: state.circuit_com1 as i32,
                circuit_com2: state.circuit_com2 as i32,
                title: config.title.clone(),
                atc_model: config.atc_model.clone(),
                touchdown_latitude: 0,
                touchdown_longitude: 0,
                touchdown_normal_velocity: 0,
                intercom_active: 0,
                audio_panel_volume: AUDIO_PANEL_VOLUME,
                com1_volume: COM1_VOLUME,
                com2_volume: COM2_VOLUME,
                wing_span: WING_SPAN,
                zulu_day_of_year: Utc::now().ordinal() as i32,
                radio,
                transponder,
            },
            exe: config.exe.clone(),
            simapi_version: config.simapi_version.clone(),
            name: config.name.clone(),
            version: config.version.clone(),
            adapter_version: config.adapter_version.clone(),
        },
    }
}
