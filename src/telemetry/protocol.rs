//! ForeFlight telemetry sentence parsing.
//!
//! Aerofly FS 4 broadcasts two comma-separated text sentences over UDP:
//! - **XGPS/XGPS2** - `XGPS<sim name>,lon,lat,alt_m,track,gs_m/s`
//! - **XATT/XATT2** - `XATT<sim name>,true_heading,pitch,roll`
//!
//! Values stay in the units the simulator sends (meters, m/s, true
//! degrees). Unit conversion happens when the snapshot is built, so the
//! parser never has to guess what a consumer wants.

use log::trace;

/// GPS fix from one XGPS sentence, in native units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionFrame {
    pub latitude: f64,
    pub longitude: f64,
    /// Altitude above mean sea level in meters
    pub altitude_m: f64,
    /// Ground track in degrees true, normalized to [0, 360)
    pub track_deg: f64,
    /// Ground speed in m/s
    pub ground_speed_mps: f64,
}

/// Attitude from one XATT sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttitudeFrame {
    /// True heading in degrees, normalized to [0, 360)
    pub true_heading_deg: f64,
    pub pitch_deg: f64,
    pub roll_deg: f64,
}

/// One parsed telemetry sentence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Sentence {
    Position(PositionFrame),
    Attitude(AttitudeFrame),
}

/// Parse a telemetry datagram. Returns `None` for unknown or malformed
/// sentences; the listener just moves on to the next packet.
pub fn parse_sentence(data: &[u8]) -> Option<Sentence> {
    // The 2-suffixed variants must be checked first or they would match
    // the short prefixes below.
    if data.len() >= 5 {
        if &data[0..5] == b"XGPS2" {
            return parse_position(data);
        }
        if &data[0..5] == b"XATT2" {
            return parse_attitude(data);
        }
    }
    if data.len() >= 4 {
        if &data[0..4] == b"XGPS" {
            return parse_position(data);
        }
        if &data[0..4] == b"XATT" {
            return parse_attitude(data);
        }
    }

    None
}

fn parse_position(data: &[u8]) -> Option<Sentence> {
    let text = std::str::from_utf8(data).ok()?;

    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() < 6 {
        trace!("XGPS sentence too short: {} fields", parts.len());
        return None;
    }

    let longitude: f64 = parts[1].trim().parse().ok()?;
    let latitude: f64 = parts[2].trim().parse().ok()?;
    let altitude_m: f64 = parts[3].trim().parse().ok()?;
    let track_deg: f64 = parts[4].trim().parse().ok()?;
    let ground_speed_mps: f64 = parts[5].trim().parse().ok()?;

    Some(Sentence::Position(PositionFrame {
        latitude,
        longitude,
        altitude_m,
        track_deg: normalize_heading(track_deg),
        ground_speed_mps,
    }))
}

fn parse_attitude(data: &[u8]) -> Option<Sentence> {
    let text = std::str::from_utf8(data).ok()?;

    let parts: Vec<&str> = text.split(',').collect();
    if parts.len() < 4 {
        trace!("XATT sentence too short: {} fields", parts.len());
        return None;
    }

    let true_heading_deg: f64 = parts[1].trim().parse().ok()?;
    let pitch_deg: f64 = parts[2].trim().parse().ok()?;
    let roll_deg: f64 = parts[3].trim().parse().ok()?;

    Some(Sentence::Attitude(AttitudeFrame {
        true_heading_deg: normalize_heading(true_heading_deg),
        pitch_deg,
        roll_deg,
    }))
}

/// Normalize a heading to [0, 360) degrees.
fn normalize_heading(heading: f64) -> f64 {
    heading.rem_euclid(360.0)
}
