//! Shared numeric constants for unit conversion and the radio band.
//!
//! The external ATC service consumes aviation units (knots, feet, inHg)
//! while the simulator broadcasts metric telemetry, so the conversion
//! factors live here and are used by both the state model and the
//! snapshot builder.

/// Conversion factor: meters per second to knots.
pub const MPS_TO_KNOTS: f64 = 1.94384;

/// Conversion factor: meters to feet.
pub const METERS_TO_FEET: f64 = 3.28084;

/// Lower edge of the airband COM tuning range in MHz.
pub const COM_FREQ_MIN_MHZ: f64 = 118.000;

/// Upper edge of the airband COM tuning range in MHz.
pub const COM_FREQ_MAX_MHZ: f64 = 136.975;

/// Coarse tuning step in MHz (whole megahertz).
pub const COM_STEP_COARSE_MHZ: f64 = 1.0;

/// Fine tuning step in MHz (25 kHz channel spacing displayed as 5 kHz steps).
pub const COM_STEP_FINE_MHZ: f64 = 0.005;

/// Highest settable transponder code (four octal digits).
pub const TRANSPONDER_CODE_MAX: i32 = 7777;

/// Ground speed below which the aircraft is considered stationary, in m/s.
pub const GROUND_SPEED_STATIONARY_MPS: f64 = 0.1;

/// Standard sea level pressure in hundredths of inHg (29.92 inHg).
pub const STANDARD_PRESSURE: i32 = 2992;
