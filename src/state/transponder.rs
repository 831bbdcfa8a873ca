use serde::Serialize;

use crate::constants::TRANSPONDER_CODE_MAX;

/// Transponder operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransponderMode {
    Off,
    Standby,
    Test,
    On,
    Alt,
    Ground,
}

impl TransponderMode {
    /// Parse the numeric mode the service and panels use.
    ///
    /// Returns `None` for codes outside 0-5.
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(TransponderMode::Off),
            1 => Some(TransponderMode::Standby),
            2 => Some(TransponderMode::Test),
            3 => Some(TransponderMode::On),
            4 => Some(TransponderMode::Alt),
            5 => Some(TransponderMode::Ground),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            TransponderMode::Off => 0,
            TransponderMode::Standby => 1,
            TransponderMode::Test => 2,
            TransponderMode::On => 3,
            TransponderMode::Alt => 4,
            TransponderMode::Ground => 5,
        }
    }
}

/// Squawk code, mode and IDENT state.
///
/// The IDENT dwell timer is a loop concern; this type only flips the flag
/// and guarantees that mode changes clear it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransponderManager {
    code: i32,
    mode: TransponderMode,
    ident: bool,
}

/// Transponder portion of the snapshot variable table.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct TransponderExport {
    #[serde(rename = "TRANSPONDER CODE:1")]
    pub code: i32,
    #[serde(rename = "TRANSPONDER STATE:1")]
    pub state: i32,
    #[serde(rename = "TRANSPONDER IDENT")]
    pub ident: u8,
}

impl Default for TransponderManager {
    fn default() -> Self {
        Self {
            // VFR squawk, mode On
            code: 1200,
            mode: TransponderMode::On,
            ident: false,
        }
    }
}

impl TransponderManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Step the code by `delta`; out-of-range results leave it unchanged.
    ///
    /// Returns the resulting code either way.
    pub fn adjust_code(&mut self, delta: i32) -> i32 {
        let new_code = self.code + delta;
        if (0..=TRANSPONDER_CODE_MAX).contains(&new_code) {
            self.code = new_code;
        }
        self.code
    }

    /// Directly set the code, as commanded by the service.
    pub fn set_code(&mut self, code: i32) {
        self.code = code;
    }

    /// Rolling digit entry: shift the code left one digit and append.
    ///
    /// This treats the code as a decimal buffer, so entering digits can
    /// produce 8s and 9s that the octal-flavored `adjust_code` bounds never
    /// would. Known inconsistency, kept because panels behave this way.
    pub fn enter_digit(&mut self, digit: i32) -> i32 {
        self.code = (self.code * 10 + digit) % 10000;
        self.code
    }

    /// Change mode. Always drops IDENT.
    pub fn set_mode(&mut self, mode: TransponderMode) {
        self.mode = mode;
        self.ident = false;
    }

    /// Flip IDENT and return the new value.
    pub fn toggle_ident(&mut self) -> bool {
        self.ident = !self.ident;
        self.ident
    }

    /// Drop IDENT, used when the dwell timer expires.
    pub fn clear_ident(&mut self) {
        self.ident = false;
    }

    pub fn code(&self) -> i32 {
        self.code
    }

    pub fn mode(&self) -> TransponderMode {
        self.mode
    }

    pub fn ident(&self) -> bool {
        self.ident
    }

    /// Flattened state for the snapshot variable table
    pub fn export(&self) -> TransponderExport {
        TransponderExport {
            code: self.code,
            state: self.mode.code(),
            ident: self.ident as u8,
        }
    }
}
