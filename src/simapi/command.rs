//! Inbound command parsing from the service's append-only output log.
//!
//! Each line is a `{"setvar": ..., "value": ...}` record. The recognized
//! setvar names form a closed set; anything else is consumed and ignored
//! so a newer service version cannot wedge the loop.

use std::fmt;

use serde::Deserialize;

use crate::state::ComRadio;

const HZ_PER_MHZ: f64 = 1_000_000.0;

#[derive(Debug, Deserialize)]
struct RawCommand {
    setvar: String,
    value: Option<f64>,
}

/// Which volume knob a volume command addresses. The bridge has no audio
/// path, so these are acknowledged but not modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeTarget {
    Intercom,
    Com1,
    Com2,
}

/// One recognized service command, already unit-converted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    SetActiveFrequency { radio: ComRadio, mhz: f64 },
    SetStandbyFrequency { radio: ComRadio, mhz: f64 },
    SwapFrequencies { radio: ComRadio },
    SetTransponderCode { code: i32 },
    SetVolume { target: VolumeTarget, percent: i32 },
}

impl Command {
    /// Parse one output-log line. Returns `None` for malformed JSON, an
    /// unrecognized setvar, or a missing value; the caller keeps scanning.
    pub fn parse_line(line: &str) -> Option<Command> {
        let raw: RawCommand = serde_json::from_str(line.trim()).ok()?;
        Self::from_raw(&raw)
    }

    fn from_raw(raw: &RawCommand) -> Option<Command> {
        let command = match raw.setvar.as_str() {
            "COM_RADIO_SET_HZ" => Command::SetActiveFrequency {
                radio: ComRadio::Com1,
                mhz: raw.value? / HZ_PER_MHZ,
            },
            "COM2_RADIO_SET_HZ" => Command::SetActiveFrequency {
                radio: ComRadio::Com2,
                mhz: raw.value? / HZ_PER_MHZ,
            },
            "COM_STBY_RADIO_SET_HZ" => Command::SetStandbyFrequency {
                radio: ComRadio::Com1,
                mhz: raw.value? / HZ_PER_MHZ,
            },
            "COM2_STBY_RADIO_SET_HZ" => Command::SetStandbyFrequency {
                radio: ComRadio::Com2,
                mhz: raw.value? / HZ_PER_MHZ,
            },
            "COM_RADIO_SWAP" => Command::SwapFrequencies {
                radio: ComRadio::Com1,
            },
            "COM2_RADIO_SWAP" => Command::SwapFrequencies {
                radio: ComRadio::Com2,
            },
            "XPNDR_SET" => Command::SetTransponderCode {
                code: raw.value? as i32,
            },
            "AUDIO_PANEL_VOLUME_SET" => Command::SetVolume {
                target: VolumeTarget::Intercom,
                percent: raw.value? as i32,
            },
            "COM1_VOLUME_SET" => Command::SetVolume {
                target: VolumeTarget::Com1,
                percent: raw.value? as i32,
            },
            "COM2_VOLUME_SET" => Command::SetVolume {
                target: VolumeTarget::Com2,
                percent: raw.value? as i32,
            },
            _ => return None,
        };
        Some(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::SetActiveFrequency { radio, mhz } => {
                write!(
                    f,
                    "Set COM{} active frequency to {:.3} MHz",
                    radio.index(),
                    mhz
                )
            }
            Command::SetStandbyFrequency { radio, mhz } => {
                write!(
                    f,
                    "Set COM{} standby frequency to {:.3} MHz",
                    radio.index(),
                    mhz
                )
            }
            Command::SwapFrequencies { radio } => {
                write!(
                    f,
                    "Swap COM{} active and standby frequencies",
                    radio.index()
                )
            }
            Command::SetTransponderCode { code } => {
                write!(f, "Set transponder code to {:04}", code)
            }
            Command::SetVolume { target, percent } => {
                let name = match target {
                    VolumeTarget::Intercom => "intercom",
                    VolumeTarget::Com1 => "COM1",
                    VolumeTarget::Com2 => "COM2",
                };
                write!(f, "Set {} volume to {}%", name, percent)
            }
        }
    }
}
