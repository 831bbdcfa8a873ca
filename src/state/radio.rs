use serde::Serialize;

use crate::constants::{
    COM_FREQ_MAX_MHZ, COM_FREQ_MIN_MHZ, COM_STEP_COARSE_MHZ, COM_STEP_FINE_MHZ,
};

/// COM radio selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComRadio {
    Com1,
    Com2,
}

impl ComRadio {
    /// 1-based index used in the snapshot key suffixes and log messages
    pub fn index(&self) -> u8 {
        match self {
            ComRadio::Com1 => 1,
            ComRadio::Com2 => 2,
        }
    }
}

/// Tuning knob granularity
///
/// Coarse steps move whole megahertz, fine steps move 5 kHz.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningStep {
    Coarse,
    Fine,
}

impl TuningStep {
    fn size_mhz(&self) -> f64 {
        match self {
            TuningStep::Coarse => COM_STEP_COARSE_MHZ,
            TuningStep::Fine => COM_STEP_FINE_MHZ,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ComChannel {
    active_mhz: f64,
    standby_mhz: f64,
    receive: bool,
    transmit: bool,
}

/// Two-radio COM stack with active/standby frequency pairs.
///
/// Tuning always operates on the standby side and clamps to the airband;
/// the active frequency only changes through a swap or a direct set from
/// the command path.
#[derive(Debug, Clone, PartialEq)]
pub struct RadioManager {
    com1: ComChannel,
    com2: ComChannel,
}

/// Radio portion of the snapshot variable table.
///
/// Field names are the exact keys the ATC service expects.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct RadioExport {
    #[serde(rename = "COM ACTIVE FREQUENCY:1")]
    pub active_frequency_1: f64,
    #[serde(rename = "COM ACTIVE FREQUENCY:2")]
    pub active_frequency_2: f64,
    #[serde(rename = "COM RECEIVE:1")]
    pub receive_1: u8,
    #[serde(rename = "COM RECEIVE:2")]
    pub receive_2: u8,
    #[serde(rename = "COM TRANSMIT:1")]
    pub transmit_1: u8,
    #[serde(rename = "COM TRANSMIT:2")]
    pub transmit_2: u8,
}

impl Default for RadioManager {
    fn default() -> Self {
        Self {
            com1: ComChannel {
                active_mhz: 118.700,
                standby_mhz: 121.500,
                receive: true,
                transmit: true,
            },
            com2: ComChannel {
                active_mhz: 118.000,
                standby_mhz: 121.000,
                receive: true,
                transmit: false,
            },
        }
    }
}

impl RadioManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn channel(&self, radio: ComRadio) -> &ComChannel {
        match radio {
            ComRadio::Com1 => &self.com1,
            ComRadio::Com2 => &self.com2,
        }
    }

    fn channel_mut(&mut self, radio: ComRadio) -> &mut ComChannel {
        match radio {
            ComRadio::Com1 => &mut self.com1,
            ComRadio::Com2 => &mut self.com2,
        }
    }

    /// Step the standby frequency up or down, clamped to the airband.
    ///
    /// `direction` is +1 or -1 (larger magnitudes step multiple increments).
    /// Returns the new standby frequency.
    pub fn adjust_frequency(&mut self, radio: ComRadio, step: TuningStep, direction: i32) -> f64 {
        let channel = self.channel_mut(radio);
        let new_freq = (channel.standby_mhz + direction as f64 * step.size_mhz())
            .clamp(COM_FREQ_MIN_MHZ, COM_FREQ_MAX_MHZ);
        channel.standby_mhz = new_freq;
        new_freq
    }

    /// Exchange active and standby frequencies.
    ///
    /// Returns the new (active, standby) pair.
    pub fn swap_frequencies(&mut self, radio: ComRadio) -> (f64, f64) {
        let channel = self.channel_mut(radio);
        std::mem::swap(&mut channel.active_mhz, &mut channel.standby_mhz);
        (channel.active_mhz, channel.standby_mhz)
    }

    /// Directly set the active frequency, as commanded by the service.
    pub fn set_active_frequency(&mut self, radio: ComRadio, mhz: f64) {
        self.channel_mut(radio).active_mhz = mhz;
    }

    /// Directly set the standby frequency, as commanded by the service.
    pub fn set_standby_frequency(&mut self, radio: ComRadio, mhz: f64) {
        self.channel_mut(radio).standby_mhz = mhz;
    }

    pub fn active_frequency(&self, radio: ComRadio) -> f64 {
        self.channel(radio).active_mhz
    }

    pub fn standby_frequency(&self, radio: ComRadio) -> f64 {
        self.channel(radio).standby_mhz
    }

    /// Flattened state for the snapshot variable table
    pub fn export(&self) -> RadioExport {
        RadioExport {
            active_frequency_1: self.com1.active_mhz,
            active_frequency_2: self.com2.active_mhz,
            receive_1: self.com1.receive as u8,
            receive_2: self.com2.receive as u8,
            transmit_1: self.com1.transmit as u8,
            transmit_2: self.com2.transmit as u8,
        }
    }
}
