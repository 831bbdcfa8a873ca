pub mod protocol;
pub mod udp;

pub use protocol::{AttitudeFrame, PositionFrame, Sentence, parse_sentence};
pub use udp::UdpTelemetrySource;

/// The freshest telemetry available for one polling cycle.
///
/// Position and attitude arrive as separate sentences at their own rates,
/// so either half can be missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TelemetryFrame {
    pub position: Option<PositionFrame>,
    pub attitude: Option<AttitudeFrame>,
}

impl TelemetryFrame {
    /// Fold a parsed sentence into the frame, newest value winning.
    pub fn apply(&mut self, sentence: Sentence) {
        match sentence {
            Sentence::Position(frame) => self.position = Some(frame),
            Sentence::Attitude(frame) => self.attitude = Some(frame),
        }
    }
}

/// Where telemetry comes from.
///
/// The production source listens on UDP; tests script frames by hand.
pub trait TelemetrySource: Send {
    /// Current frame, or `None` when the simulator has gone quiet and the
    /// last known position is too old to trust.
    fn latest_frame(&mut self) -> Option<TelemetryFrame>;
}
