pub mod aircraft;
pub mod radio;
pub mod transponder;

pub use aircraft::{AircraftState, AircraftStateManager, EngineType};
pub use radio::{ComRadio, RadioExport, RadioManager, TuningStep};
pub use transponder::{TransponderExport, TransponderManager, TransponderMode};
