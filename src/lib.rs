pub mod bridge;
pub mod config;
pub mod constants;
pub mod error;
pub mod simapi;
pub mod state;
pub mod telemetry;

#[cfg(feature = "simulation")]
pub mod simulation;

pub use bridge::{Bridge, Managers, SyncLoop, lock_state};
pub use config::BridgeConfig;
pub use error::{BridgeError, Result};
