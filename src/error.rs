use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Telemetry socket error: {0}")]
    TelemetrySocket(String),

    #[error("Snapshot write failed: {0}")]
    SnapshotWrite(String),

    #[error("Command log error: {0}")]
    CommandLog(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;
