pub mod command;
pub mod files;
pub mod snapshot;

pub use command::{Command, VolumeTarget};
pub use files::SimApiFiles;
pub use snapshot::{SimApiEnvelope, SnapshotVariables, build_snapshot};
