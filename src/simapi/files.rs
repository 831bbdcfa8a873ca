use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::FileConfig;
use crate::error::{BridgeError, Result};

use super::command::Command;
use super::snapshot::SimApiEnvelope;

/// The two files shared with the ATC service: the snapshot it reads and
/// the command log it appends to.
///
/// The snapshot is fully rewritten each cycle; the command log is a
/// single-shot mailbox that is read and then truncated in one pass.
pub struct SimApiFiles {
    input_path: PathBuf,
    output_path: PathBuf,
}

impl SimApiFiles {
    /// Resolve paths and make sure the data directory exists.
    pub fn new(config: &FileConfig) -> Result<Self> {
        fs::create_dir_all(&config.data_dir).map_err(|e| {
            BridgeError::Config(format!(
                "create data directory {}: {}",
                config.data_dir.display(),
                e
            ))
        })?;

        Ok(Self {
            input_path: config.input_path(),
            output_path: config.output_path(),
        })
    }

    pub fn input_path(&self) -> &Path {
        &self.input_path
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Overwrite the snapshot file with a pretty-printed envelope.
    pub fn write_snapshot(&self, envelope: &SimApiEnvelope) -> Result<()> {
        let json = serde_json::to_string_pretty(envelope)
            .map_err(|e| BridgeError::SnapshotWrite(format!("serialize snapshot: {}", e)))?;
        fs::write(&self.input_path, json).map_err(|e| {
            BridgeError::SnapshotWrite(format!("{}: {}", self.input_path.display(), e))
        })
    }

    /// Scan the command log for the first recognized command, then
    /// truncate it.
    ///
    /// The truncate happens whether or not anything was recognized; a
    /// leftover swap line replayed on every cycle would toggle the radio
    /// forever. A missing file means the service has not written yet and
    /// is not an error.
    pub fn drain_command(&self) -> Result<Option<Command>> {
        let contents = match fs::read_to_string(&self.output_path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BridgeError::CommandLog(format!(
                    "{}: {}",
                    self.output_path.display(),
                    e
                )));
            }
        };
        if contents.is_empty() {
            return Ok(None);
        }

        let command = contents.lines().find_map(Command::parse_line);

        fs::write(&self.output_path, "").map_err(|e| {
            BridgeError::CommandLog(format!("{}: {}", self.output_path.display(), e))
        })?;

        Ok(command)
    }

    /// Append one raw line to the command log, the way the service does.
    pub fn append_command_line(&self, line: &str) -> Result<()> {
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.output_path)
            .map_err(|e| {
                BridgeError::CommandLog(format!("{}: {}", self.output_path.display(), e))
            })?;
        writeln!(file, "{}", line).map_err(|e| {
            BridgeError::CommandLog(format!("{}: {}", self.output_path.display(), e))
        })
    }
}
