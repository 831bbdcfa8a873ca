//! Configuration for the atclink bridge.
//!
//! ## Data directory
//!
//! The ATC service watches a fixed directory for the snapshot and command
//! files. By default this is `SayIntentionsAI/` under the current working
//! directory; point `FileConfig::data_dir` somewhere else if the service is
//! configured differently:
//!
//! ```ignore
//! config.files.data_dir = PathBuf::from("/var/lib/atclink");
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Polling interval specification
///
/// Can be specified in milliseconds or seconds. Useful on the command line
/// where the service documentation quotes the cadence as "750ms".
///
/// # Parsing formats
/// - `750` - interval in milliseconds (no suffix)
/// - `750ms` - interval in milliseconds (explicit)
/// - `0.75s` - interval in seconds
///
/// # Example
/// ```
/// use atclink::config::PollInterval;
///
/// let interval: PollInterval = "0.75s".parse().unwrap();
/// assert_eq!(interval.as_duration().as_millis(), 750);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct PollInterval(Duration);

impl PollInterval {
    /// Create from a duration
    pub fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    /// Create from milliseconds
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(ms))
    }

    /// Get the interval as a `Duration`
    pub fn as_duration(&self) -> Duration {
        self.0
    }
}

impl Default for PollInterval {
    fn default() -> Self {
        // The service specifies a 750 ms snapshot cadence.
        Self::from_millis(750)
    }
}

impl fmt::Display for PollInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0.as_millis())
    }
}

impl FromStr for PollInterval {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();

        // Check for seconds suffix first so "s" is not mistaken for part of "ms"
        if let Some(num) = s.strip_suffix("ms") {
            let ms: f64 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid interval: {}", s))?;
            if ms <= 0.0 {
                return Err("interval must be positive".to_string());
            }
            return Ok(Self(Duration::from_secs_f64(ms / 1000.0)));
        }

        if let Some(num) = s.strip_suffix('s') {
            let secs: f64 = num
                .trim()
                .parse()
                .map_err(|_| format!("invalid interval: {}", s))?;
            if secs <= 0.0 {
                return Err("interval must be positive".to_string());
            }
            return Ok(Self(Duration::from_secs_f64(secs)));
        }

        let ms: f64 = s.parse().map_err(|_| format!("invalid interval: {}", s))?;
        if ms <= 0.0 {
            return Err("interval must be positive".to_string());
        }
        Ok(Self(Duration::from_secs_f64(ms / 1000.0)))
    }
}

/// System-wide bridge configuration
///
/// Contains all configuration parameters for the simulator-to-ATC bridge.
/// Use `BridgeConfig::default()` for the values the service documents.
///
/// # Example
/// ```
/// use atclink::config::BridgeConfig;
///
/// let mut config = BridgeConfig::default();
/// // Customize as needed
/// config.telemetry.port = 49010;
/// ```
#[derive(Debug, Clone, Default)]
pub struct BridgeConfig {
    /// Simulator identity reported in the snapshot envelope
    pub sim: SimConfig,
    /// Snapshot/command file locations
    pub files: FileConfig,
    /// UDP telemetry listener configuration
    pub telemetry: TelemetryConfig,
    /// Loop cadence and timer configuration
    pub timing: TimingConfig,
}

/// Simulator identity configuration
///
/// These strings are part of the snapshot contract; the service uses them
/// to identify which simulator and adapter produced the data.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Aircraft title variable
    pub title: String,
    /// ATC model identifier variable
    pub atc_model: String,
    /// Simulator executable name in the envelope
    pub exe: String,
    /// Simulator name in the envelope
    pub name: String,
    /// Simulator version in the envelope
    pub version: String,
    /// Protocol version in the envelope
    pub simapi_version: String,
    /// Adapter version in the envelope
    pub adapter_version: String,
}

/// Snapshot and command file locations
#[derive(Debug, Clone)]
pub struct FileConfig {
    /// Directory holding both exchange files (created if missing)
    pub data_dir: PathBuf,
    /// Snapshot file name, rewritten every cycle
    pub input_name: String,
    /// Command log file name, appended by the service and drained here
    pub output_name: String,
}

impl FileConfig {
    /// Full path of the snapshot (input) file
    pub fn input_path(&self) -> PathBuf {
        self.data_dir.join(&self.input_name)
    }

    /// Full path of the command log (output) file
    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(&self.output_name)
    }

    /// Replace the data directory, keeping the contract file names
    pub fn with_data_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.data_dir = dir.as_ref().to_path_buf();
        self
    }
}

/// UDP telemetry listener configuration
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Address to bind the listener socket to
    pub bind_address: String,
    /// UDP port the simulator broadcasts on (0 picks an ephemeral port)
    pub port: u16,
    /// Sentences older than this are considered stale and not reported
    pub freshness: Duration,
    /// Capacity of the reader-to-poller channel
    pub channel_capacity: usize,
}

/// Loop cadence and timer configuration
#[derive(Debug, Clone)]
pub struct TimingConfig {
    /// Interval between sync cycles
    pub poll_interval: Duration,
    /// Sleep after a failed cycle before trying again
    pub error_backoff: Duration,
    /// How long transponder IDENT stays lit before self-clearing
    pub ident_dwell: Duration,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            title: "Aerofly FS4".to_string(),
            atc_model: "ATCCOM.AC_MODEL A320.0.text".to_string(),
            exe: "aerofly_fs_4.exe".to_string(),
            name: "Aerofly".to_string(),
            version: "1.0".to_string(),
            simapi_version: "1.0".to_string(),
            adapter_version: "1.0".to_string(),
        }
    }
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("SayIntentionsAI"),
            input_name: "simAPI_input.json".to_string(),
            output_name: "simAPI_output.jsonl".to_string(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 49002,
            freshness: Duration::from_secs(3),
            channel_capacity: 64,
        }
    }
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(750),
            error_backoff: Duration::from_secs(1),
            ident_dwell: Duration::from_secs(18),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_interval_bare_millis() {
        let interval: PollInterval = "750".parse().unwrap();
        assert_eq!(interval.as_duration(), Duration::from_millis(750));
    }

    #[test]
    fn test_poll_interval_millis_explicit() {
        let interval: PollInterval = "500ms".parse().unwrap();
        assert_eq!(interval.as_duration(), Duration::from_millis(500));
    }

    #[test]
    fn test_poll_interval_seconds() {
        let interval: PollInterval = "0.75s".parse().unwrap();
        assert_eq!(interval.as_duration(), Duration::from_millis(750));

        let interval: PollInterval = "2s".parse().unwrap();
        assert_eq!(interval.as_duration(), Duration::from_secs(2));
    }

    #[test]
    fn test_poll_interval_invalid() {
        assert!("abc".parse::<PollInterval>().is_err());
        assert!("-100ms".parse::<PollInterval>().is_err());
        assert!("0s".parse::<PollInterval>().is_err());
    }

    #[test]
    fn test_file_paths_join_data_dir() {
        let files = FileConfig::default().with_data_dir("/tmp/atc");
        assert_eq!(
            files.input_path(),
            PathBuf::from("/tmp/atc/simAPI_input.json")
        );
        assert_eq!(
            files.output_path(),
            PathBuf::from("/tmp/atc/simAPI_output.jsonl")
        );
    }
}
