use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use atclink::config::PollInterval;
use atclink::state::ComRadio;
use atclink::telemetry::UdpTelemetrySource;
use atclink::{Bridge, BridgeConfig, Managers, SyncLoop, lock_state};

#[derive(Parser, Debug)]
#[command(name = "atclink")]
#[command(about = "Bridge flight simulator telemetry to an ATC service via SimAPI files")]
struct Args {
    /// Directory for the SimAPI exchange files
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// UDP port to listen on for simulator telemetry
    #[arg(short, long)]
    port: Option<u16>,

    /// Snapshot interval, e.g. "750ms" or "1.5s"
    #[arg(short, long)]
    interval: Option<PollInterval>,

    /// Callsign reported to the ATC service
    #[arg(long)]
    callsign: Option<String>,

    /// Aircraft type reported to the ATC service
    #[arg(long)]
    aircraft_type: Option<String>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    files: Option<FilesSection>,
    telemetry: Option<TelemetrySection>,
    timing: Option<TimingSection>,
    aircraft: Option<AircraftSection>,
}

#[derive(Debug, Deserialize)]
struct FilesSection {
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct TelemetrySection {
    bind_address: Option<String>,
    port: Option<u16>,
    freshness_s: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TimingSection {
    poll_interval_ms: Option<u64>,
    error_backoff_ms: Option<u64>,
    ident_dwell_s: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct AircraftSection {
    callsign: Option<String>,
    aircraft_type: Option<String>,
}

fn load_toml_config(path: &PathBuf) -> Result<TomlConfig> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

/// CLI arguments override the TOML file, which overrides the defaults.
fn build_config(toml: &TomlConfig, args: &Args) -> BridgeConfig {
    let mut config = BridgeConfig::default();

    if let Some(ref files) = toml.files
        && let Some(ref dir) = files.data_dir
    {
        config.files.data_dir = dir.clone();
    }
    if let Some(ref dir) = args.data_dir {
        config.files.data_dir = dir.clone();
    }

    if let Some(ref telemetry) = toml.telemetry {
        if let Some(ref addr) = telemetry.bind_address {
            config.telemetry.bind_address = addr.clone();
        }
        if let Some(port) = telemetry.port {
            config.telemetry.port = port;
        }
        if let Some(secs) = telemetry.freshness_s {
            config.telemetry.freshness = Duration::from_secs(secs);
        }
    }
    if let Some(port) = args.port {
        config.telemetry.port = port;
    }

    if let Some(ref timing) = toml.timing {
        if let Some(ms) = timing.poll_interval_ms {
            config.timing.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = timing.error_backoff_ms {
            config.timing.error_backoff = Duration::from_millis(ms);
        }
        if let Some(secs) = timing.ident_dwell_s {
            config.timing.ident_dwell = Duration::from_secs(secs);
        }
    }
    if let Some(interval) = args.interval {
        config.timing.poll_interval = interval.as_duration();
    }

    config
}

fn apply_aircraft_overrides(shared: &Mutex<Managers>, toml: &TomlConfig, args: &Args) {
    let mut managers = lock_state(shared);

    if let Some(ref callsign) = args.callsign {
        managers.aircraft.set_callsign(callsign);
    } else if let Some(ref aircraft) = toml.aircraft
        && let Some(ref callsign) = aircraft.callsign
    {
        managers.aircraft.set_callsign(callsign);
    }

    if let Some(ref aircraft_type) = args.aircraft_type {
        managers.aircraft.set_aircraft_type(aircraft_type);
    } else if let Some(ref aircraft) = toml.aircraft
        && let Some(ref aircraft_type) = aircraft.aircraft_type
    {
        managers.aircraft.set_aircraft_type(aircraft_type);
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let toml_config = if let Some(ref config_path) = args.config {
        load_toml_config(config_path)?
    } else {
        TomlConfig::default()
    };

    let config = build_config(&toml_config, &args);

    println!("=== AtcLink - Flight Sim to ATC Bridge ===");
    println!("Data directory: {}", config.files.data_dir.display());
    println!("Snapshot file: {}", config.files.input_path().display());
    println!("Command file: {}", config.files.output_path().display());
    println!(
        "Telemetry: UDP {}:{}",
        config.telemetry.bind_address, config.telemetry.port
    );
    println!(
        "Poll interval: {} ms",
        config.timing.poll_interval.as_millis()
    );
    println!();

    let source = UdpTelemetrySource::new(&config.telemetry)?;

    let bridge = Bridge::new(&config, Box::new(source))?;
    let shared = bridge.shared();

    apply_aircraft_overrides(&shared, &toml_config, &args);

    println!("Starting sync loop...");
    let sync = SyncLoop::spawn(bridge, config.timing.clone());

    println!("Bridge running. Snapshots update every cycle.\n");

    run_status_loop(sync, shared)
}

const STATUS_INTERVAL: Duration = Duration::from_secs(5);

fn run_status_loop(sync: SyncLoop, shared: Arc<Mutex<Managers>>) -> Result<()> {
    let mut seen_changes = 0;

    loop {
        thread::sleep(STATUS_INTERVAL);

        if !sync.telemetry_live() {
            log::warn!("Waiting for telemetry...");
            continue;
        }

        let managers = lock_state(&shared);
        let state = managers.aircraft.state();
        println!(
            "Position: {}  Altitude: {}  Heading: {}  COM1: {:.3}  Squawk: {:04}",
            state.position_text(),
            state.altitude_text(),
            state.heading_text(),
            managers.radio.active_frequency(ComRadio::Com1),
            managers.transponder.code()
        );

        if managers.changes.len() > seen_changes {
            if let Some(change) = managers.changes.latest() {
                println!("  ATC: {}", change);
            }
            seen_changes = managers.changes.len();
        }
    }
}
