use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::{SocketAddr, UdpSocket};
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use atclink::simulation::{FlightProfile, FlightSimulator, xatt_sentence, xgps_sentence};

#[derive(Parser, Debug)]
#[command(name = "simulate_flight")]
#[command(about = "Broadcast a synthetic circling flight as XGPS/XATT telemetry")]
struct Args {
    /// Address the bridge is listening on
    #[arg(short, long, default_value = "127.0.0.1:49002")]
    target: String,

    /// Sentence pairs per second
    #[arg(short, long, default_value_t = 2.0)]
    rate: f64,

    /// Simulator name embedded in the sentences
    #[arg(long, default_value = "Aerofly FS4")]
    name: String,

    /// Stop after this many seconds (default: run until interrupted)
    #[arg(long)]
    duration: Option<f64>,

    /// Orbit center latitude in degrees
    #[arg(long)]
    latitude: Option<f64>,

    /// Orbit center longitude in degrees
    #[arg(long)]
    longitude: Option<f64>,

    /// Orbit radius in meters
    #[arg(long)]
    radius: Option<f64>,

    /// Altitude in meters MSL
    #[arg(long)]
    altitude: Option<f64>,

    /// Ground speed in m/s
    #[arg(long)]
    speed: Option<f64>,

    /// Climb rate in m/s (negative to descend)
    #[arg(long)]
    climb: Option<f64>,

    /// Turbulence jitter scale (0 = smooth)
    #[arg(long)]
    turbulence: Option<f64>,

    /// Fixed seed for a reproducible flight
    #[arg(short, long)]
    seed: Option<u64>,

    /// TOML flight profile file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Deserialize, Default)]
struct TomlConfig {
    flight: Option<FlightSection>,
}

#[derive(Debug, Deserialize)]
struct FlightSection {
    latitude: Option<f64>,
    longitude: Option<f64>,
    radius_m: Option<f64>,
    altitude_m: Option<f64>,
    ground_speed_mps: Option<f64>,
    climb_rate_mps: Option<f64>,
    turbulence: Option<f64>,
}

fn load_toml_config(path: &PathBuf) -> Result<TomlConfig> {
    let content = fs::read_to_string(path).context("Failed to read config file")?;
    toml::from_str(&content).context("Failed to parse config file")
}

/// CLI arguments override the TOML file, which overrides the defaults.
fn build_profile(toml: &TomlConfig, args: &Args) -> FlightProfile {
    let mut profile = FlightProfile::default();

    if let Some(ref flight) = toml.flight {
        if let Some(latitude) = flight.latitude {
            profile.center_latitude = latitude;
        }
        if let Some(longitude) = flight.longitude {
            profile.center_longitude = longitude;
        }
        if let Some(radius) = flight.radius_m {
            profile.radius_m = radius;
        }
        if let Some(altitude) = flight.altitude_m {
            profile.altitude_m = altitude;
        }
        if let Some(speed) = flight.ground_speed_mps {
            profile.ground_speed_mps = speed;
        }
        if let Some(climb) = flight.climb_rate_mps {
            profile.climb_rate_mps = climb;
        }
        if let Some(turbulence) = flight.turbulence {
            profile.turbulence = turbulence;
        }
    }

    if let Some(latitude) = args.latitude {
        profile.center_latitude = latitude;
    }
    if let Some(longitude) = args.longitude {
        profile.center_longitude = longitude;
    }
    if let Some(radius) = args.radius {
        profile.radius_m = radius;
    }
    if let Some(altitude) = args.altitude {
        profile.altitude_m = altitude;
    }
    if let Some(speed) = args.speed {
        profile.ground_speed_mps = speed;
    }
    if let Some(climb) = args.climb {
        profile.climb_rate_mps = climb;
    }
    if let Some(turbulence) = args.turbulence {
        profile.turbulence = turbulence;
    }
    profile.seed = args.seed;

    profile
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

    if args.rate <= 0.0 {
        anyhow::bail!("rate must be positive");
    }

    let toml_config = if let Some(ref config_path) = args.config {
        load_toml_config(config_path)?
    } else {
        TomlConfig::default()
    };

    let profile = build_profile(&toml_config, &args);
    let target: SocketAddr = args.target.parse().context("Invalid target address")?;

    println!("=== AtcLink Flight Simulator ===");
    println!("Target: {}", target);
    println!("Rate: {} sentence pairs/s", args.rate);
    println!(
        "Orbit: {:.5}, {:.5}  radius {:.0} m  altitude {:.0} m",
        profile.center_latitude, profile.center_longitude, profile.radius_m, profile.altitude_m
    );
    println!(
        "Speed: {:.0} m/s  climb {:.1} m/s  turbulence {:.2}",
        profile.ground_speed_mps, profile.climb_rate_mps, profile.turbulence
    );
    if let Some(seed) = profile.seed {
        println!("Seed: {}", seed);
    }
    println!();

    let socket = UdpSocket::bind("0.0.0.0:0").context("Failed to bind send socket")?;
    let mut simulator = FlightSimulator::new(profile);

    let dt = 1.0 / args.rate;
    let interval = Duration::from_secs_f64(dt);
    let started = Instant::now();
    let mut last_status = Instant::now();

    loop {
        let (position, attitude) = simulator.step(dt);

        let gps = xgps_sentence(&args.name, &position);
        let att = xatt_sentence(&args.name, &attitude);
        socket
            .send_to(gps.as_bytes(), target)
            .context("Failed to send XGPS sentence")?;
        socket
            .send_to(att.as_bytes(), target)
            .context("Failed to send XATT sentence")?;
        log::debug!("{}", gps);
        log::debug!("{}", att);

        if last_status.elapsed() >= Duration::from_secs(5) {
            println!(
                "lat {:.5}  lon {:.5}  alt {:.0} m  track {:.0}  gs {:.0} m/s",
                position.latitude,
                position.longitude,
                position.altitude_m,
                position.track_deg,
                position.ground_speed_mps
            );
            last_status = Instant::now();
        }

        if let Some(duration) = args.duration
            && started.elapsed().as_secs_f64() >= duration
        {
            break;
        }

        thread::sleep(interval);
    }

    println!("Sent telemetry for {:.1} s", started.elapsed().as_secs_f64());
    Ok(())
}
