use anyhow::Result;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use atclink::config::FileConfig;
use atclink::simapi::SimApiFiles;

#[derive(Parser, Debug)]
#[command(name = "simapi_tester")]
#[command(about = "Append every recognized SimAPI command and verify the snapshot reflects it")]
struct Args {
    /// Directory for the SimAPI exchange files
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Full passes through the command list (0 = run until interrupted)
    #[arg(short, long, default_value_t = 1)]
    cycles: u32,

    /// Snapshot checks per command before giving up
    #[arg(long, default_value_t = 2)]
    attempts: u32,

    /// Delay between snapshot checks in milliseconds. Must exceed the
    /// bridge's poll interval: the bridge drains one command per cycle,
    /// so appending faster than it polls loses commands.
    #[arg(long, default_value_t = 1000)]
    interval_ms: u64,

    /// Increase verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

/// How a commanded value should show up in the snapshot.
#[derive(Debug, Clone, Copy)]
enum Check {
    /// Snapshot variable must equal the commanded integer.
    Exact(&'static str),
    /// Commanded Hz value must appear as MHz under the given key.
    FrequencyMhz(&'static str),
    /// No snapshot variable reflects this command; it still exercises
    /// the parse-and-apply path (swaps move state the next set reveals,
    /// standby frequencies and volumes are not exported).
    Unverified,
}

struct TestCase {
    setvar: &'static str,
    value: i64,
    check: Check,
}

const CASES: &[TestCase] = &[
    TestCase {
        setvar: "AUDIO_PANEL_VOLUME_SET",
        value: 50,
        check: Check::Unverified,
    },
    TestCase {
        setvar: "COM1_VOLUME_SET",
        value: 75,
        check: Check::Unverified,
    },
    TestCase {
        setvar: "COM2_RADIO_SET_HZ",
        value: 123_455_000,
        check: Check::FrequencyMhz("COM ACTIVE FREQUENCY:2"),
    },
    TestCase {
        setvar: "COM2_RADIO_SWAP",
        value: 1,
        check: Check::Unverified,
    },
    TestCase {
        setvar: "COM2_STBY_RADIO_SET_HZ",
        value: 121_800_000,
        check: Check::Unverified,
    },
    TestCase {
        setvar: "COM2_VOLUME_SET",
        value: 60,
        check: Check::Unverified,
    },
    TestCase {
        setvar: "COM_RADIO_SET_HZ",
        value: 127_950_000,
        check: Check::FrequencyMhz("COM ACTIVE FREQUENCY:1"),
    },
    TestCase {
        setvar: "COM_RADIO_SWAP",
        value: 1,
        check: Check::Unverified,
    },
    TestCase {
        setvar: "COM_STBY_RADIO_SET_HZ",
        value: 118_300_000,
        check: Check::Unverified,
    },
    TestCase {
        setvar: "XPNDR_SET",
        value: 7700,
        check: Check::Exact("TRANSPONDER CODE:1"),
    },
];

fn read_variable<'a>(snapshot: &'a serde_json::Value, name: &str) -> Option<&'a serde_json::Value> {
    snapshot.get("sim")?.get("variables")?.get(name)
}

impl Check {
    fn key(&self) -> Option<&'static str> {
        match *self {
            Check::Exact(key) | Check::FrequencyMhz(key) => Some(key),
            Check::Unverified => None,
        }
    }

    fn matches(&self, snapshot: &serde_json::Value, commanded: i64) -> bool {
        match *self {
            Check::Exact(key) => {
                read_variable(snapshot, key).and_then(serde_json::Value::as_i64) == Some(commanded)
            }
            Check::FrequencyMhz(key) => {
                let Some(actual) = read_variable(snapshot, key).and_then(serde_json::Value::as_f64)
                else {
                    return false;
                };
                let expected = commanded as f64 / 1e6;
                (actual - expected).abs() < 1e-6
            }
            Check::Unverified => true,
        }
    }
}

fn poll_for_match(input_path: &Path, case: &TestCase, attempts: u32, interval: Duration) -> bool {
    for _ in 0..attempts {
        thread::sleep(interval);

        let Ok(contents) = fs::read_to_string(input_path) else {
            log::debug!("snapshot not readable yet");
            continue;
        };
        let Ok(snapshot) = serde_json::from_str::<serde_json::Value>(&contents) else {
            log::debug!("snapshot not parseable yet");
            continue;
        };

        if case.check.matches(&snapshot, case.value) {
            return true;
        }
        if let Some(key) = case.check.key() {
            log::debug!(
                "{} is {:?}, waiting for {}",
                key,
                read_variable(&snapshot, key),
                case.value
            );
        }
    }
    false
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

    let mut file_config = FileConfig::default();
    if let Some(ref dir) = args.data_dir {
        file_config.data_dir = dir.clone();
    }
    let files = SimApiFiles::new(&file_config)?;

    println!(
        "Writing test requests to {} (Ctrl+C to stop)...",
        files.output_path().display()
    );

    let interval = Duration::from_millis(args.interval_ms);
    let mut pass = 0u32;
    let mut matched = 0u32;
    let mut missed = 0u32;
    let mut unverified = 0u32;

    loop {
        for case in CASES {
            let line = serde_json::json!({"setvar": case.setvar, "value": case.value}).to_string();
            files.append_command_line(&line)?;
            println!("Wrote: {}", line);

            match case.check {
                Check::Unverified => {
                    unverified += 1;
                    // Give the bridge a cycle to drain before the next append.
                    thread::sleep(interval);
                }
                _ => {
                    if poll_for_match(files.input_path(), case, args.attempts, interval) {
                        println!("[OK] {} reflected in snapshot", case.setvar);
                        matched += 1;
                    } else {
                        println!(
                            "[MISS] {} not reflected after {} checks",
                            case.setvar, args.attempts
                        );
                        missed += 1;
                    }
                }
            }
        }

        pass += 1;
        if args.cycles != 0 && pass >= args.cycles {
            break;
        }
    }

    println!();
    println!(
        "Matched: {}  Missed: {}  Unverified: {}",
        matched, missed, unverified
    );
    if missed > 0 {
        anyhow::bail!("{} commands were not reflected in the snapshot", missed);
    }
    Ok(())
}
