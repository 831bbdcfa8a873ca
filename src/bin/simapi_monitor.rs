use anyhow::Result;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, SystemTime};

use atclink::config::FileConfig;

#[derive(Parser, Debug)]
#[command(name = "simapi_monitor")]
#[command(about = "Watch the SimAPI exchange files and pretty-print them on change")]
struct Args {
    /// Directory for the SimAPI exchange files
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Poll interval in milliseconds
    #[arg(long, default_value_t = 500)]
    interval_ms: u64,

    /// Print the current contents once and exit
    #[arg(long)]
    once: bool,
}

fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S").to_string()
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

fn print_snapshot(path: &Path) {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            println!("{}: {}", path.display(), e);
            return;
        }
    };
    println!("--- snapshot @ {} ---", timestamp());
    match serde_json::from_str::<serde_json::Value>(&contents) {
        Ok(value) => println!("{:#}", value),
        Err(e) => println!("Invalid JSON: {}", e),
    }
    println!();
}

fn print_commands(path: &Path) {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            println!("{}: {}", path.display(), e);
            return;
        }
    };
    // The bridge truncates this file after draining it; nothing to show then.
    if contents.trim().is_empty() {
        return;
    }
    println!("--- commands @ {} ---", timestamp());
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<serde_json::Value>(line) {
            Ok(value) => println!("{:#}", value),
            Err(_) => println!("Invalid JSON: {}", line),
        }
    }
    println!();
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut files = FileConfig::default();
    if let Some(ref dir) = args.data_dir {
        files.data_dir = dir.clone();
    }
    let input_path = files.input_path();
    let output_path = files.output_path();

    println!("Input:  {}", input_path.display());
    println!("Output: {}", output_path.display());
    println!();

    if args.once {
        print_snapshot(&input_path);
        print_commands(&output_path);
        return Ok(());
    }

    let interval = Duration::from_millis(args.interval_ms);
    let mut last_input: Option<SystemTime> = None;
    let mut last_output: Option<SystemTime> = None;

    loop {
        if let Some(mtime) = modified(&input_path)
            && last_input != Some(mtime)
        {
            last_input = Some(mtime);
            print_snapshot(&input_path);
        }

        if let Some(mtime) = modified(&output_path)
            && last_output != Some(mtime)
        {
            last_output = Some(mtime);
            print_commands(&output_path);
        }

        thread::sleep(interval);
    }
}
