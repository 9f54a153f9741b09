//! Point-volume generator CLI.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use generator::{run, RunOptions};

#[derive(Parser, Debug)]
#[command(name = "volume-generator")]
#[command(about = "Bin point records into time-bucketed aggregated grids")]
struct Args {
    /// Layer configuration (YAML)
    #[arg(short, long, env = "VOLUME_CONFIG")]
    config: PathBuf,

    /// Records to process (JSON array of rows)
    #[arg(short, long, env = "VOLUME_INPUT")]
    input: PathBuf,

    /// Write raw slices under this directory
    #[arg(short, long, env = "VOLUME_OUTPUT")]
    output: Option<PathBuf>,

    /// Log level
    #[arg(long, default_value = "info", env = "RUST_LOG")]
    log_level: String,

    /// Write the run summary here instead of stdout
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(std::io::stderr)
        .json()
        .init();

    info!("Starting volume generator");

    let report = run(&RunOptions {
        config: args.config,
        input: args.input,
        output: args.output,
    })?;

    let json = serde_json::to_string_pretty(&report)?;
    match &args.summary {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write summary {}", path.display()))?,
        None => println!("{}", json),
    }

    let failed = report.failed();
    if failed > 0 {
        warn!(failed, "Some subsets failed");
        std::process::exit(1);
    }
    Ok(())
}
