//! procsensor-cpu: dump CPU time accounting or topology as JSON.
//!
//! Reads the kernel files once, prints a single JSON document to stdout and
//! exits. Diagnostics go to stderr through `tracing`.

use clap::Parser;
use procsensor_core::lines::FsLineSource;
use procsensor_core::{GlobalConfig, SourcePaths};
use procsensor_cpu::{cpu_count, CpuTimesParser, TopologyParser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Command-line arguments for the CPU sensor.
#[derive(Parser)]
#[command(name = "procsensor-cpu")]
#[command(about = "CPU time accounting and topology from /proc")]
#[command(version)]
#[command(author)]
struct Args {
    /// Report one row per logical processor instead of the aggregate row
    #[arg(short, long)]
    per_cpu: bool,

    /// Report processor topology from the cpuinfo listing instead of times
    #[arg(short, long)]
    info: bool,

    /// Override the time-accounting table path
    #[arg(long)]
    stat_path: Option<PathBuf>,

    /// Override the processor descriptor listing path
    #[arg(long)]
    cpuinfo_path: Option<PathBuf>,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Config file to use instead of the standard locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Generate example config file and exit
    #[arg(long)]
    generate_config: bool,

    /// Increase log verbosity (default info, -v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "procsensor_cpu={level},procsensor_core={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.generate_config {
        let Some(config_path) = GlobalConfig::default_config_path() else {
            return Err("Could not determine config directory".into());
        };
        GlobalConfig::save_example_config_to_file(&config_path)?;
        println!("Generated example config at: {}", config_path.display());
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => GlobalConfig::load_from_file(path)?,
        None => GlobalConfig::load()?,
    };
    let sources = SourcePaths {
        stat: args.stat_path.clone().unwrap_or(config.sources.stat),
        cpuinfo: args.cpuinfo_path.clone().unwrap_or(config.sources.cpuinfo),
    };
    tracing::debug!(%sources, "resolved kernel sources");
    let per_cpu = args.per_cpu || config.per_cpu;
    let pretty = args.pretty || config.pretty;

    let document = if args.info {
        let topology = TopologyParser::with_source(FsLineSource, sources.cpuinfo).parse()?;
        serde_json::json!({
            "num_cpu": topology.num_cpu(),
            "num_core": topology.num_core(false),
            "num_package": topology.num_core(true),
            "available_parallelism": cpu_count(),
            "processors": topology.processors,
        })
    } else {
        let rows = CpuTimesParser::with_source(FsLineSource, sources.stat).parse(!per_cpu)?;
        serde_json::to_value(rows)?
    };

    let output = if pretty {
        serde_json::to_string_pretty(&document)?
    } else {
        serde_json::to_string(&document)?
    };
    println!("{}", output);

    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "procsensor-cpu failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
