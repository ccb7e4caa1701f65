//! Single run
//!
//! Runs one configuration and prints waiting-time and RAM metrics.

use anyhow::{bail, Context, Result};
use procsim::{SimConfig, SimError};
use std::env;
use std::fs::File;

const USAGE: &str = "Usage: procsim-run [--config FILE] [--processes N] [--interval X] \
                     [--seed S] [--horizon T] [--json FILE] [--csv FILE]";

#[derive(Default)]
struct Args {
    config: Option<String>,
    processes: Option<u64>,
    interval: Option<f64>,
    seed: Option<u64>,
    horizon: Option<f64>,
    json: Option<String>,
    csv: Option<String>,
}

fn parse_args() -> Result<Args> {
    let mut parsed = Args::default();
    let mut args = env::args().skip(1);

    while let Some(flag) = args.next() {
        let mut value = || args.next().with_context(|| format!("{flag} needs a value\n{USAGE}"));
        match flag.as_str() {
            "--config" => parsed.config = Some(value()?),
            "--processes" => parsed.processes = Some(value()?.parse().context("--processes")?),
            "--interval" => parsed.interval = Some(value()?.parse().context("--interval")?),
            "--seed" => parsed.seed = Some(value()?.parse().context("--seed")?),
            "--horizon" => parsed.horizon = Some(value()?.parse().context("--horizon")?),
            "--json" => parsed.json = Some(value()?),
            "--csv" => parsed.csv = Some(value()?),
            "-h" | "--help" => {
                println!("{USAGE}");
                std::process::exit(0);
            }
            _ => bail!("unknown argument: {flag}\n{USAGE}"),
        }
    }
    Ok(parsed)
}

fn init_logging() {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn main() -> Result<()> {
    init_logging();
    let args = parse_args()?;

    let mut config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(n) = args.processes {
        config.process_count = n;
    }
    if let Some(interval) = args.interval {
        config.mean_arrival_interval = interval;
    }
    if let Some(seed) = args.seed {
        config.random_seed = seed;
    }
    if args.horizon.is_some() {
        config.horizon = args.horizon;
    }

    println!("=== Process Scheduling Simulator ===");
    println!(
        "{} processes, interval {}, RAM {}, CPU speed {} x{}, seed {}\n",
        config.process_count,
        config.mean_arrival_interval,
        config.ram_capacity,
        config.cpu_speed,
        config.cpu_slots,
        config.random_seed
    );

    let result = procsim::run(&config)?;

    println!("=== Metrics ===");
    println!("Completed: {}", result.completed());
    println!("Unfinished: {}", result.unfinished);
    println!("Simulated time: {:.3}", result.final_time);
    match result.summary() {
        Ok(summary) => {
            println!("Mean waiting time: {:.3}", summary.waiting.mean);
            println!("Stddev waiting time: {:.3}", summary.waiting.stddev);
            println!("p50 waiting time: {:.3}", summary.waiting.p50);
            println!("p95 waiting time: {:.3}", summary.waiting.p95);
            if let Some(util) = summary.ram_utilization {
                println!("RAM utilization: {:.1}%", util * 100.0);
            }
            println!("Peak RAM in use: {}", result.peak_ram_in_use);
        }
        Err(SimError::EmptyResultSet) => println!("No process completed; no data"),
        Err(e) => return Err(e.into()),
    }

    if let Some(path) = &args.json {
        let file = File::create(path).with_context(|| format!("creating {path}"))?;
        serde_json::to_writer_pretty(file, &result).with_context(|| format!("writing {path}"))?;
        println!("\nWrote result to {path}");
    }

    if let Some(path) = &args.csv {
        let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
        for record in &result.records {
            wtr.serialize(record)?;
        }
        wtr.flush()?;
        println!("Wrote {} process records to {path}", result.records.len());
    }

    Ok(())
}
