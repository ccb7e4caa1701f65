//! Experiment Sweep
//!
//! Runs every (strategy, interval, process count) point of a plan and
//! reports mean waiting time per point.

use anyhow::{bail, Context, Result};
use procsim::SweepPlan;
use std::env;

const USAGE: &str = "Usage: procsim-sweep [--plan FILE] [--out FILE]";

fn init_logging() {
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(log::LevelFilter::Info);
    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn fmt_opt(v: Option<f64>) -> String {
    v.map_or_else(|| "no data".to_string(), |v| format!("{v:.3}"))
}

fn main() -> Result<()> {
    init_logging();

    let mut plan_path = None;
    let mut out_path = None;
    let mut args = env::args().skip(1);
    while let Some(flag) = args.next() {
        match flag.as_str() {
            "--plan" => plan_path = Some(args.next().context("--plan needs a file")?),
            "--out" => out_path = Some(args.next().context("--out needs a file")?),
            _ => bail!("unknown argument: {flag}\n{USAGE}"),
        }
    }

    let plan = match &plan_path {
        Some(path) => SweepPlan::load(path)?,
        None => SweepPlan::default(),
    };

    println!("=== Experiment Sweep ===");
    println!(
        "{:<10} {:>9} {:>10} {:>10} {:>12} {:>12} {:>8}",
        "Strategy", "Interval", "Processes", "Completed", "Mean wait", "Stddev", "RAM %"
    );
    println!("{:-<77}", "");

    let points = plan.run()?;
    for p in &points {
        println!(
            "{:<10} {:>9} {:>10} {:>10} {:>12} {:>12} {:>8}",
            p.strategy,
            p.mean_arrival_interval,
            p.process_count,
            p.completed,
            fmt_opt(p.mean_waiting),
            fmt_opt(p.stddev_waiting),
            p.ram_utilization
                .map_or_else(|| "-".to_string(), |u| format!("{:.1}", u * 100.0)),
        );
    }

    let best = points
        .iter()
        .filter_map(|p| p.mean_waiting.map(|m| (p, m)))
        .min_by(|a, b| a.1.total_cmp(&b.1));
    if let Some((p, mean)) = best {
        println!("\n=== Lowest Mean Waiting Time ===");
        println!(
            "{} at interval {} with {} processes: {:.3}",
            p.strategy, p.mean_arrival_interval, p.process_count, mean
        );
    }

    if let Some(path) = &out_path {
        let mut wtr = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
        for p in &points {
            wtr.serialize(p)?;
        }
        wtr.flush()?;
        println!("\nWrote {} rows to {path}", points.len());
    }

    Ok(())
}
