//! Experiment sweeps over process counts, arrival intervals and resource
//! strategies. Every grid point is an independent run.

use anyhow::Context;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::SimConfig;
use crate::driver;
use crate::error::SimError;

/// Resource overrides applied on top of the base config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strategy {
    pub name: String,
    #[serde(default)]
    pub ram_capacity: Option<u64>,
    #[serde(default)]
    pub cpu_speed: Option<f64>,
    #[serde(default)]
    pub cpu_slots: Option<u64>,
}

impl Strategy {
    pub fn baseline() -> Self {
        Self {
            name: "baseline".to_string(),
            ram_capacity: None,
            cpu_speed: None,
            cpu_slots: None,
        }
    }

    pub fn apply(&self, base: &SimConfig) -> SimConfig {
        SimConfig {
            ram_capacity: self.ram_capacity.unwrap_or(base.ram_capacity),
            cpu_speed: self.cpu_speed.unwrap_or(base.cpu_speed),
            cpu_slots: self.cpu_slots.unwrap_or(base.cpu_slots),
            ..base.clone()
        }
    }
}

/// Grid of runs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepPlan {
    pub base: SimConfig,
    pub process_counts: Vec<u64>,
    pub intervals: Vec<f64>,
    pub strategies: Vec<Strategy>,
}

impl Default for SweepPlan {
    fn default() -> Self {
        Self {
            base: SimConfig::default(),
            process_counts: vec![25, 50, 100, 150, 200],
            intervals: vec![10.0, 5.0, 1.0],
            strategies: vec![
                Strategy::baseline(),
                Strategy {
                    name: "ram-200".to_string(),
                    ram_capacity: Some(200),
                    ..Strategy::baseline()
                },
                Strategy {
                    name: "speed-6".to_string(),
                    cpu_speed: Some(6.0),
                    ..Strategy::baseline()
                },
                Strategy {
                    name: "two-cpus".to_string(),
                    cpu_slots: Some(2),
                    ..Strategy::baseline()
                },
            ],
        }
    }
}

/// Outcome of one grid point. Statistics are `None` when nothing completed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SweepPoint {
    pub strategy: String,
    pub process_count: u64,
    pub mean_arrival_interval: f64,
    pub ram_capacity: u64,
    pub cpu_speed: f64,
    pub cpu_slots: u64,
    pub completed: usize,
    pub mean_waiting: Option<f64>,
    pub stddev_waiting: Option<f64>,
    pub p95_waiting: Option<f64>,
    pub ram_utilization: Option<f64>,
}

impl SweepPlan {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// Configs in grid order: strategy, then interval, then process count
    pub fn configs(&self) -> Vec<(&str, SimConfig)> {
        let mut out = Vec::new();
        for strategy in &self.strategies {
            let base = strategy.apply(&self.base);
            for &interval in &self.intervals {
                for &count in &self.process_counts {
                    let config = SimConfig {
                        process_count: count,
                        mean_arrival_interval: interval,
                        ..base.clone()
                    };
                    out.push((strategy.name.as_str(), config));
                }
            }
        }
        out
    }

    pub fn run(&self) -> Result<Vec<SweepPoint>, SimError> {
        let configs = self.configs();
        info!("sweep: {} runs", configs.len());

        configs
            .into_iter()
            .map(|(strategy, config)| -> Result<SweepPoint, SimError> {
                let result = driver::run(&config)?;
                let summary = result.summary().ok();
                Ok(SweepPoint {
                    strategy: strategy.to_string(),
                    process_count: config.process_count,
                    mean_arrival_interval: config.mean_arrival_interval,
                    ram_capacity: config.ram_capacity,
                    cpu_speed: config.cpu_speed,
                    cpu_slots: config.cpu_slots,
                    completed: result.completed(),
                    mean_waiting: summary.map(|s| s.waiting.mean),
                    stddev_waiting: summary.map(|s| s.waiting.stddev),
                    p95_waiting: summary.map(|s| s.waiting.p95),
                    ram_utilization: summary.and_then(|s| s.ram_utilization),
                })
            })
            .collect()
    }
}
