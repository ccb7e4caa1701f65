//! Run configuration.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::clock::SimTime;
use crate::error::SimError;
use crate::workload::MAX_MEAN_INTERVAL;

/// Slowest accepted cpu. Slower speeds overflow slice durations.
pub const MIN_CPU_SPEED: f64 = 1.0e-9;

/// Configuration of one simulation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimConfig {
    pub process_count: u64,
    pub ram_capacity: u64,
    /// Instructions per unit of simulated time
    pub cpu_speed: f64,
    pub cpu_slots: u64,
    pub mean_arrival_interval: f64,
    /// Stop dispatching after this simulated time; `None` runs to exhaustion
    pub horizon: Option<f64>,
    pub random_seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            process_count: 25,
            ram_capacity: 100,
            cpu_speed: 3.0,
            cpu_slots: 1,
            mean_arrival_interval: 10.0,
            horizon: None,
            random_seed: 42,
        }
    }
}

impl SimConfig {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("parsing {}", path.display()))
    }

    /// A zero `process_count` is valid and yields an empty result.
    pub fn validate(&self) -> Result<(), SimError> {
        if self.ram_capacity == 0 {
            return Err(SimError::invalid_config("ram_capacity", "must be at least 1"));
        }
        if self.cpu_slots == 0 {
            return Err(SimError::invalid_config("cpu_slots", "must be at least 1"));
        }
        if !(self.cpu_speed.is_finite() && self.cpu_speed >= MIN_CPU_SPEED) {
            return Err(SimError::invalid_config(
                "cpu_speed",
                format!("must be at least {MIN_CPU_SPEED}, got {}", self.cpu_speed),
            ));
        }
        if !(self.mean_arrival_interval > 0.0 && self.mean_arrival_interval <= MAX_MEAN_INTERVAL) {
            return Err(SimError::invalid_config(
                "mean_arrival_interval",
                format!(
                    "must be in (0, {MAX_MEAN_INTERVAL}], got {}",
                    self.mean_arrival_interval
                ),
            ));
        }
        if let Some(h) = self.horizon {
            if !(h.is_finite() && h >= 0.0) {
                return Err(SimError::invalid_config(
                    "horizon",
                    format!("must be a non-negative time, got {h}"),
                ));
            }
        }
        Ok(())
    }

    pub fn horizon_time(&self) -> Option<SimTime> {
        self.horizon.map(SimTime::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = SimConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cpu_slots, 1);
        assert!(config.horizon.is_none());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = SimConfig::from_json(r#"{ "process_count": 3, "horizon": 1000 }"#).unwrap();
        assert_eq!(config.process_count, 3);
        assert_eq!(config.horizon, Some(1000.0));
        assert_eq!(config.ram_capacity, 100);
        assert_eq!(config.cpu_speed, 3.0);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(SimConfig::from_json(r#"{ "cpus": 2 }"#).is_err());
    }

    #[test]
    fn test_invalid_fields() {
        let cases: [(&str, fn(&mut SimConfig)); 7] = [
            ("ram_capacity", |c| c.ram_capacity = 0),
            ("cpu_slots", |c| c.cpu_slots = 0),
            ("cpu_speed", |c| c.cpu_speed = -1.0),
            ("cpu_speed", |c| c.cpu_speed = 1e-320),
            ("mean_arrival_interval", |c| c.mean_arrival_interval = f64::NAN),
            ("mean_arrival_interval", |c| c.mean_arrival_interval = 1e308),
            ("horizon", |c| c.horizon = Some(-5.0)),
        ];

        for (name, mutate) in cases {
            let mut config = SimConfig::default();
            mutate(&mut config);
            match config.validate() {
                Err(SimError::InvalidConfig { field, .. }) => assert_eq!(field, name),
                other => panic!("{name}: expected InvalidConfig, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_zero_processes_is_valid() {
        let config = SimConfig {
            process_count: 0,
            ..SimConfig::default()
        };
        assert!(config.validate().is_ok());
    }
}
