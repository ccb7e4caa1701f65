//! Arrival streams.
//!
//! A workload is pulled once per arrival: it returns the demand of the
//! process arriving now and the gap until the next one.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::process::Demand;

/// Inclusive range demands are drawn from
pub const DEMAND_RANGE: std::ops::RangeInclusive<u64> = 1..=10;

/// Largest accepted mean gap between arrivals. Keeps arrival times finite.
pub const MAX_MEAN_INTERVAL: f64 = 1.0e9;

/// One arrival
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arrival {
    pub demand: Demand,
    /// Delay until the next arrival, `None` when this was the last one
    pub next_gap: Option<f64>,
}

/// Arrival generator
pub trait Workload {
    /// Delay before the first arrival
    fn first_delay(&self) -> f64 {
        0.0
    }

    /// Create the process arriving now, or `None` once exhausted.
    fn next_arrival(&mut self) -> Option<Arrival>;
}

/// `count` arrivals with exponential gaps and uniform demands
pub struct PoissonWorkload {
    remaining: u64,
    gaps: Exp<f64>,
    rng: StdRng,
}

impl PoissonWorkload {
    pub fn new(count: u64, mean_interval: f64, rng: StdRng) -> Result<Self, SimError> {
        if !(mean_interval > 0.0 && mean_interval <= MAX_MEAN_INTERVAL) {
            return Err(SimError::invalid_config(
                "mean_arrival_interval",
                format!("must be in (0, {MAX_MEAN_INTERVAL}], got {mean_interval}"),
            ));
        }
        let gaps = Exp::new(1.0 / mean_interval).map_err(|e| {
            SimError::invalid_config("mean_arrival_interval", e.to_string())
        })?;

        Ok(Self {
            remaining: count,
            gaps,
            rng,
        })
    }

    pub fn seeded(count: u64, mean_interval: f64, seed: u64) -> Result<Self, SimError> {
        Self::new(count, mean_interval, StdRng::seed_from_u64(seed))
    }
}

impl Workload for PoissonWorkload {
    fn next_arrival(&mut self) -> Option<Arrival> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        // demands are drawn at creation, before the gap to the next arrival
        let ram = self.rng.gen_range(DEMAND_RANGE);
        let instructions = self.rng.gen_range(DEMAND_RANGE);
        let next_gap = (self.remaining > 0).then(|| self.gaps.sample(&mut self.rng));

        Some(Arrival {
            demand: Demand { ram, instructions },
            next_gap,
        })
    }
}

/// Explicit arrival for a scripted workload
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScriptedArrival {
    pub at: f64,
    pub ram: u64,
    pub instructions: u64,
}

/// Replays a fixed list of arrivals
#[derive(Debug, Clone)]
pub struct ScriptedWorkload {
    arrivals: Vec<ScriptedArrival>,
    next: usize,
}

impl ScriptedWorkload {
    /// Arrival times must be non-negative and non-decreasing, and every
    /// arrival needs at least one instruction.
    pub fn new(arrivals: Vec<ScriptedArrival>) -> Result<Self, SimError> {
        let mut last = 0.0;
        for a in &arrivals {
            if !(a.at.is_finite() && a.at >= last) {
                return Err(SimError::invalid_config(
                    "arrivals",
                    format!("arrival times must be non-decreasing, got {} after {last}", a.at),
                ));
            }
            if a.instructions == 0 {
                return Err(SimError::invalid_config(
                    "arrivals",
                    format!("arrival at {} has no instructions", a.at),
                ));
            }
            last = a.at;
        }
        Ok(Self { arrivals, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.arrivals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arrivals.is_empty()
    }
}

impl Workload for ScriptedWorkload {
    fn first_delay(&self) -> f64 {
        self.arrivals.first().map_or(0.0, |a| a.at)
    }

    fn next_arrival(&mut self) -> Option<Arrival> {
        let current = *self.arrivals.get(self.next)?;
        self.next += 1;
        let next_gap = self.arrivals.get(self.next).map(|n| n.at - current.at);

        Some(Arrival {
            demand: Demand {
                ram: current.ram,
                instructions: current.instructions,
            },
            next_gap,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(w: &mut impl Workload) -> Vec<Arrival> {
        std::iter::from_fn(|| w.next_arrival()).collect()
    }

    #[test]
    fn test_poisson_count_and_ranges() {
        let mut w = PoissonWorkload::seeded(200, 10.0, 7).unwrap();
        let arrivals = drain(&mut w);

        assert_eq!(arrivals.len(), 200);
        for a in &arrivals {
            assert!(DEMAND_RANGE.contains(&a.demand.ram));
            assert!(DEMAND_RANGE.contains(&a.demand.instructions));
        }
        assert!(arrivals[..199].iter().all(|a| a.next_gap.is_some_and(|g| g >= 0.0)));
        assert!(arrivals[199].next_gap.is_none());
    }

    #[test]
    fn test_poisson_mean_gap() {
        let mut w = PoissonWorkload::seeded(20_000, 4.0, 1).unwrap();
        let gaps: Vec<f64> = drain(&mut w).iter().filter_map(|a| a.next_gap).collect();
        let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
        assert!((mean - 4.0).abs() < 0.2, "mean gap {mean}");
    }

    #[test]
    fn test_poisson_same_seed_same_stream() {
        let a = drain(&mut PoissonWorkload::seeded(50, 1.0, 42).unwrap());
        let b = drain(&mut PoissonWorkload::seeded(50, 1.0, 42).unwrap());
        let c = drain(&mut PoissonWorkload::seeded(50, 1.0, 43).unwrap());
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_poisson_empty() {
        let mut w = PoissonWorkload::seeded(0, 1.0, 0).unwrap();
        assert!(w.next_arrival().is_none());
    }

    #[test]
    fn test_poisson_rejects_bad_interval() {
        for interval in [0.0, f64::NAN, 1e308] {
            assert!(matches!(
                PoissonWorkload::seeded(1, interval, 0),
                Err(SimError::InvalidConfig { field: "mean_arrival_interval", .. })
            ));
        }
    }

    #[test]
    fn test_scripted_gaps() {
        let mut w = ScriptedWorkload::new(vec![
            ScriptedArrival { at: 1.0, ram: 2, instructions: 3 },
            ScriptedArrival { at: 1.0, ram: 4, instructions: 5 },
            ScriptedArrival { at: 2.5, ram: 6, instructions: 7 },
        ])
        .unwrap();

        assert_eq!(w.first_delay(), 1.0);
        let gaps: Vec<_> = drain(&mut w).iter().map(|a| a.next_gap).collect();
        assert_eq!(gaps, vec![Some(0.0), Some(1.5), None]);
    }

    #[test]
    fn test_scripted_rejects_unordered() {
        let res = ScriptedWorkload::new(vec![
            ScriptedArrival { at: 2.0, ram: 1, instructions: 1 },
            ScriptedArrival { at: 1.0, ram: 1, instructions: 1 },
        ]);
        assert!(matches!(res, Err(SimError::InvalidConfig { field: "arrivals", .. })));
    }

    #[test]
    fn test_scripted_rejects_zero_instructions() {
        let res = ScriptedWorkload::new(vec![
            ScriptedArrival { at: 0.0, ram: 1, instructions: 2 },
            ScriptedArrival { at: 0.0, ram: 1, instructions: 0 },
        ]);
        assert!(matches!(res, Err(SimError::InvalidConfig { field: "arrivals", .. })));
    }
}
