//! Run Statistics
//!
//! Sample summaries and RAM utilization traces produced by simulation runs.
//! Nothing here knows about the engine; callers push values and ask for
//! summaries. Every statistic over an empty sample is `None`.

use serde::{Deserialize, Serialize};

/// Scalar samples (waiting times, utilization readings)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Samples {
    values: Vec<f64>,
}

impl Samples {
    pub fn new() -> Self {
        Self { values: Vec::new() }
    }

    pub fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    /// Population standard deviation (ddof = 0)
    pub fn stddev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let var = self.values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
            / self.values.len() as f64;
        Some(var.sqrt())
    }

    pub fn min(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::min)
    }

    pub fn max(&self) -> Option<f64> {
        self.values.iter().copied().reduce(f64::max)
    }

    pub fn p50(&self) -> Option<f64> {
        self.percentile(0.50)
    }

    pub fn p95(&self) -> Option<f64> {
        self.percentile(0.95)
    }

    /// Nearest-rank percentile, `p` in [0, 1]
    pub fn percentile(&self, p: f64) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        let mut sorted = self.values.clone();
        sorted.sort_unstable_by(f64::total_cmp);
        let idx = ((sorted.len() as f64) * p.clamp(0.0, 1.0)).floor() as usize;
        Some(sorted[idx.min(sorted.len() - 1)])
    }
}

impl From<Vec<f64>> for Samples {
    fn from(values: Vec<f64>) -> Self {
        Self { values }
    }
}

/// Point summary of a non-empty sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p95: f64,
}

impl Summary {
    /// Summarize `samples`, or `None` when there is nothing to summarize.
    pub fn of(samples: &Samples) -> Option<Self> {
        Some(Self {
            count: samples.len(),
            mean: samples.mean()?,
            stddev: samples.stddev()?,
            min: samples.min()?,
            max: samples.max()?,
            p50: samples.p50()?,
            p95: samples.p95()?,
        })
    }
}

/// One reading of RAM in use
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RamSample {
    pub time: f64,
    pub in_use: u64,
}

/// RAM utilization trace of a single run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RamTrace {
    capacity: u64,
    samples: Vec<RamSample>,
}

impl RamTrace {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            samples: Vec::new(),
        }
    }

    pub fn record(&mut self, time: f64, in_use: u64) {
        debug_assert!(
            self.samples.last().map_or(true, |s| s.time <= time),
            "ram samples must be recorded in time order"
        );
        self.samples.push(RamSample { time, in_use });
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn samples(&self) -> &[RamSample] {
        &self.samples
    }

    /// Units in use at each sample, in recording order
    pub fn series(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.in_use as f64).collect()
    }

    pub fn peak(&self) -> Option<u64> {
        self.samples.iter().map(|s| s.in_use).max()
    }

    /// Mean fraction of capacity in use, weighting each sample by how long
    /// it stayed current. The last sample holds until `end_time`.
    pub fn time_weighted_utilization(&self, end_time: f64) -> Option<f64> {
        let first = self.samples.first()?;
        let span = end_time - first.time;
        if span <= 0.0 || self.capacity == 0 {
            return Some(first.in_use as f64 / self.capacity.max(1) as f64);
        }

        let mut area = 0.0;
        for (i, sample) in self.samples.iter().enumerate() {
            let until = self
                .samples
                .get(i + 1)
                .map_or(end_time, |next| next.time)
                .min(end_time);
            area += sample.in_use as f64 * (until - sample.time).max(0.0);
        }
        Some(area / span / self.capacity as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_and_stddev() {
        let s = Samples::from(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert_eq!(s.mean(), Some(5.0));
        assert_eq!(s.stddev(), Some(2.0));
        assert_eq!(s.min(), Some(2.0));
        assert_eq!(s.max(), Some(9.0));
    }

    #[test]
    fn test_empty_samples_have_no_statistics() {
        let s = Samples::new();
        assert!(s.mean().is_none());
        assert!(s.stddev().is_none());
        assert!(s.p95().is_none());
        assert!(Summary::of(&s).is_none());
    }

    #[test]
    fn test_percentile() {
        let s: Samples = (1..=100).map(f64::from).collect::<Vec<_>>().into();
        assert_eq!(s.p50(), Some(51.0));
        assert_eq!(s.p95(), Some(96.0));
        assert_eq!(s.percentile(1.0), Some(100.0));
        assert_eq!(s.percentile(0.0), Some(1.0));
    }

    #[test]
    fn test_summary_single_value() {
        let mut s = Samples::new();
        s.push(3.5);
        let summary = Summary::of(&s).unwrap();
        assert_eq!(summary.count, 1);
        assert_eq!(summary.mean, 3.5);
        assert_eq!(summary.stddev, 0.0);
        assert_eq!(summary.p50, 3.5);
    }

    #[test]
    fn test_ram_trace() {
        let mut trace = RamTrace::new(100);
        trace.record(0.0, 50);
        trace.record(2.0, 100);
        trace.record(3.0, 0);

        assert_eq!(trace.series(), vec![50.0, 100.0, 0.0]);
        assert_eq!(trace.peak(), Some(100));

        // 50 for 2 units, 100 for 1 unit, 0 for 1 unit over a span of 4
        let u = trace.time_weighted_utilization(4.0).unwrap();
        assert!((u - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_ram_trace() {
        let trace = RamTrace::new(10);
        assert!(trace.peak().is_none());
        assert!(trace.time_weighted_utilization(5.0).is_none());
    }
}
