//! Per-run results.

use serde::Serialize;
use sim_stats::{RamTrace, Samples, Summary};

use crate::error::SimError;
use crate::process::ProcessRecord;

/// Everything one run produced. Owned by the caller; nothing is shared
/// between runs.
#[derive(Debug, Clone, Serialize)]
pub struct RunResult {
    /// Arrival-to-completion time per completed process, in completion order
    pub waiting_times: Vec<f64>,
    /// RAM units in use, sampled at each completion
    pub ram_utilization_series: Vec<f64>,
    pub ram_trace: RamTrace,
    /// RAM in use as a step function of time, starting at zero
    pub ram_occupancy: RamTrace,
    pub records: Vec<ProcessRecord>,
    /// Processes still live when a horizon cut the run short
    pub unfinished: usize,
    /// Clock value when the run stopped
    pub final_time: f64,
    pub peak_executing: usize,
    pub peak_ram_in_use: u64,
}

/// Headline numbers of a run with at least one completion
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    pub waiting: Summary,
    /// Time-weighted fraction of RAM in use from t=0 to the end of the run
    pub ram_utilization: Option<f64>,
    pub unfinished: usize,
}

impl RunResult {
    pub fn completed(&self) -> usize {
        self.waiting_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiting_times.is_empty()
    }

    fn waiting_samples(&self) -> Samples {
        Samples::from(self.waiting_times.clone())
    }

    pub fn mean(&self) -> Option<f64> {
        self.waiting_samples().mean()
    }

    pub fn stddev(&self) -> Option<f64> {
        self.waiting_samples().stddev()
    }

    pub fn summary(&self) -> Result<RunSummary, SimError> {
        let waiting = Summary::of(&self.waiting_samples()).ok_or(SimError::EmptyResultSet)?;
        Ok(RunSummary {
            waiting,
            ram_utilization: self.ram_occupancy.time_weighted_utilization(self.final_time),
            unfinished: self.unfinished,
        })
    }
}
