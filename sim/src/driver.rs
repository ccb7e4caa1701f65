//! Experiment driver: one configuration in, one owned result out.

use log::{info, warn};

use crate::config::SimConfig;
use crate::engine::Simulation;
use crate::error::SimError;
use crate::result::RunResult;
use crate::workload::{PoissonWorkload, Workload};

/// Run `config` with Poisson arrivals seeded from `config.random_seed`.
pub fn run(config: &SimConfig) -> Result<RunResult, SimError> {
    let workload = PoissonWorkload::seeded(
        config.process_count,
        config.mean_arrival_interval,
        config.random_seed,
    )?;
    run_workload(config, workload)
}

/// Run `config` with arrivals taken from `workload` instead of the
/// configured Poisson stream. `process_count`, `mean_arrival_interval` and
/// `random_seed` are ignored.
pub fn run_workload<W: Workload>(config: &SimConfig, workload: W) -> Result<RunResult, SimError> {
    info!(
        "run: ram {} cpu speed {} x{} horizon {:?}",
        config.ram_capacity, config.cpu_speed, config.cpu_slots, config.horizon
    );

    let mut sim = Simulation::new(config, workload)?;
    sim.run()?;
    let result = sim.into_result();

    if result.unfinished > 0 {
        warn!(
            "horizon reached at t={:.3} with {} processes unfinished",
            result.final_time, result.unfinished
        );
    }
    info!(
        "run finished at t={:.3}: {} completed, mean waiting {}",
        result.final_time,
        result.completed(),
        result
            .mean()
            .map_or_else(|| "n/a".to_string(), |m| format!("{m:.3}"))
    );
    Ok(result)
}
