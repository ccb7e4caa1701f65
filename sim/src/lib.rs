//! Process Scheduling Simulator
//!
//! Discrete-event model of a single computer with bounded RAM and a CPU of
//! fixed speed. Processes arrive over time, wait for memory, then share the
//! CPU in instruction slices until they finish.
//!
//! ```no_run
//! use procsim::{run, SimConfig};
//!
//! let result = run(&SimConfig::default()).unwrap();
//! println!("mean waiting time: {:?}", result.mean());
//! ```

pub mod clock;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod process;
pub mod resource;
pub mod result;
pub mod sweep;
pub mod workload;

pub use clock::{Clock, SimTime};
pub use config::SimConfig;
pub use driver::{run, run_workload};
pub use engine::Simulation;
pub use error::SimError;
pub use process::{Demand, Phase, ProcessId, ProcessRecord};
pub use resource::{CpuServer, RamPool, Resource};
pub use result::{RunResult, RunSummary};
pub use sweep::{Strategy, SweepPlan, SweepPoint};
pub use workload::{PoissonWorkload, ScriptedArrival, ScriptedWorkload, Workload};
