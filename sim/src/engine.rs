//! Discrete-event engine.
//!
//! Couples the clock, the RAM pool, the CPU server and the process
//! lifecycle. Every suspension point (blocked RAM request, blocked CPU
//! request, slice in progress) is a continuation scheduled on the clock;
//! nothing blocks a real thread.

use log::{debug, trace};
use sim_stats::RamTrace;

use crate::clock::{Clock, SimTime};
use crate::config::SimConfig;
use crate::error::SimError;
use crate::process::{Phase, Process, ProcessId};
use crate::resource::{Acquire, CpuServer, Grant, RamPool, Resource};
use crate::result::RunResult;
use crate::workload::Workload;

/// Continuations the clock dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Pull the next arrival from the workload
    Spawn,
    /// A blocked process was handed a resource and continues
    Resume(ProcessId),
    /// A process finished its current instruction slice
    SliceComplete(ProcessId),
}

/// One simulation run in progress
pub struct Simulation<W: Workload> {
    clock: Clock<Action>,
    world: World<W>,
    horizon: Option<SimTime>,
}

/// Everything the clock's actions mutate
struct World<W> {
    ram: RamPool,
    cpu: CpuServer,
    workload: W,
    processes: Vec<Process>,
    live: usize,
    executing: usize,
    peak_executing: usize,
    peak_ram_in_use: u64,
    waiting_times: Vec<f64>,
    /// RAM in use at each completion
    ram_trace: RamTrace,
    /// RAM in use after every grant and release
    ram_occupancy: RamTrace,
}

impl<W: Workload> Simulation<W> {
    /// Build a fresh run. Resource sizes and the horizon come from `config`;
    /// arrivals come from `workload`.
    pub fn new(config: &SimConfig, workload: W) -> Result<Self, SimError> {
        config.validate()?;

        let mut clock = Clock::new();
        clock.schedule(workload.first_delay(), Action::Spawn);

        let mut ram_occupancy = RamTrace::new(config.ram_capacity);
        ram_occupancy.record(0.0, 0);

        Ok(Self {
            clock,
            world: World {
                ram: RamPool::new(config.ram_capacity),
                cpu: CpuServer::new(config.cpu_speed, config.cpu_slots),
                workload,
                processes: Vec::new(),
                live: 0,
                executing: 0,
                peak_executing: 0,
                peak_ram_in_use: 0,
                waiting_times: Vec::new(),
                ram_trace: RamTrace::new(config.ram_capacity),
                ram_occupancy,
            },
            horizon: config.horizon_time(),
        })
    }

    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    pub fn ram(&self) -> &RamPool {
        &self.world.ram
    }

    pub fn cpu(&self) -> &CpuServer {
        &self.world.cpu
    }

    pub fn processes(&self) -> &[Process] {
        &self.world.processes
    }

    /// Processes spawned and not yet completed
    pub fn live(&self) -> usize {
        self.world.live
    }

    /// Processes currently inside an instruction slice
    pub fn executing(&self) -> usize {
        self.world.executing
    }

    /// Dispatch a single event. Returns `false` once nothing is left to
    /// dispatch before the horizon.
    pub fn step(&mut self) -> Result<bool, SimError> {
        match self.clock.advance(self.horizon) {
            Some(action) => {
                self.world.dispatch(&mut self.clock, action)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Dispatch until the event queue drains or the horizon is reached.
    pub fn run(&mut self) -> Result<(), SimError> {
        let Self {
            clock,
            world,
            horizon,
        } = self;
        clock.run_until(*horizon, |clock, action| world.dispatch(clock, action))?;

        if horizon.is_none() {
            // without a horizon every spawned process must have drained
            assert_eq!(world.live, 0, "processes left blocked with an empty event queue");
        }
        Ok(())
    }

    pub fn into_result(self) -> RunResult {
        let world = self.world;
        RunResult {
            ram_utilization_series: world.ram_trace.series(),
            records: world.processes.iter().filter_map(Process::record).collect(),
            waiting_times: world.waiting_times,
            ram_trace: world.ram_trace,
            ram_occupancy: world.ram_occupancy,
            unfinished: world.live,
            final_time: self.clock.now().as_f64(),
            peak_executing: world.peak_executing,
            peak_ram_in_use: world.peak_ram_in_use,
        }
    }
}

impl<W: Workload> World<W> {
    fn dispatch(&mut self, clock: &mut Clock<Action>, action: Action) -> Result<(), SimError> {
        trace!("t={} dispatch {:?}", clock.now(), action);
        match action {
            Action::Spawn => self.spawn(clock),
            Action::Resume(id) => self.resume(clock, id),
            Action::SliceComplete(id) => self.slice_complete(clock, id),
        }
    }

    fn process(&mut self, id: ProcessId) -> &mut Process {
        &mut self.processes[id.0 as usize]
    }

    fn spawn(&mut self, clock: &mut Clock<Action>) -> Result<(), SimError> {
        let Some(arrival) = self.workload.next_arrival() else {
            return Ok(());
        };
        if let Some(gap) = arrival.next_gap {
            clock.schedule(gap, Action::Spawn);
        }

        let id = ProcessId(self.processes.len() as u64);
        let now = clock.now();
        // an unsatisfiable demand is rejected before the process is registered
        if arrival.demand.ram > self.ram.capacity() {
            return Err(SimError::InvalidDemand {
                process: id,
                requested: arrival.demand.ram,
                capacity: self.ram.capacity(),
            });
        }
        debug!(
            "t={now} {id} arrives, ram {} instructions {}",
            arrival.demand.ram, arrival.demand.instructions
        );
        self.processes.push(Process::new(id, arrival.demand, now));
        self.live += 1;

        self.request_ram(clock, id)
    }

    fn request_ram(&mut self, clock: &mut Clock<Action>, id: ProcessId) -> Result<(), SimError> {
        let process = &mut self.processes[id.0 as usize];
        process.await_ram();
        let amount = process.demand().ram;

        match self.ram.acquire(id, amount)? {
            Acquire::Granted(grant) => {
                process.grant_ram(grant, clock.now());
                self.note_ram(clock.now());
                self.request_cpu(clock, id)
            }
            Acquire::Queued => {
                debug!("t={} {id} waits for {amount} ram", clock.now());
                Ok(())
            }
        }
    }

    fn request_cpu(&mut self, clock: &mut Clock<Action>, id: ProcessId) -> Result<(), SimError> {
        match self.cpu.acquire(id, 1)? {
            Acquire::Granted(grant) => {
                self.process(id).hold_cpu(grant);
                self.start_slice(clock, id);
            }
            Acquire::Queued => trace!("t={} {id} queued for cpu", clock.now()),
        }
        Ok(())
    }

    fn resume(&mut self, clock: &mut Clock<Action>, id: ProcessId) -> Result<(), SimError> {
        let process = &self.processes[id.0 as usize];
        let (phase, has_cpu, has_ram) = (process.phase(), process.has_cpu(), process.has_ram());
        match phase {
            // handed a cpu slot by a release
            Phase::AwaitingCpu if has_cpu => {
                self.start_slice(clock, id);
                Ok(())
            }
            // handed ram by a release; now queue for the cpu
            Phase::AwaitingCpu if has_ram => self.request_cpu(clock, id),
            phase => unreachable!("{id} resumed in phase {phase:?}"),
        }
    }

    fn start_slice(&mut self, clock: &mut Clock<Action>, id: ProcessId) {
        let process = &mut self.processes[id.0 as usize];
        let (consumed, duration) = self.cpu.slice(process.remaining());
        process.begin_slice(consumed);

        self.executing += 1;
        self.peak_executing = self.peak_executing.max(self.executing);
        assert!(
            self.executing as u64 <= self.cpu.capacity(),
            "{} processes executing on {} slots",
            self.executing,
            self.cpu.capacity()
        );

        trace!("t={} {id} runs {consumed} instructions for {duration}", clock.now());
        clock.schedule(duration, Action::SliceComplete(id));
    }

    fn slice_complete(&mut self, clock: &mut Clock<Action>, id: ProcessId) -> Result<(), SimError> {
        let now = clock.now();
        let process = &mut self.processes[id.0 as usize];
        let cpu_grant = process.end_slice();
        let done = process.remaining() == 0.0;
        if !done {
            process.await_cpu();
        }
        self.executing -= 1;

        // yield the slot so queued processes interleave at slice granularity
        let woken = self.cpu.release(cpu_grant);
        self.wake_cpu(clock, woken);

        if !done {
            return self.request_cpu(clock, id);
        }

        let process = &mut self.processes[id.0 as usize];
        let ram_grant = process.complete(now);
        let waiting = now.as_f64() - process.arrival_time().as_f64();
        assert!(waiting >= 0.0, "{id} completed before it arrived");
        debug!("t={now} {id} completes after {waiting}");

        self.waiting_times.push(waiting);
        self.ram_trace.record(now.as_f64(), self.ram.in_use());
        self.live -= 1;

        let woken = self.ram.release(ram_grant);
        self.wake_ram(clock, woken);
        Ok(())
    }

    fn wake_cpu(&mut self, clock: &mut Clock<Action>, woken: Vec<Grant>) {
        for grant in woken {
            let id = grant.holder();
            self.process(id).hold_cpu(grant);
            clock.schedule(0.0, Action::Resume(id));
        }
    }

    fn wake_ram(&mut self, clock: &mut Clock<Action>, woken: Vec<Grant>) {
        let now = clock.now();
        for grant in woken {
            let id = grant.holder();
            debug!("t={now} {id} granted {} ram after waiting", grant.amount());
            self.process(id).grant_ram(grant, now);
            clock.schedule(0.0, Action::Resume(id));
        }
        // runs after every release, with or without waiters
        self.note_ram(now);
    }

    fn note_ram(&mut self, now: SimTime) {
        let in_use = self.ram.in_use();
        self.peak_ram_in_use = self.peak_ram_in_use.max(in_use);
        self.ram_occupancy.record(now.as_f64(), in_use);
    }
}
