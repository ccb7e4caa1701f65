//! Simulated processes and their lifecycle.
//!
//! ```text
//! Created -> AwaitingRam -> AwaitingCpu <-> Executing -> Completed
//! ```
//!
//! A process never goes back to an earlier phase except the
//! `Executing -> AwaitingCpu` hop between slices.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::clock::SimTime;
use crate::resource::Grant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessId(pub u64);

impl fmt::Display for ProcessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// What a process asks for, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Demand {
    pub ram: u64,
    pub instructions: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Created,
    AwaitingRam,
    AwaitingCpu,
    Executing,
    Completed,
}

impl Phase {
    fn can_enter(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Created, AwaitingRam)
                | (AwaitingRam, AwaitingCpu)
                | (AwaitingCpu, Executing)
                | (Executing, AwaitingCpu)
                | (Executing, Completed)
        )
    }
}

/// Live process state owned by the engine
#[derive(Debug)]
pub struct Process {
    id: ProcessId,
    demand: Demand,
    arrival_time: SimTime,
    phase: Phase,
    remaining: f64,
    /// Instructions being consumed by the slice in flight
    in_flight: f64,
    slices: u32,
    ram: Option<Grant>,
    cpu: Option<Grant>,
    ram_granted_at: Option<SimTime>,
    end_time: Option<SimTime>,
}

impl Process {
    pub fn new(id: ProcessId, demand: Demand, arrival_time: SimTime) -> Self {
        Self {
            id,
            demand,
            arrival_time,
            phase: Phase::Created,
            remaining: demand.instructions as f64,
            in_flight: 0.0,
            slices: 0,
            ram: None,
            cpu: None,
            ram_granted_at: None,
            end_time: None,
        }
    }

    pub fn id(&self) -> ProcessId {
        self.id
    }

    pub fn demand(&self) -> Demand {
        self.demand
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn remaining(&self) -> f64 {
        self.remaining
    }

    pub fn arrival_time(&self) -> SimTime {
        self.arrival_time
    }

    pub fn end_time(&self) -> Option<SimTime> {
        self.end_time
    }

    fn enter(&mut self, next: Phase) {
        assert!(
            self.phase.can_enter(next),
            "process {} cannot move from {:?} to {:?}",
            self.id,
            self.phase,
            next
        );
        self.phase = next;
    }

    pub(crate) fn await_ram(&mut self) {
        self.enter(Phase::AwaitingRam);
    }

    pub(crate) fn grant_ram(&mut self, grant: Grant, now: SimTime) {
        debug_assert_eq!(grant.holder(), self.id);
        self.ram = Some(grant);
        self.ram_granted_at = Some(now);
        self.enter(Phase::AwaitingCpu);
    }

    /// RAM units currently held
    pub fn ram_held(&self) -> u64 {
        self.ram.as_ref().map_or(0, Grant::amount)
    }

    pub(crate) fn has_ram(&self) -> bool {
        self.ram.is_some()
    }

    pub(crate) fn has_cpu(&self) -> bool {
        self.cpu.is_some()
    }

    /// Park a cpu grant handed over by a release; the slice starts on resume.
    pub(crate) fn hold_cpu(&mut self, grant: Grant) {
        debug_assert_eq!(grant.holder(), self.id);
        assert!(self.cpu.is_none(), "process {} holds two cpu slots", self.id);
        self.cpu = Some(grant);
    }

    /// Start a slice consuming `consumed` instructions. The cpu grant must
    /// already be held.
    pub(crate) fn begin_slice(&mut self, consumed: f64) {
        assert!(self.cpu.is_some(), "process {} executing without cpu", self.id);
        assert!(
            consumed > 0.0 && consumed <= self.remaining,
            "slice of {consumed} with {} instructions left",
            self.remaining
        );
        self.enter(Phase::Executing);
        self.in_flight = consumed;
        self.slices += 1;
    }

    /// Finish the slice in flight and hand back the cpu grant. Remaining
    /// instructions reach exactly zero on the final slice.
    pub(crate) fn end_slice(&mut self) -> Grant {
        assert_eq!(self.phase, Phase::Executing);
        self.remaining = if self.in_flight >= self.remaining {
            0.0
        } else {
            self.remaining - self.in_flight
        };
        self.in_flight = 0.0;

        match self.cpu.take() {
            Some(grant) => grant,
            None => unreachable!("process {} ended a slice without cpu", self.id),
        }
    }

    pub(crate) fn await_cpu(&mut self) {
        assert!(self.remaining > 0.0);
        self.enter(Phase::AwaitingCpu);
    }

    /// Mark completion and hand back the ram grant.
    pub(crate) fn complete(&mut self, now: SimTime) -> Grant {
        assert_eq!(self.remaining, 0.0, "process {} completed with work left", self.id);
        self.enter(Phase::Completed);
        self.end_time = Some(now);

        match self.ram.take() {
            Some(grant) => grant,
            None => unreachable!("process {} completed without ram", self.id),
        }
    }

    pub fn record(&self) -> Option<ProcessRecord> {
        let end_time = self.end_time?;
        Some(ProcessRecord {
            id: self.id,
            arrival_time: self.arrival_time.as_f64(),
            ram_granted_at: self.ram_granted_at?.as_f64(),
            end_time: end_time.as_f64(),
            ram_demand: self.demand.ram,
            instructions: self.demand.instructions,
            slices: self.slices,
        })
    }
}

/// Completed process, as reported in run results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub id: ProcessId,
    pub arrival_time: f64,
    pub ram_granted_at: f64,
    pub end_time: f64,
    pub ram_demand: u64,
    pub instructions: u64,
    pub slices: u32,
}

impl ProcessRecord {
    /// Arrival to completion (turnaround)
    pub fn waiting_time(&self) -> f64 {
        self.end_time - self.arrival_time
    }
}
