//! Contended resources.
//!
//! Both resources hand out [`Grant`]s through the same acquire/release
//! interface. Requests that cannot be served at once wait in strict FIFO
//! order: a blocked head request blocks everything queued behind it.

use std::collections::VecDeque;

use crate::error::SimError;
use crate::process::ProcessId;

/// Units of a resource held by one process. Not `Clone`: a grant is
/// released exactly once by moving it back into its resource.
#[derive(Debug, PartialEq, Eq)]
pub struct Grant {
    holder: ProcessId,
    amount: u64,
}

impl Grant {
    fn new(holder: ProcessId, amount: u64) -> Self {
        Self { holder, amount }
    }

    pub fn holder(&self) -> ProcessId {
        self.holder
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }
}

/// Outcome of an acquire call
#[derive(Debug, PartialEq, Eq)]
pub enum Acquire {
    Granted(Grant),
    /// Parked in the wait queue; the grant is returned by a later `release`.
    Queued,
}

/// Capability shared by the RAM pool and the CPU server
pub trait Resource {
    fn capacity(&self) -> u64;

    /// Units free right now
    fn available(&self) -> u64;

    /// Requests parked in the wait queue
    fn queued(&self) -> usize;

    /// Request `amount` units for `holder`.
    ///
    /// Fails with [`SimError::InvalidDemand`] when `amount` exceeds the
    /// total capacity; such a request could never be served.
    fn acquire(&mut self, holder: ProcessId, amount: u64) -> Result<Acquire, SimError>;

    /// Return `grant`, then serve waiters from the head of the queue while
    /// the head fits. Returns the grants made to waiters, in queue order.
    fn release(&mut self, grant: Grant) -> Vec<Grant>;
}

/// Consumable memory with a fixed capacity
#[derive(Debug)]
pub struct RamPool {
    capacity: u64,
    level: u64,
    held: u64,
    waiting: VecDeque<(ProcessId, u64)>,
}

impl RamPool {
    pub fn new(capacity: u64) -> Self {
        Self {
            capacity,
            level: capacity,
            held: 0,
            waiting: VecDeque::new(),
        }
    }

    /// Free units
    pub fn level(&self) -> u64 {
        self.level
    }

    /// Units granted and not yet released
    pub fn in_use(&self) -> u64 {
        self.held
    }

    fn take(&mut self, holder: ProcessId, amount: u64) -> Grant {
        assert!(amount <= self.level, "ram level would go negative");
        self.level -= amount;
        self.held += amount;
        self.check();
        Grant::new(holder, amount)
    }

    fn check(&self) {
        assert_eq!(
            self.level + self.held,
            self.capacity,
            "ram units leaked: level {} + held {} != capacity {}",
            self.level,
            self.held,
            self.capacity
        );
    }
}

impl Resource for RamPool {
    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn available(&self) -> u64 {
        self.level
    }

    fn queued(&self) -> usize {
        self.waiting.len()
    }

    fn acquire(&mut self, holder: ProcessId, amount: u64) -> Result<Acquire, SimError> {
        if amount > self.capacity {
            return Err(SimError::InvalidDemand {
                process: holder,
                requested: amount,
                capacity: self.capacity,
            });
        }

        if self.waiting.is_empty() && amount <= self.level {
            return Ok(Acquire::Granted(self.take(holder, amount)));
        }
        self.waiting.push_back((holder, amount));
        Ok(Acquire::Queued)
    }

    fn release(&mut self, grant: Grant) -> Vec<Grant> {
        assert!(grant.amount <= self.held, "released more ram than was granted");
        self.held -= grant.amount;
        self.level += grant.amount;
        self.check();

        let mut woken = Vec::new();
        while let Some(&(holder, amount)) = self.waiting.front() {
            if amount > self.level {
                break;
            }
            self.waiting.pop_front();
            woken.push(self.take(holder, amount));
        }
        woken
    }
}

/// Processor with `slots` identical execution units and a fixed speed
#[derive(Debug)]
pub struct CpuServer {
    speed: f64,
    slots: u64,
    running: Vec<ProcessId>,
    waiting: VecDeque<ProcessId>,
}

impl CpuServer {
    pub fn new(speed: f64, slots: u64) -> Self {
        assert!(speed.is_finite() && speed > 0.0, "cpu speed must be positive");
        Self {
            speed,
            slots,
            running: Vec::new(),
            waiting: VecDeque::new(),
        }
    }

    /// Instructions per unit of simulated time
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Processes currently holding a slot
    pub fn running(&self) -> &[ProcessId] {
        &self.running
    }

    /// Instructions and duration of the next slice for a process with
    /// `remaining` instructions. The final slice consumes exactly what is
    /// left, in proportionally less time.
    pub fn slice(&self, remaining: f64) -> (f64, f64) {
        assert!(remaining > 0.0, "slice requested with {remaining} instructions left");
        let consumed = remaining.min(self.speed);
        (consumed, consumed / self.speed)
    }

    fn seat(&mut self, holder: ProcessId) -> Grant {
        assert!(
            (self.running.len() as u64) < self.slots,
            "cpu slot granted beyond {} slots",
            self.slots
        );
        debug_assert!(!self.running.contains(&holder), "process {holder} already on cpu");
        self.running.push(holder);
        Grant::new(holder, 1)
    }
}

impl Resource for CpuServer {
    fn capacity(&self) -> u64 {
        self.slots
    }

    fn available(&self) -> u64 {
        self.slots - self.running.len() as u64
    }

    fn queued(&self) -> usize {
        self.waiting.len()
    }

    /// Each grant occupies one slot. A demand larger than the slot count is
    /// rejected.
    fn acquire(&mut self, holder: ProcessId, amount: u64) -> Result<Acquire, SimError> {
        if amount > self.slots {
            return Err(SimError::InvalidDemand {
                process: holder,
                requested: amount,
                capacity: self.slots,
            });
        }

        if self.waiting.is_empty() && self.available() > 0 {
            return Ok(Acquire::Granted(self.seat(holder)));
        }
        self.waiting.push_back(holder);
        Ok(Acquire::Queued)
    }

    fn release(&mut self, grant: Grant) -> Vec<Grant> {
        let pos = self
            .running
            .iter()
            .position(|&p| p == grant.holder)
            .unwrap_or_else(|| panic!("process {} released a cpu slot it does not hold", grant.holder));
        self.running.swap_remove(pos);

        let mut woken = Vec::new();
        while self.available() > 0 {
            let Some(holder) = self.waiting.pop_front() else {
                break;
            };
            woken.push(self.seat(holder));
        }
        woken
    }
}
