//! Simulated clock and pending-event queue.
//!
//! Single-threaded and cooperative: one action runs at a time, and an action
//! may schedule further actions on the clock it is handed. Events at equal
//! times dispatch in scheduling order.

use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::fmt;
use std::ops::Add;

/// Simulated time (non-negative, finite)
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    pub fn new(t: f64) -> Self {
        assert!(t.is_finite() && t >= 0.0, "invalid simulated time {t}");
        Self(t)
    }

    pub fn as_f64(self) -> f64 {
        self.0
    }
}

impl Eq for SimTime {}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl Add<f64> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: f64) -> SimTime {
        SimTime::new(self.0 + rhs)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}", self.0)
    }
}

/// Pending event; `seq` breaks ties in scheduling order
#[derive(Debug)]
struct Scheduled<A> {
    time: SimTime,
    seq: u64,
    action: A,
}

impl<A> PartialEq for Scheduled<A> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl<A> Eq for Scheduled<A> {}

impl<A> PartialOrd for Scheduled<A> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<A> Ord for Scheduled<A> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time
            .cmp(&other.time)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Event clock
#[derive(Debug)]
pub struct Clock<A> {
    now: SimTime,
    next_seq: u64,
    dispatched: u64,
    pending: BinaryHeap<Reverse<Scheduled<A>>>,
}

impl<A> Clock<A> {
    pub fn new() -> Self {
        Self {
            now: SimTime::ZERO,
            next_seq: 0,
            dispatched: 0,
            pending: BinaryHeap::new(),
        }
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of events dispatched so far
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Enqueue `action` at `now + delay`.
    ///
    /// # Panics
    /// If `delay` is negative or not finite.
    pub fn schedule(&mut self, delay: f64, action: A) {
        assert!(
            delay.is_finite() && delay >= 0.0,
            "cannot schedule at delay {delay}"
        );
        let time = self.now + delay;
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Reverse(Scheduled { time, seq, action }));
    }

    /// Pop the earliest event, advancing `now` to its time. Returns `None`
    /// when the queue is empty or the next event lies beyond `horizon`.
    pub fn advance(&mut self, horizon: Option<SimTime>) -> Option<A> {
        let Reverse(next) = self.pending.peek()?;
        if horizon.is_some_and(|h| next.time > h) {
            return None;
        }

        let Reverse(event) = self.pending.pop()?;
        assert!(
            event.time >= self.now,
            "event at {} dispatched after clock reached {}",
            event.time,
            self.now
        );
        self.now = event.time;
        self.dispatched += 1;
        Some(event.action)
    }

    /// Dispatch events to `handler` until the queue drains or the next event
    /// lies beyond `horizon`. Stops at the first handler error.
    pub fn run_until<E>(
        &mut self,
        horizon: Option<SimTime>,
        mut handler: impl FnMut(&mut Self, A) -> Result<(), E>,
    ) -> Result<(), E> {
        while let Some(action) = self.advance(horizon) {
            handler(self, action)?;
        }
        Ok(())
    }
}

impl<A> Default for Clock<A> {
    fn default() -> Self {
        Self::new()
    }
}
