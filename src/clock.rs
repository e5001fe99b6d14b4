//! Frame driver: turns a wall clock into a reactive time cell.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use crate::frp::{Cell, CellSink};

/// Source of wall-clock time in milliseconds
pub trait Clock {
    fn now_ms(&self) -> f64;
}

/// Monotonic clock, measured from construction
pub struct SystemClock {
    reference: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        SystemClock {
            reference: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.reference.elapsed().as_secs_f64() * 1000.0
    }
}

/// Clock advanced by hand. Clones share the same time.
#[derive(Clone, Default)]
pub struct ManualClock {
    now: Rc<RefCell<f64>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward. Negative amounts are ignored to keep the
    /// clock monotonic.
    pub fn advance(&self, ms: f64) {
        if ms > 0.0 {
            *self.now.borrow_mut() += ms;
        }
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        *self.now.borrow()
    }
}

/// Owns the wall-clock cell that drives the animation
pub struct TimerSystem<C: Clock> {
    clock: C,
    time: CellSink<f64>,
    last_sample: f64,
}

impl<C: Clock> TimerSystem<C> {
    pub fn new(clock: C) -> Self {
        let start = clock.now_ms();
        TimerSystem {
            clock,
            time: CellSink::new(start),
            last_sample: start,
        }
    }

    /// Wall-clock time as of the last [`TimerSystem::sample`]
    pub fn time(&self) -> Cell<f64> {
        self.time.cell()
    }

    /// Pushes one clock reading into the time cell. Called once per frame.
    ///
    /// Readings that would move time backwards are clamped.
    pub fn sample(&mut self) -> f64 {
        let now = self.clock.now_ms().max(self.last_sample);
        self.last_sample = now;
        self.time.send(now);
        now
    }
}
