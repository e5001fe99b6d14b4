//! Speed accumulator driven by the two speed buttons.

use crate::frp::{Cell, StreamSink};

pub const DEFAULT_SPEED: f64 = 1.0;
pub const DEFAULT_SPEED_STEP: f64 = 0.1;

/// Speed multiplier changed by discrete clicks. No bounds are enforced.
pub struct SpeedControl {
    up: StreamSink<()>,
    down: StreamSink<()>,
    speed: Cell<f64>,
}

impl SpeedControl {
    pub fn new(initial: f64, step: f64) -> Self {
        let up = StreamSink::new();
        let down = StreamSink::new();
        // An up and a down in the same transaction resolve to the up
        let speed = up
            .stream()
            .map_to(step)
            .or_else(&down.stream().map_to(-step))
            .accum(initial, |delta: &f64, speed: &f64| speed + delta);
        SpeedControl { up, down, speed }
    }

    pub fn speed_up(&self) {
        self.up.send(());
    }

    pub fn speed_down(&self) {
        self.down.send(());
    }

    pub fn speed(&self) -> Cell<f64> {
        self.speed.clone()
    }
}

impl Default for SpeedControl {
    fn default() -> Self {
        Self::new(DEFAULT_SPEED, DEFAULT_SPEED_STEP)
    }
}
