//! Wires the frame driver, speed accumulator, time integrator and scene
//! into one reactive graph.

use log::info;

use crate::clock::{Clock, TimerSystem};
use crate::frp::{Cell, Listener, Transaction};
use crate::integrator::integrate;
use crate::scene::Scene;
use crate::speed::SpeedControl;

/// Parameters for building an [`OrbitModel`]
#[derive(Clone, Debug, PartialEq)]
pub struct ModelConfig {
    pub initial_speed: f64,
    pub speed_step: f64,
    pub image: String,
}

pub struct OrbitModel<C: Clock> {
    timer: TimerSystem<C>,
    speed: SpeedControl,
    time: Cell<f64>,
    scene: Scene,
    _speed_log: Listener,
}

impl<C: Clock> OrbitModel<C> {
    pub fn new(clock: C, config: &ModelConfig) -> Self {
        let timer = TimerSystem::new(clock);
        Transaction::run(|| {
            let speed = SpeedControl::new(config.initial_speed, config.speed_step);
            let time = integrate(&timer.time(), &speed.speed());
            let scene = Scene::build(&time, &config.image);
            let speed_log = speed
                .speed()
                .updates()
                .listen(|speed: &f64| info!("speed set to {:.1}", speed));
            OrbitModel {
                timer,
                speed,
                time,
                scene,
                _speed_log: speed_log,
            }
        })
    }

    /// Samples the clock once; every derived cell follows.
    pub fn tick(&mut self) -> f64 {
        self.timer.sample()
    }

    pub fn speed_up(&self) {
        self.speed.speed_up();
    }

    pub fn speed_down(&self) {
        self.speed.speed_down();
    }

    pub fn speed(&self) -> f64 {
        self.speed.speed().sample()
    }

    /// Scene time in milliseconds
    pub fn scene_time(&self) -> f64 {
        self.time.sample()
    }

    /// Wall-clock time of the last tick in milliseconds
    pub fn wall_time(&self) -> f64 {
        self.timer.time().sample()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }
}
