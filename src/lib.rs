//! Orbit: an orbiting circle and a spinning earth, animated from a reactive
//! scene clock whose rate is controlled by two buttons.

pub mod app;
pub mod cli;
pub mod clock;
pub mod error;
pub mod frp;
pub mod graphics;
pub mod integrator;
pub mod logging;
pub mod math;
pub mod model;
pub mod scene;
pub mod speed;
pub mod state;
pub mod vec2;
pub mod widget;
