use std::ops::{Div, Mul};

/// Immutable 2D vector
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Vec2 { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;

    fn mul(self, a: f64) -> Vec2 {
        Vec2::new(self.x * a, self.y * a)
    }
}

impl Div<f64> for Vec2 {
    type Output = Vec2;

    fn div(self, a: f64) -> Vec2 {
        Vec2::new(self.x / a, self.y / a)
    }
}
