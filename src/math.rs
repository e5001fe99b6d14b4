use std::f64::consts::PI;

use crate::vec2::Vec2;

/// Radius of the circle the orbiting body travels on
pub const ORBIT_RADIUS: f64 = 100.0;
/// Scene time for one full orbit and one full spin, in milliseconds
pub const PERIOD_MS: f64 = 1000.0;

/// Position on the orbit at scene time `t`
pub fn orbit_position(t: f64) -> Vec2 {
    let angle = t * 2.0 * PI / PERIOD_MS;
    Vec2::new(angle.sin(), angle.cos()) * ORBIT_RADIUS
}

/// Radius of the orbiting body, pulsing within [15, 35]
pub fn pulse_radius(t: f64) -> f64 {
    25.0 + 10.0 * (t / 100.0).sin()
}

/// Spin of the earth image in degrees, within [0, 360)
pub fn spin_degrees(t: f64) -> f64 {
    let degrees = (t * 360.0 / PERIOD_MS).rem_euclid(360.0);
    // rem_euclid can round up to the modulus for tiny negative inputs
    if degrees >= 360.0 {
        0.0
    } else {
        degrees
    }
}

/// Rotates `point` around `center` by `degrees`, clockwise on a y-down screen
pub fn rotate_about(point: Vec2, center: Vec2, degrees: f64) -> Vec2 {
    let (sin_a, cos_a) = degrees.to_radians().sin_cos();
    let dx = point.x - center.x;
    let dy = point.y - center.y;
    Vec2::new(
        center.x + dx * cos_a - dy * sin_a,
        center.y + dx * sin_a + dy * cos_a,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn orbit_starts_at_the_bottom_and_quarters_clockwise() {
        assert_eq!(orbit_position(0.0), Vec2::new(0.0, 100.0));
        let quarter = orbit_position(250.0);
        assert!((quarter.x - 100.0).abs() < 1e-9);
        assert!(quarter.y.abs() < 1e-9);
    }

    #[test]
    fn spin_wraps_each_period() {
        assert_eq!(spin_degrees(0.0), 0.0);
        assert_eq!(spin_degrees(500.0), 180.0);
        assert_eq!(spin_degrees(1000.0), 0.0);
        assert_eq!(spin_degrees(-250.0), 270.0);
    }

    #[test]
    fn rotation_keeps_distance_to_center() {
        let center = Vec2::new(1.0, 1.0);
        let rotated = rotate_about(Vec2::new(2.0, 1.0), center, 90.0);
        assert!((rotated.x - 1.0).abs() < 1e-12);
        assert!((rotated.y - 2.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn position_stays_on_the_orbit(t in -1.0e7f64..1.0e7) {
            prop_assert!((orbit_position(t).length() - ORBIT_RADIUS).abs() < 1e-6);
        }

        #[test]
        fn radius_stays_within_bounds(t in -1.0e7f64..1.0e7) {
            let r = pulse_radius(t);
            prop_assert!((15.0..=35.0).contains(&r));
        }

        #[test]
        fn spin_stays_within_a_turn(t in -1.0e12f64..1.0e12) {
            let degrees = spin_degrees(t);
            prop_assert!((0.0..360.0).contains(&degrees), "{} -> {}", t, degrees);
        }
    }
}
