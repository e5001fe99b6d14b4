//! Integrates wall-clock time scaled by the speed multiplier into scene time.

use crate::frp::{Cell, CellLoop, Transaction};

/// Returns scene time `t0 + (clock - clock0) * speed`.
///
/// `(clock0, t0)` is the `(clock, time)` pair sampled when speed last
/// changed, so scene time is continuous across speed changes. The current
/// speed is also captured once at construction, which anchors scene time to
/// the clock value at that moment.
pub fn integrate(clock: &Cell<f64>, speed: &Cell<f64>) -> Cell<f64> {
    Transaction::run(|| {
        let time_loop = CellLoop::new();
        let anchor_source =
            clock.lift(&time_loop.cell(), |clock: &f64, time: &f64| (*clock, *time));
        let anchor = speed.value().snapshot1(&anchor_source).hold((0.0, 0.0));
        let time = clock.lift3(
            &anchor,
            speed,
            |clock: &f64, &(clock0, time0): &(f64, f64), speed: &f64| {
                time0 + (clock - clock0) * speed
            },
        );
        time_loop.bind(&time);
        time
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{ManualClock, TimerSystem};
    use crate::speed::SpeedControl;
    use proptest::prelude::*;

    struct Rig {
        clock: ManualClock,
        timer: TimerSystem<ManualClock>,
        control: SpeedControl,
        time: Cell<f64>,
    }

    fn rig() -> Rig {
        let clock = ManualClock::new();
        let timer = TimerSystem::new(clock.clone());
        let control = SpeedControl::default();
        let time = integrate(&timer.time(), &control.speed());
        Rig {
            clock,
            timer,
            control,
            time,
        }
    }

    impl Rig {
        fn frame(&mut self, ms: f64) -> f64 {
            self.clock.advance(ms);
            self.timer.sample();
            self.time.sample()
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    #[test]
    fn runs_at_wall_clock_rate_by_default() {
        let mut rig = rig();
        assert_eq!(rig.time.sample(), 0.0);
        assert!(close(rig.frame(500.0), 500.0));
    }

    #[test]
    fn speed_scales_only_time_after_the_change() {
        let mut rig = rig();
        rig.frame(1000.0);
        for _ in 0..10 {
            rig.control.speed_up();
        }
        assert!(close(rig.time.sample(), 1000.0));
        assert!(close(rig.frame(1000.0), 3000.0));
    }

    #[test]
    fn zero_speed_freezes_and_negative_speed_rewinds() {
        let mut rig = rig();
        rig.frame(100.0);
        for _ in 0..10 {
            rig.control.speed_down();
        }
        assert!(close(rig.frame(100.0), 100.0));
        rig.control.speed_down();
        assert!(close(rig.frame(100.0), 90.0));
    }

    #[test]
    fn listeners_see_continuous_time() {
        let mut rig = rig();
        let seen = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let s = seen.clone();
        let _listener = rig.time.listen(move |t: &f64| s.borrow_mut().push(*t));

        rig.frame(200.0);
        rig.control.speed_up();
        rig.frame(100.0);

        let seen = seen.borrow();
        assert_eq!(seen.len(), 4);
        assert!(close(seen[1], 200.0));
        assert!(close(seen[2], 200.0));
        assert!(close(seen[3], 310.0));
    }

    proptest! {
        #[test]
        fn speed_changes_never_make_time_jump(
            steps in prop::collection::vec((0.0f64..50.0, -2i32..3), 1..60)
        ) {
            let mut rig = rig();
            for (ms, clicks) in steps {
                rig.frame(ms);
                let before = rig.time.sample();
                for _ in 0..clicks.max(0) {
                    rig.control.speed_up();
                }
                for _ in 0..(-clicks).max(0) {
                    rig.control.speed_down();
                }
                prop_assert!((rig.time.sample() - before).abs() < 1e-6);
            }
        }
    }
}
