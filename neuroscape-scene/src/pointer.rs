//! Pointer smoothing
//!
//! Raw pointer samples arrive asynchronously; smoothed values chase them by a
//! fixed fraction of the remaining distance once per animation tick. The
//! cursor glow and the parallax camera each keep their own lagged copy.

use serde::Serialize;

/// Move `current` toward `target` by `rate` of the remaining distance.
///
/// For `rate` in (0, 1] the result lies between `current` and `target`.
pub fn ease(current: f32, target: f32, rate: f32) -> f32 {
    current + (target - current) * rate
}

/// Map client coordinates onto [-1, 1] across the viewport
pub fn normalize(client_x: f32, client_y: f32, width: f32, height: f32) -> (f32, f32) {
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0);
    }
    ((client_x / width - 0.5) * 2.0, (client_y / height - 0.5) * 2.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PointerState {
    pub raw_x: f32,
    pub raw_y: f32,
    pub smoothed_x: f32,
    pub smoothed_y: f32,
}

/// Lagged follower of one raw pointer signal
#[derive(Debug, Clone)]
pub struct PointerSmoother {
    state: PointerState,
    rate: f32,
}

impl PointerSmoother {
    pub fn new(rate: f32) -> Self {
        Self {
            state: PointerState::default(),
            rate,
        }
    }

    /// Record the latest raw sample (pointer-move handler)
    pub fn set_raw(&mut self, x: f32, y: f32) {
        self.state.raw_x = x;
        self.state.raw_y = y;
    }

    /// One animation tick; returns the smoothed position
    pub fn tick(&mut self) -> (f32, f32) {
        let s = &mut self.state;
        s.smoothed_x = ease(s.smoothed_x, s.raw_x, self.rate);
        s.smoothed_y = ease(s.smoothed_y, s.raw_y, self.rate);
        (s.smoothed_x, s.smoothed_y)
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn raw(&self) -> (f32, f32) {
        (self.state.raw_x, self.state.raw_y)
    }

    pub fn smoothed(&self) -> (f32, f32) {
        (self.state.smoothed_x, self.state.smoothed_y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_covers_ten_percent() {
        let mut smoother = PointerSmoother::new(0.1);
        smoother.set_raw(100.0, -50.0);
        let (x, y) = smoother.tick();
        assert!((x - 10.0).abs() < 1e-5);
        assert!((y + 5.0).abs() < 1e-5);
    }

    #[test]
    fn converges_monotonically_without_overshoot() {
        let mut smoother = PointerSmoother::new(0.1);
        smoother.set_raw(640.0, 360.0);

        let mut previous = smoother.smoothed();
        for _ in 0..200 {
            let (x, y) = smoother.tick();
            assert!(x >= previous.0 && x <= 640.0);
            assert!(y >= previous.1 && y <= 360.0);
            previous = (x, y);
        }
        assert!((previous.0 - 640.0).abs() < 0.01);
        assert!((previous.1 - 360.0).abs() < 0.01);
    }

    #[test]
    fn converges_from_above_as_well() {
        let mut smoother = PointerSmoother::new(0.05);
        smoother.set_raw(10.0, 10.0);
        for _ in 0..500 {
            smoother.tick();
        }
        smoother.set_raw(-3.0, -3.0);
        let mut previous = smoother.smoothed().0;
        for _ in 0..300 {
            let (x, _) = smoother.tick();
            assert!(x <= previous && x >= -3.0);
            previous = x;
        }
    }

    #[test]
    fn full_rate_jumps_straight_to_target() {
        let mut smoother = PointerSmoother::new(1.0);
        smoother.set_raw(4.0, 2.0);
        assert_eq!(smoother.tick(), (4.0, 2.0));
    }

    #[test]
    fn normalize_maps_viewport_corners() {
        assert_eq!(normalize(0.0, 0.0, 800.0, 600.0), (-1.0, -1.0));
        assert_eq!(normalize(400.0, 300.0, 800.0, 600.0), (0.0, 0.0));
        assert_eq!(normalize(800.0, 600.0, 800.0, 600.0), (1.0, 1.0));
        assert_eq!(normalize(5.0, 5.0, 0.0, 600.0), (0.0, 0.0));
    }
}
