//! Frame clock fed by the host's monotonic time source

use serde::Serialize;

/// Longest frame step the animation will integrate in one tick (seconds)
pub const MAX_FRAME_DELTA: f64 = 0.25;

/// Elapsed and delta time for one tick, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FrameTime {
    pub elapsed: f32,
    pub delta: f32,
}

/// Start and last-tick timestamps, in seconds
#[derive(Debug, Clone, Copy)]
pub struct FrameClock {
    start: f64,
    last: f64,
}

impl FrameClock {
    pub fn new(now: f64) -> Self {
        Self {
            start: now,
            last: now,
        }
    }

    /// Read the clock once for a tick.
    ///
    /// A timestamp earlier than the previous one yields a zero delta; a long
    /// gap (backgrounded tab) is capped at [`MAX_FRAME_DELTA`].
    pub fn tick(&mut self, now: f64) -> FrameTime {
        let delta = (now - self.last).clamp(0.0, MAX_FRAME_DELTA);
        self.last = self.last.max(now);
        FrameTime {
            elapsed: (now - self.start).max(0.0) as f32,
            delta: delta as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_has_zero_delta() {
        let mut clock = FrameClock::new(12.0);
        let t = clock.tick(12.0);
        assert_eq!(t.elapsed, 0.0);
        assert_eq!(t.delta, 0.0);
    }

    #[test]
    fn ticks_accumulate_elapsed() {
        let mut clock = FrameClock::new(1.0);
        clock.tick(1.016);
        let t = clock.tick(1.032);
        assert!((t.elapsed - 0.032).abs() < 1e-6);
        assert!((t.delta - 0.016).abs() < 1e-6);
    }

    #[test]
    fn long_gap_is_capped() {
        let mut clock = FrameClock::new(0.0);
        let t = clock.tick(30.0);
        assert_eq!(t.elapsed, 30.0);
        assert_eq!(t.delta, MAX_FRAME_DELTA as f32);
    }

    #[test]
    fn backwards_time_never_goes_negative() {
        let mut clock = FrameClock::new(5.0);
        clock.tick(6.0);
        let t = clock.tick(5.5);
        assert_eq!(t.delta, 0.0);
        assert!(t.elapsed >= 0.0);
    }
}
