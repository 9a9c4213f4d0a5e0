use std::time::Instant;

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTiming {
    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Wall-clock milliseconds since the previous tick.
    pub delta_ms: f64,

    /// Monotonic frame counter, starting at 0.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTiming` snapshots.
///
/// Unlike an animation clock, deltas are reported raw: no clamping, no
/// smoothing. A stall shows up as a long frame, which is what a benchmark
/// must see.
#[derive(Debug, Clone)]
pub struct FrameClock {
    last: Instant,
    frame_index: u64,
}

impl FrameClock {
    /// Creates a clock whose first delta is measured from `start`.
    pub fn starting_at(start: Instant) -> Self {
        Self {
            last: start,
            frame_index: 0,
        }
    }

    /// Advances the clock to `now`.
    ///
    /// A `now` earlier than the previous tick yields a zero delta.
    pub fn tick_at(&mut self, now: Instant) -> FrameTiming {
        let dt = now.saturating_duration_since(self.last);
        self.last = now;

        let timing = FrameTiming {
            now,
            delta_ms: dt.as_nanos() as f64 / 1_000_000.0,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);
        timing
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn delta_is_measured_from_previous_tick() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);

        let a = clock.tick_at(t0 + Duration::from_millis(16));
        let b = clock.tick_at(t0 + Duration::from_millis(40));

        assert_eq!(a.delta_ms, 16.0);
        assert_eq!(b.delta_ms, 24.0);
        assert_eq!(b.now, t0 + Duration::from_millis(40));
    }

    #[test]
    fn frame_index_counts_from_zero() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        assert_eq!(clock.tick_at(t0).frame_index, 0);
        assert_eq!(clock.tick_at(t0).frame_index, 1);
        assert_eq!(clock.frame_index(), 2);
    }

    #[test]
    fn long_stalls_are_not_clamped() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0);
        let ft = clock.tick_at(t0 + Duration::from_secs(3));
        assert_eq!(ft.delta_ms, 3000.0);
    }

    #[test]
    fn backwards_time_saturates_to_zero() {
        let t0 = Instant::now();
        let mut clock = FrameClock::starting_at(t0 + Duration::from_millis(5));
        assert_eq!(clock.tick_at(t0).delta_ms, 0.0);
    }
}
