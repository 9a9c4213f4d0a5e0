/// Reference clock used to express time per pixel as a cycle count.
pub const REFERENCE_CLOCK_GHZ: f64 = 4.0;

/// Throughput figures derived from one frame's wall-clock time.
///
/// `picoseconds_per_pixel` divides by the nominal `side × side` pixel count of
/// the render target, NOT by `side × side × cycles` fragment evaluations.
/// Divide by `cycles` for a per-fragment figure.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Metrics {
    /// Frame counter of the tick that produced this sample.
    pub frame_index: u64,
    pub delta_ms: f64,
    pub picoseconds_per_pixel: f64,
    pub cycles_per_pixel_at_4ghz: f64,
}

impl Metrics {
    /// Derives metrics for a frame of `delta_ms` on a square target of `side` pixels.
    pub fn compute(delta_ms: f64, side: u32) -> Self {
        let ppp = picoseconds_per_pixel(delta_ms, side);
        Self {
            frame_index: 0,
            delta_ms,
            picoseconds_per_pixel: ppp,
            cycles_per_pixel_at_4ghz: cycles_per_pixel(ppp, REFERENCE_CLOCK_GHZ),
        }
    }

    #[inline]
    pub fn with_frame_index(mut self, frame_index: u64) -> Self {
        self.frame_index = frame_index;
        self
    }
}

/// `delta_ms × 1e9 / (side² × 1000)`.
pub fn picoseconds_per_pixel(delta_ms: f64, side: u32) -> f64 {
    let pixels = f64::from(side) * f64::from(side);
    (delta_ms * 1e9) / (pixels * 1000.0)
}

/// `time_ps × frequency_ghz / 1000`.
#[inline]
pub fn cycles_per_pixel(picoseconds: f64, frequency_ghz: f64) -> f64 {
    picoseconds * frequency_ghz / 1000.0
}

/// Fragments shaded per frame, overdraw included. Display only.
#[inline]
pub fn pixels_per_frame(side: u32, cycles: u32) -> u64 {
    u64::from(side) * u64::from(side) * u64::from(cycles)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs().max(1.0)
    }

    #[test]
    fn sixteen_ms_at_reference_size() {
        let m = Metrics::compute(16.0, 1024);
        let expected = 16.0e9 / (1024.0 * 1024.0 * 1000.0);
        assert!(close(m.picoseconds_per_pixel, expected));
        assert!(close(m.picoseconds_per_pixel, 15.258_789_062_5));
        assert!(close(m.cycles_per_pixel_at_4ghz, expected * 0.004));
        assert_eq!(m.delta_ms, 16.0);
    }

    #[test]
    fn zero_delta_is_zero_not_fault() {
        let m = Metrics::compute(0.0, 1024);
        assert_eq!(m.picoseconds_per_pixel, 0.0);
        assert_eq!(m.cycles_per_pixel_at_4ghz, 0.0);
    }

    #[test]
    fn per_pixel_time_ignores_overdraw() {
        // Same delta on the same target gives the same figure whatever the
        // overdraw factor was; cycles never enter the formula.
        let m = Metrics::compute(8.0, 512);
        assert!(close(m.picoseconds_per_pixel, 8.0e9 / (512.0 * 512.0 * 1000.0)));
    }

    #[test]
    fn scales_inversely_with_area() {
        let small = Metrics::compute(10.0, 256);
        let large = Metrics::compute(10.0, 512);
        assert!(close(small.picoseconds_per_pixel, large.picoseconds_per_pixel * 4.0));
    }

    #[test]
    fn cycle_conversion() {
        assert!(close(cycles_per_pixel(250.0, 4.0), 1.0));
        assert!(close(cycles_per_pixel(1000.0, 3.0), 3.0));
    }

    #[test]
    fn pixels_per_frame_includes_overdraw() {
        assert_eq!(pixels_per_frame(1024, 1000), 1_048_576_000);
    }

    #[test]
    fn frame_index_is_attached() {
        assert_eq!(Metrics::compute(1.0, 1).with_frame_index(42).frame_index, 42);
    }
}
