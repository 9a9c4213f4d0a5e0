use fillrate_engine::bench::{pixels_per_frame, FrameStats, Metrics, REFERENCE_CLOCK_GHZ};

/// Frames kept for the rolling average in report lines.
const WINDOW: usize = 120;

/// Frames kept for the end-of-run summary.
const RUN_WINDOW: usize = 1 << 20;

/// Turns the metrics stream into console lines.
pub struct Reporter {
    pixels_per_frame: u64,
    every: u64,
    window: FrameStats,
    run: FrameStats,
    frames: u64,
}

impl Reporter {
    /// `every == 0` suppresses per-frame lines; the summary is still produced.
    pub fn new(side: u32, cycles: u32, every: u64) -> Self {
        Self {
            pixels_per_frame: pixels_per_frame(side, cycles),
            every,
            window: FrameStats::new(WINDOW),
            run: FrameStats::new(RUN_WINDOW),
            frames: 0,
        }
    }

    /// Records `m`; returns a line when one is due.
    pub fn observe(&mut self, m: &Metrics) -> Option<String> {
        self.window.record_metrics(m);
        self.run.record_metrics(m);
        self.frames += 1;

        if self.every == 0 || self.frames % self.every != 0 {
            return None;
        }
        Some(self.line(m))
    }

    pub fn line(&self, m: &Metrics) -> String {
        format!(
            "frame {:>6}: {} pixels/frame, {:.3} ms, {:.3} ps/pixel, {:.4} cycles/pixel @ {REFERENCE_CLOCK_GHZ} GHz (avg {:.3} ms, {:.1} fps)",
            m.frame_index,
            self.pixels_per_frame,
            m.delta_ms,
            m.picoseconds_per_pixel,
            m.cycles_per_pixel_at_4ghz,
            self.window.avg_ms(),
            self.window.fps(),
        )
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Whole-run summary, `None` if no frame was measured.
    pub fn summary(&self) -> Option<String> {
        let s = self.run.summary()?;
        Some(format!(
            "{} frames: avg {:.3} ms, min {:.3} ms, max {:.3} ms, p95 {:.3} ms, {:.1} fps",
            s.samples, s.avg_ms, s.min_ms, s.max_ms, s.p95_ms, s.fps
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(i: u64, ms: f64) -> Metrics {
        Metrics::compute(ms, 1024).with_frame_index(i)
    }

    #[test]
    fn reports_every_nth_frame() {
        let mut r = Reporter::new(1024, 1000, 3);
        let lines: Vec<_> = (0..7).filter_map(|i| r.observe(&sample(i, 16.0))).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("frame      2:"));
        assert!(lines[1].starts_with("frame      5:"));
        assert_eq!(r.frames(), 7);
    }

    #[test]
    fn line_carries_all_three_metrics() {
        let r = Reporter::new(1024, 1000, 1);
        let line = r.line(&sample(0, 16.0));
        assert!(line.contains("1048576000 pixels/frame"), "{line}");
        assert!(line.contains("16.000 ms"), "{line}");
        assert!(line.contains("15.259 ps/pixel"), "{line}");
        assert!(line.contains("0.0610 cycles/pixel @ 4 GHz"), "{line}");
    }

    #[test]
    fn zero_interval_only_summarizes() {
        let mut r = Reporter::new(64, 10, 0);
        assert!(r.observe(&sample(0, 10.0)).is_none());
        assert!(r.observe(&sample(1, 20.0)).is_none());

        let summary = r.summary().unwrap();
        assert!(summary.starts_with("2 frames: avg 15.000 ms"), "{summary}");
    }

    #[test]
    fn empty_run_has_no_summary() {
        assert!(Reporter::new(1024, 1000, 60).summary().is_none());
    }
}
