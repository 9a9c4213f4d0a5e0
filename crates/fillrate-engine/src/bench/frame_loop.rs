use std::time::Instant;

use crate::render::RenderOutcome;
use crate::time::{FrameClock, FrameTiming};

use super::Metrics;

// ── seams ─────────────────────────────────────────────────────────────────

/// Frame-scheduling primitive supplied by the host (e.g. a redraw request).
pub trait FrameScheduler {
    /// Asks for one more tick after the current one.
    fn request_frame(&mut self);
}

/// Issues one render of the overdraw batch.
pub trait FrameRenderer {
    fn render(&mut self) -> RenderOutcome;
}

/// Receives one `Metrics` value per measured frame.
pub trait MetricsObserver {
    fn publish(&mut self, metrics: &Metrics);
}

impl<F> MetricsObserver for F
where
    F: FnMut(&Metrics),
{
    fn publish(&mut self, metrics: &Metrics) {
        self(metrics)
    }
}

/// Publishes to several observers in registration order.
#[derive(Default)]
pub struct Fanout {
    observers: Vec<Box<dyn MetricsObserver>>,
}

impl Fanout {
    pub fn push(&mut self, observer: impl MetricsObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn len(&self) -> usize {
        self.observers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl MetricsObserver for Fanout {
    fn publish(&mut self, metrics: &Metrics) {
        for observer in &mut self.observers {
            observer.publish(metrics);
        }
    }
}

// ── loop ──────────────────────────────────────────────────────────────────

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum LoopState {
    /// Waiting for the source texture.
    Idle,
    /// Rescheduling itself every tick.
    Running,
    /// Stopped by request or by a fatal render error. Terminal.
    Stopped,
}

/// What a single `tick` did.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum TickOutcome {
    /// The texture has not arrived; nothing was scheduled or rendered.
    NotStarted,
    /// A frame was rendered and measured.
    Measured(Metrics),
    /// The next tick was scheduled but this frame was not presented.
    Skipped,
    /// The loop is stopped.
    Stopped,
}

/// Benchmark frame driver.
///
/// Each running tick performs, in order:
/// 1. schedule the next tick
/// 2. render once
/// 3. read `now()` and measure the time since the previous tick
/// 4. derive and publish metrics
///
/// The timestamp is read after the render returns, so a frame's delta
/// includes its own render.
/// The first measured delta is taken against the moment the loop started
/// running, not against process start.
#[derive(Debug)]
pub struct FrameLoop {
    state: LoopState,
    clock: Option<FrameClock>,
    target_side: u32,
}

impl FrameLoop {
    pub fn new(target_side: u32) -> Self {
        Self {
            state: LoopState::Idle,
            clock: None,
            target_side,
        }
    }

    #[inline]
    pub fn state(&self) -> LoopState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Idle → Running. Returns `true` only for the call that made the transition.
    pub fn on_texture_ready(&mut self, now: Instant) -> bool {
        if self.state != LoopState::Idle {
            log::debug!("texture-ready signal ignored in state {:?}", self.state);
            return false;
        }
        self.clock = Some(FrameClock::starting_at(now));
        self.state = LoopState::Running;
        log::info!("frame loop running");
        true
    }

    /// Moves to `Stopped` from any state.
    pub fn stop(&mut self) {
        if self.state != LoopState::Stopped {
            log::info!("frame loop stopped");
        }
        self.state = LoopState::Stopped;
    }

    pub fn tick<C, S, R, O>(
        &mut self,
        now: C,
        scheduler: &mut S,
        renderer: &mut R,
        observer: &mut O,
    ) -> TickOutcome
    where
        C: FnOnce() -> Instant,
        S: FrameScheduler + ?Sized,
        R: FrameRenderer + ?Sized,
        O: MetricsObserver + ?Sized,
    {
        match self.state {
            LoopState::Idle => return TickOutcome::NotStarted,
            LoopState::Stopped => return TickOutcome::Stopped,
            LoopState::Running => {}
        }

        scheduler.request_frame();

        match renderer.render() {
            RenderOutcome::Presented => {}
            RenderOutcome::Skipped => return TickOutcome::Skipped,
            RenderOutcome::Fatal => {
                log::error!("render failed fatally; stopping frame loop");
                self.stop();
                return TickOutcome::Stopped;
            }
        }

        let Some(clock) = self.clock.as_mut() else {
            return TickOutcome::Skipped;
        };
        let timing: FrameTiming = clock.tick_at(now());

        let metrics =
            Metrics::compute(timing.delta_ms, self.target_side).with_frame_index(timing.frame_index);
        log::trace!(
            "frame {}: {:.3} ms, {:.4} ps/px",
            metrics.frame_index,
            metrics.delta_ms,
            metrics.picoseconds_per_pixel
        );

        observer.publish(&metrics);
        TickOutcome::Measured(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    // ── fakes ─────────────────────────────────────────────────────────────

    #[derive(Default)]
    struct FakeScheduler {
        requests: usize,
    }

    impl FrameScheduler for FakeScheduler {
        fn request_frame(&mut self) {
            self.requests += 1;
        }
    }

    struct FakeRenderer {
        renders: usize,
        outcome: RenderOutcome,
    }

    impl FakeRenderer {
        fn presenting() -> Self {
            Self { renders: 0, outcome: RenderOutcome::Presented }
        }
    }

    impl FrameRenderer for FakeRenderer {
        fn render(&mut self) -> RenderOutcome {
            self.renders += 1;
            self.outcome
        }
    }

    struct Harness {
        lp: FrameLoop,
        sched: FakeScheduler,
        renderer: FakeRenderer,
        published: Vec<Metrics>,
        t0: Instant,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                lp: FrameLoop::new(1024),
                sched: FakeScheduler::default(),
                renderer: FakeRenderer::presenting(),
                published: Vec::new(),
                t0: Instant::now(),
            }
        }

        fn at(&self, ms: u64) -> Instant {
            self.t0 + Duration::from_millis(ms)
        }

        fn tick(&mut self, ms: u64) -> TickOutcome {
            let now = self.at(ms);
            let published = &mut self.published;
            let mut observer = |m: &Metrics| published.push(*m);
            self.lp.tick(|| now, &mut self.sched, &mut self.renderer, &mut observer)
        }
    }

    // ── idle ──────────────────────────────────────────────────────────────

    #[test]
    fn no_render_before_texture_ready() {
        let mut h = Harness::new();
        for ms in [0, 16, 32] {
            assert_eq!(h.tick(ms), TickOutcome::NotStarted);
        }
        assert_eq!(h.renderer.renders, 0);
        assert_eq!(h.sched.requests, 0);
        assert!(h.published.is_empty());
        assert_eq!(h.lp.state(), LoopState::Idle);
    }

    // ── running ───────────────────────────────────────────────────────────

    #[test]
    fn one_render_per_tick_after_ready() {
        let mut h = Harness::new();
        assert!(h.lp.on_texture_ready(h.at(0)));

        for (i, ms) in [16, 33, 50, 66].into_iter().enumerate() {
            assert!(matches!(h.tick(ms), TickOutcome::Measured(_)));
            assert_eq!(h.renderer.renders, i + 1);
            assert_eq!(h.sched.requests, i + 1);
        }
        assert_eq!(h.published.len(), 4);
    }

    #[test]
    fn deltas_measured_between_ticks() {
        let mut h = Harness::new();
        h.lp.on_texture_ready(h.at(100));
        h.tick(116);
        h.tick(140);

        let deltas: Vec<f64> = h.published.iter().map(|m| m.delta_ms).collect();
        assert_eq!(deltas, [16.0, 24.0]);
        assert_eq!(h.published[0].frame_index, 0);
        assert_eq!(h.published[1].frame_index, 1);
    }

    #[test]
    fn published_metrics_match_calculator() {
        let mut h = Harness::new();
        h.lp.on_texture_ready(h.at(0));
        let TickOutcome::Measured(m) = h.tick(16) else {
            panic!("expected a measured frame");
        };
        assert_eq!(m, Metrics::compute(16.0, 1024));
        assert_eq!(h.published, [m]);
    }

    #[test]
    fn texture_ready_transitions_once() {
        let mut h = Harness::new();
        assert!(h.lp.on_texture_ready(h.at(0)));
        assert!(!h.lp.on_texture_ready(h.at(50)));
        h.tick(16);
        // The second signal must not reset the baseline.
        assert_eq!(h.published[0].delta_ms, 16.0);
    }

    #[test]
    fn skipped_frame_reschedules_without_metrics() {
        let mut h = Harness::new();
        h.lp.on_texture_ready(h.at(0));
        h.renderer.outcome = RenderOutcome::Skipped;
        assert_eq!(h.tick(16), TickOutcome::Skipped);
        assert_eq!(h.sched.requests, 1);
        assert!(h.published.is_empty());
        assert!(h.lp.is_running());
    }

    #[test]
    fn delta_includes_this_frames_render() {
        struct SlowRenderer;

        impl FrameRenderer for SlowRenderer {
            fn render(&mut self) -> RenderOutcome {
                std::thread::sleep(Duration::from_millis(30));
                RenderOutcome::Presented
            }
        }

        let mut lp = FrameLoop::new(1024);
        let mut sched = FakeScheduler::default();
        let mut published = Vec::new();
        let mut observer = |m: &Metrics| published.push(*m);

        lp.on_texture_ready(Instant::now());
        let outcome = lp.tick(Instant::now, &mut sched, &mut SlowRenderer, &mut observer);

        let TickOutcome::Measured(m) = outcome else {
            panic!("expected a measured frame");
        };
        assert!(m.delta_ms >= 30.0, "render time missing from delta: {}", m.delta_ms);
    }

    // ── stopping ──────────────────────────────────────────────────────────

    #[test]
    fn fatal_render_stops_the_loop() {
        let mut h = Harness::new();
        h.lp.on_texture_ready(h.at(0));
        h.renderer.outcome = RenderOutcome::Fatal;
        assert_eq!(h.tick(16), TickOutcome::Stopped);
        assert_eq!(h.lp.state(), LoopState::Stopped);

        h.renderer.outcome = RenderOutcome::Presented;
        assert_eq!(h.tick(32), TickOutcome::Stopped);
        assert_eq!(h.renderer.renders, 1);
    }

    #[test]
    fn stop_is_terminal() {
        let mut h = Harness::new();
        h.lp.on_texture_ready(h.at(0));
        h.tick(16);
        h.lp.stop();

        assert_eq!(h.tick(32), TickOutcome::Stopped);
        assert!(!h.lp.on_texture_ready(h.at(40)));
        assert_eq!(h.renderer.renders, 1);
        assert_eq!(h.sched.requests, 1);
    }

    #[test]
    fn stop_before_texture_prevents_start() {
        let mut h = Harness::new();
        h.lp.stop();
        assert!(!h.lp.on_texture_ready(h.at(0)));
        assert_eq!(h.tick(16), TickOutcome::Stopped);
        assert_eq!(h.renderer.renders, 0);
    }

    // ── observers ─────────────────────────────────────────────────────────

    #[test]
    fn fanout_publishes_to_all_in_order() {
        use std::cell::RefCell;
        use std::rc::Rc;

        let log = Rc::new(RefCell::new(Vec::new()));
        let mut fanout = Fanout::default();
        for id in 0..3 {
            let log = Rc::clone(&log);
            fanout.push(move |m: &Metrics| log.borrow_mut().push((id, m.frame_index)));
        }
        assert_eq!(fanout.len(), 3);

        fanout.publish(&Metrics::default().with_frame_index(7));
        assert_eq!(*log.borrow(), [(0, 7), (1, 7), (2, 7)]);
    }
}
