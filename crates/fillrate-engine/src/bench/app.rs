use std::time::Instant;

use image::RgbaImage;
use winit::dpi::PhysicalSize;

use crate::core::{App, AppControl, FrameCtx, Surface};
use crate::device::GpuInit;
use crate::render::{ConvolutionRenderer, RenderOutcome};
use crate::texture::{GpuTexture, PendingTexture, TextureSource};
use crate::window::{Runtime, RuntimeConfig, RuntimeCtx};

use super::{
    metrics_channel, BenchError, BenchmarkConfig, DroppedSamples, Fanout, FrameLoop,
    FrameRenderer, GeometryBatch, LoopState, MetricsObserver, MetricsStream, StopHandle,
    TickOutcome,
};

/// The fill-rate benchmark as a runtime application.
///
/// Lifecycle:
/// - `on_start` starts decoding the source image
/// - `on_idle` polls the decode; a finished image triggers the first redraw
/// - the first `on_frame` after that uploads the texture and starts the loop
/// - every later `on_frame` is one frame-loop tick
pub struct Benchmark {
    config: BenchmarkConfig,
    geometry: GeometryBatch,
    frame_loop: FrameLoop,
    renderer: ConvolutionRenderer,

    pending: Option<PendingTexture>,
    decoded: Option<RgbaImage>,

    observers: Fanout,
    dropped: DroppedSamples,
    stop: StopHandle,

    measured_frames: u64,
    failure: Option<BenchError>,
}

impl Benchmark {
    /// Validates `config` and builds the overdraw batch.
    ///
    /// The returned stream receives one sample per measured frame.
    pub fn new(config: BenchmarkConfig) -> Result<(Self, MetricsStream), BenchError> {
        config.validate()?;
        let geometry = GeometryBatch::build(config.cycles)?;

        let (channel, stream) = metrics_channel(config.stream_capacity);
        let dropped = channel.dropped_counter();
        let mut observers = Fanout::default();
        observers.push(channel);

        log::info!(
            "benchmark configured: {} cycles, {}x{} target, {} indices",
            config.cycles,
            config.target_side,
            config.target_side,
            geometry.index_count()
        );

        let bench = Self {
            frame_loop: FrameLoop::new(config.target_side),
            renderer: ConvolutionRenderer::new(&config.kernel, config.texel_step()),
            geometry,
            pending: None,
            decoded: None,
            observers,
            dropped,
            stop: StopHandle::new(),
            measured_frames: 0,
            failure: None,
            config,
        };
        Ok((bench, stream))
    }

    pub fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    /// Handle that ends the run from any thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Registers an extra observer, called on the render thread after the
    /// stream observer.
    pub fn add_observer(&mut self, observer: impl MetricsObserver + 'static) {
        self.observers.push(observer);
    }

    pub fn state(&self) -> LoopState {
        self.frame_loop.state()
    }

    pub fn measured_frames(&self) -> u64 {
        self.measured_frames
    }

    /// Samples the metrics stream discarded because its consumer fell behind.
    pub fn dropped_samples(&self) -> u64 {
        self.dropped.get()
    }

    /// Error that ended the run early, if any.
    pub fn failure(&self) -> Option<&BenchError> {
        self.failure.as_ref()
    }

    /// Opens a non-resizable R×R window and runs until stopped or closed.
    pub fn run(self, gpu_init: GpuInit) -> anyhow::Result<()> {
        let side = self.config.target_side;
        let runtime = RuntimeConfig {
            title: format!("fillrate ({} cycles)", self.config.cycles),
            size: PhysicalSize::new(side, side),
            resizable: false,
        };

        let bench = Runtime::run(runtime, gpu_init, self)?;
        log::info!("benchmark finished after {} measured frames", bench.measured_frames);
        let dropped = bench.dropped_samples();
        if dropped > 0 {
            log::warn!("metrics stream fell behind: {dropped} samples dropped");
        }

        match bench.failure {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    fn fail(&mut self, err: BenchError) -> AppControl {
        log::error!("{err}");
        self.frame_loop.stop();
        self.failure.get_or_insert(err);
        AppControl::Exit
    }

    fn check_stop(&mut self) -> bool {
        if self.stop.is_stopped() {
            self.frame_loop.stop();
            return true;
        }
        false
    }
}

impl App for Benchmark {
    fn on_start(&mut self, _runtime: &mut RuntimeCtx) {
        self.pending = Some(TextureSource::load(&self.config.texture_path));
    }

    fn on_idle(&mut self, runtime: &mut RuntimeCtx) -> AppControl {
        if self.check_stop() {
            return AppControl::Exit;
        }

        let Some(result) = self.pending.as_mut().and_then(PendingTexture::poll) else {
            return AppControl::Continue;
        };
        self.pending = None;

        match result {
            Ok(image) => {
                self.decoded = Some(image);
                runtime.request_redraw();
                AppControl::Continue
            }
            Err(err) => self.fail(err),
        }
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.check_stop() {
            return AppControl::Exit;
        }

        if let Some(image) = self.decoded.take() {
            let gpu = ctx.surface.gpu();
            let max_buffer_size = gpu.device().limits().max_buffer_size;
            if let Err(err) = self.geometry.check_buffer_limit(max_buffer_size) {
                return self.fail(err);
            }
            match GpuTexture::upload(gpu.device(), gpu.queue(), &image) {
                Ok(texture) => {
                    self.renderer.set_texture(texture);
                    self.frame_loop.on_texture_ready(Instant::now());
                }
                Err(err) => return self.fail(err),
            }
        }

        let mut draw = SurfaceDraw {
            surface: &mut ctx.surface,
            renderer: &mut self.renderer,
            geometry: &self.geometry,
        };
        let outcome = self.frame_loop.tick(
            Instant::now,
            &mut *ctx.runtime,
            &mut draw,
            &mut self.observers,
        );

        match outcome {
            TickOutcome::Measured(_) => {
                self.measured_frames += 1;
                AppControl::Continue
            }
            TickOutcome::NotStarted | TickOutcome::Skipped => AppControl::Continue,
            TickOutcome::Stopped => {
                if self.stop.is_stopped() {
                    return AppControl::Exit;
                }
                self.fail(BenchError::RenderFailed {
                    frames: self.measured_frames,
                })
            }
        }
    }
}

/// One convolution pass over the whole batch, presented to the window.
struct SurfaceDraw<'s, 'a, 'w> {
    surface: &'s mut Surface<'a, 'w>,
    renderer: &'s mut ConvolutionRenderer,
    geometry: &'s GeometryBatch,
}

impl FrameRenderer for SurfaceDraw<'_, '_, '_> {
    fn render(&mut self) -> RenderOutcome {
        let renderer = &mut *self.renderer;
        let geometry = self.geometry;
        self.surface.render(wgpu::Color::BLACK, |rctx, target| {
            renderer.render(rctx, target, geometry)
        })
    }
}
