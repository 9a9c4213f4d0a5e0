use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use ouroboros::self_referencing;

use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

use crate::bench::FrameScheduler;
use crate::core::{App as CoreApp, AppControl, FrameCtx, Surface};
use crate::device::{Gpu, GpuInit};

/// How often the loop wakes to run `App::on_idle` when no redraw is pending.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(4);

/// Window/runtime configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub title: String,
    /// Drawable size in physical pixels.
    pub size: PhysicalSize<u32>,
    pub resizable: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            title: "fillrate".to_string(),
            size: PhysicalSize::new(1024, 1024),
            resizable: false,
        }
    }
}

/// Runtime context passed to the application.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    /// Schedules one more `on_frame` call.
    pub fn request_redraw(&mut self) {
        self.commands.push(Command::RequestRedraw);
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

impl FrameScheduler for RuntimeCtx {
    fn request_frame(&mut self) {
        self.request_redraw();
    }
}

enum Command {
    RequestRedraw,
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens one window, binds a GPU surface to it and drives `app` until exit.
    ///
    /// Hands `app` back once the loop exits, so callers can inspect its final
    /// state. Returns the setup error if the window or GPU context could not
    /// be created.
    pub fn run<A>(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Result<A>
    where
        A: 'static + CoreApp,
    {
        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, app);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        match state.setup_error.take() {
            Some(e) => Err(e),
            None => Ok(state.app),
        }
    }
}

#[self_referencing]
struct WindowEntry {
    window: Window,

    #[borrows(window)]
    #[covariant]
    gpu: Gpu<'this>,
}

struct AppState<A>
where
    A: CoreApp + 'static,
{
    config: RuntimeConfig,
    gpu_init: GpuInit,
    app: A,

    entry: Option<WindowEntry>,
    started: bool,
    exit_requested: bool,
    setup_error: Option<anyhow::Error>,
}

impl<A> AppState<A>
where
    A: CoreApp + 'static,
{
    fn new(config: RuntimeConfig, gpu_init: GpuInit, app: A) -> Self {
        Self {
            config,
            gpu_init,
            app,
            entry: None,
            started: false,
            exit_requested: false,
            setup_error: None,
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    fn create_window_entry(&self, event_loop: &ActiveEventLoop) -> Result<WindowEntry> {
        let attrs = Window::default_attributes()
            .with_title(self.config.title.clone())
            .with_inner_size(self.config.size)
            .with_resizable(self.config.resizable);

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let gpu_init = self.gpu_init.clone();

        WindowEntryTryBuilder {
            window,
            gpu_builder: |w| pollster::block_on(Gpu::new(w, gpu_init)),
        }
        .try_build()
        .context("GPU initialization failed for window")
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::RequestRedraw => {
                    if let Some(entry) = self.entry.as_ref() {
                        entry.with_window(|w| w.request_redraw());
                    }
                }
                Command::Exit => self.request_exit(),
            }
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    fn handle_control(&mut self, control: AppControl) {
        if control == AppControl::Exit {
            self.request_exit();
        }
    }
}

impl<A> ApplicationHandler for AppState<A>
where
    A: CoreApp + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.entry.is_some() {
            return;
        }

        match self.create_window_entry(event_loop) {
            Ok(entry) => {
                let size = entry.borrow_gpu().size();
                if size != self.config.size {
                    log::warn!(
                        "surface is {}x{}, requested {}x{}",
                        size.width,
                        size.height,
                        self.config.size.width,
                        self.config.size.height
                    );
                }
                self.entry = Some(entry);
            }
            Err(e) => {
                log::error!("setup failed: {e:#}");
                self.setup_error = Some(e);
                self.request_exit();
                event_loop.exit();
                return;
            }
        }

        if !self.started {
            self.started = true;
            let mut ctx = RuntimeCtx::default();
            self.app.on_start(&mut ctx);
            self.apply_commands(event_loop, ctx);
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let mut ctx = RuntimeCtx::default();
        let control = self.app.on_idle(&mut ctx);
        self.handle_control(control);
        self.apply_commands(event_loop, ctx);

        event_loop.set_control_flow(ControlFlow::WaitUntil(Instant::now() + IDLE_POLL_INTERVAL));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        let control = self.app.on_window_event(&event);
        self.handle_control(control);
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.entry = None;
                self.request_exit();
                event_loop.exit();
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.entry.as_mut() {
                    entry.with_gpu_mut(|gpu| gpu.resize(*new_size));
                }
            }

            WindowEvent::RedrawRequested => {
                let mut runtime_ctx = RuntimeCtx::default();
                let mut app_control = AppControl::Continue;

                // Split borrows to avoid `self` capture inside `ouroboros` closures.
                let (app, entry) = (&mut self.app, &mut self.entry);

                if let Some(entry) = entry.as_mut() {
                    entry.with_mut(|fields| {
                        let mut ctx = FrameCtx {
                            surface: Surface::new(fields.window, fields.gpu),
                            runtime: &mut runtime_ctx,
                        };
                        app_control = app.on_frame(&mut ctx);
                    });
                }

                self.handle_control(app_control);
                self.apply_commands(event_loop, runtime_ctx);
            }

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_ctx_buffers_frame_requests() {
        let mut ctx = RuntimeCtx::default();
        ctx.request_frame();
        ctx.request_frame();
        ctx.exit();
        assert_eq!(ctx.commands.len(), 3);
        assert!(matches!(ctx.commands[0], Command::RequestRedraw));
        assert!(matches!(ctx.commands[2], Command::Exit));
    }

    #[test]
    fn default_window_matches_reference_target() {
        let c = RuntimeConfig::default();
        assert_eq!(c.size, PhysicalSize::new(1024, 1024));
        assert!(!c.resizable);
    }
}
