use winit::event::WindowEvent;

use crate::window::RuntimeCtx;

use super::ctx::FrameCtx;

/// Control directive returned by app callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Application contract implemented by higher layers.
///
/// All callbacks run on the event-loop thread, one at a time.
pub trait App {
    /// Called once, after the window and GPU context exist.
    fn on_start(&mut self, runtime: &mut RuntimeCtx) {
        let _ = runtime;
    }

    /// Called for window events.
    fn on_window_event(&mut self, event: &WindowEvent) -> AppControl {
        let _ = event;
        AppControl::Continue
    }

    /// Called whenever the event loop is about to wait.
    ///
    /// Background work (e.g. an asset decode) is polled from here.
    fn on_idle(&mut self, runtime: &mut RuntimeCtx) -> AppControl {
        let _ = runtime;
        AppControl::Continue
    }

    /// Called once per redraw.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
