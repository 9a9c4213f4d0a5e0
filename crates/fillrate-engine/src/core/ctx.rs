use winit::window::Window;

use crate::device::Gpu;
use crate::render::{RenderCtx, RenderOutcome, RenderTarget};
use crate::window::RuntimeCtx;

/// Window surface plus the GPU context bound to it.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by `Gpu<'w>`
pub struct Surface<'a, 'w> {
    window: &'a Window,
    gpu: &'a mut Gpu<'w>,
}

impl<'a, 'w> Surface<'a, 'w> {
    pub fn new(window: &'a Window, gpu: &'a mut Gpu<'w>) -> Self {
        Self { window, gpu }
    }

    pub fn gpu(&self) -> &Gpu<'w> {
        &*self.gpu
    }

    /// Acquires a frame, clears it to `clear`, calls `draw`, then presents.
    ///
    /// Surface errors are resolved here; the returned outcome tells the caller
    /// whether anything reached the screen.
    pub fn render<F>(&mut self, clear: wgpu::Color, draw: F) -> RenderOutcome
    where
        F: FnOnce(&RenderCtx<'_>, &mut RenderTarget<'_>),
    {
        let mut frame = match self.gpu.begin_frame() {
            Ok(f) => f,
            Err(err) => {
                log::debug!("surface error: {err}");
                return self.gpu.handle_surface_error(err).outcome();
            }
        };

        // Clear pass; dropped before the encoder is moved into submit().
        {
            let _rpass = frame.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("fillrate clear"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &frame.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(clear),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
                multiview_mask: None,
            });
        }

        let rctx = RenderCtx::new(
            self.gpu.device(),
            self.gpu.queue(),
            self.gpu.surface_format(),
        );

        // RenderTarget borrows frame.encoder; dropped before submit() takes frame.
        {
            let mut target = RenderTarget::new(&mut frame.encoder, &frame.view);
            draw(&rctx, &mut target);
        }

        self.window.pre_present_notify();
        self.gpu.submit(frame);

        RenderOutcome::Presented
    }
}

/// Per-frame context passed to `core::App::on_frame`.
pub struct FrameCtx<'a, 'w> {
    pub surface: Surface<'a, 'w>,
    pub runtime: &'a mut RuntimeCtx,
}
