/// A single acquired swapchain frame.
///
/// Short-lived: hand it back to `Gpu::submit` in the same tick. Holding the
/// surface texture blocks acquisition of the next one.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub encoder: wgpu::CommandEncoder,
}
