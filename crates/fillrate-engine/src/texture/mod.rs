//! Source texture: asynchronous decode and GPU upload.
//!
//! Decoding runs on a worker thread and is polled from the event loop, so the
//! render thread never blocks on disk or codec work.

mod gpu;
mod source;

pub use gpu::GpuTexture;
pub use source::{PendingTexture, TextureSource};
