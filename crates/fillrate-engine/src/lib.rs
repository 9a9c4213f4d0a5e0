//! Fillrate engine crate.
//!
//! GPU fill-rate benchmark: a window, a wgpu surface, and a frame loop that
//! redraws a convolution-shaded quad many times per frame and measures the cost
//! per pixel. The studio binary is a thin CLI over `bench::Benchmark`.

pub mod bench;
pub mod core;
pub mod device;
pub mod logging;
pub mod render;
pub mod texture;
pub mod time;
pub mod window;
