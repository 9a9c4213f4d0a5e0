use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while configuring or feeding the benchmark.
///
/// Everything except `RenderFailed` is detected before the frame loop starts;
/// device-limit checks run on the first frame, before anything is drawn.
#[derive(Debug, Error)]
pub enum BenchError {
    #[error("overdraw cycles must be positive, got {0}")]
    InvalidCycles(i64),

    #[error("overdraw cycles {0} exceed the largest drawable index range")]
    TooManyCycles(u64),

    #[error("kernel divisor must be non-zero")]
    ZeroDivisor,

    /// `index` 0..=8 points at a weight, 9 at the divisor.
    #[error("kernel value at index {index} is not finite")]
    NonFiniteKernel { index: usize },

    #[error("render target side must be positive, got {0}")]
    InvalidTargetSize(u32),

    #[error("unknown kernel preset `{0}` (expected one of: gauss, vline, hline, box)")]
    UnknownKernel(String),

    #[error("invalid kernel weights: {0}")]
    KernelParse(String),

    #[error("failed to load texture `{}`", path.display())]
    AssetLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("texture loader for `{}` stopped without a result", path.display())]
    LoaderDisconnected { path: PathBuf },

    #[error("{cycles} overdraw cycles need a {bytes}-byte index buffer, device limit is {max}")]
    IndexBufferTooLarge { cycles: u32, bytes: u64, max: u64 },

    #[error("texture is {width}x{height}, device limit is {max}")]
    TextureTooLarge { width: u32, height: u32, max: u32 },

    #[error("surface could not be rendered to; benchmark stopped after {frames} frames")]
    RenderFailed { frames: u64 },
}
