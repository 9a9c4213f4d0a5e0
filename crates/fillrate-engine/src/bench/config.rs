use std::path::PathBuf;

use super::{BenchError, ConvolutionKernel, MAX_CYCLES};
use super::stream::DEFAULT_STREAM_CAPACITY;

/// Side length of the square render target in the reference configuration.
pub const DEFAULT_TARGET_SIDE: u32 = 1024;

/// Overdraw factor in the reference configuration.
pub const DEFAULT_CYCLES: u32 = 1000;

/// Asset loaded when no texture path is given.
pub const DEFAULT_TEXTURE: &str = "blocks-small.bmp";

/// Everything the benchmark needs at setup. Immutable once the run starts.
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Image convolved by the fragment stage.
    pub texture_path: PathBuf,

    pub kernel: ConvolutionKernel,

    /// Overdraw factor: how many times the quad is redrawn per frame.
    pub cycles: u32,

    /// Side of the square render target, in physical pixels.
    pub target_side: u32,

    /// Buffered samples in the metrics stream.
    pub stream_capacity: usize,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        Self {
            texture_path: PathBuf::from(DEFAULT_TEXTURE),
            kernel: ConvolutionKernel::default(),
            cycles: DEFAULT_CYCLES,
            target_side: DEFAULT_TARGET_SIDE,
            stream_capacity: DEFAULT_STREAM_CAPACITY,
        }
    }
}

impl BenchmarkConfig {
    pub fn with_texture(texture_path: impl Into<PathBuf>) -> Self {
        Self {
            texture_path: texture_path.into(),
            ..Self::default()
        }
    }

    /// Rejects configurations that would draw nothing.
    ///
    /// Kernel invariants are enforced by `ConvolutionKernel` itself.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.cycles == 0 {
            return Err(BenchError::InvalidCycles(0));
        }
        if self.cycles > MAX_CYCLES {
            return Err(BenchError::TooManyCycles(u64::from(self.cycles)));
        }
        if self.target_side == 0 {
            return Err(BenchError::InvalidTargetSize(0));
        }
        Ok(())
    }

    /// UV distance between adjacent taps: one target pixel.
    pub fn texel_step(&self) -> f32 {
        1.0 / self.target_side.max(1) as f32
    }
}
