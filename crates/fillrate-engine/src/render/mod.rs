//! GPU rendering subsystem.
//!
//! The only renderer is the convolution pass: it owns its pipeline, uniform
//! and geometry buffers, and draws the overdraw batch into a `RenderTarget`.
//!
//! Convention:
//! - geometry is already in NDC; the vertex shader does not transform it
//! - texture coordinates grow downward (+V is the next texel row)

mod convolution;
mod ctx;

pub use convolution::ConvolutionRenderer;
pub use ctx::{RenderCtx, RenderOutcome, RenderTarget};
