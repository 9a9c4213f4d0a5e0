//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the benchmark window, and wires them to the
//! GPU layer. Redraws happen only when the app asks for one, which makes
//! `RuntimeCtx` the frame loop's scheduling primitive.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
