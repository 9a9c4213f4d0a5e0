//! Fill-rate benchmark.
//!
//! Draws one full-screen quad `cycles` times per frame through a 3×3
//! convolution shader and reports how long each frame took, normalized per
//! target pixel.
//!
//! Pieces:
//! - `kernel`, `geometry`, `config`: validated inputs, fixed for a run
//! - `frame_loop`: the tick state machine behind scheduler/renderer/observer seams
//! - `metrics`, `stats`, `stream`: per-frame derivation and delivery
//! - `reference`: CPU model of the shader stages
//! - `app`: wiring onto the window runtime

mod app;
mod config;
mod error;
mod frame_loop;
mod geometry;
mod kernel;
mod metrics;
mod stats;
mod stream;

pub mod reference;

pub use app::Benchmark;
pub use config::{BenchmarkConfig, DEFAULT_CYCLES, DEFAULT_TARGET_SIDE, DEFAULT_TEXTURE};
pub use error::BenchError;
pub use frame_loop::{
    Fanout, FrameLoop, FrameRenderer, FrameScheduler, LoopState, MetricsObserver, TickOutcome,
};
pub use geometry::{
    check_index_buffer, cycles_from_signed, index_buffer_bytes, GeometryBatch, QuadVertex,
    MAX_CYCLES, QUAD_INDICES, QUAD_VERTICES,
};
pub use kernel::{ConvolutionKernel, KernelPreset, KernelWeights};
pub use metrics::{
    cycles_per_pixel, picoseconds_per_pixel, pixels_per_frame, Metrics, REFERENCE_CLOCK_GHZ,
};
pub use stats::{FrameStats, StatsSummary};
pub use stream::{
    metrics_channel, ChannelObserver, DroppedSamples, MetricsStream, StopHandle,
    DEFAULT_STREAM_CAPACITY,
};
