//! Time subsystem.
//!
//! Provides raw, testable frame timing without coupling to the runtime.
//! Intended usage:
//! - one `FrameClock` per benchmark loop
//! - call `tick()` (or `tick_at()` from tests) once per rendered frame

mod frame_clock;

pub use frame_clock::{FrameClock, FrameTiming};
