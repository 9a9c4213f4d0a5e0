use crate::render::RenderOutcome;

/// High-level response after a surface error.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum SurfaceErrorAction {
    /// Surface was reconfigured; rendering may resume next frame.
    Reconfigured,
    /// Transient error; skip the current frame.
    SkipFrame,
    /// Fatal error (commonly OOM); terminate gracefully.
    Fatal,
}

impl SurfaceErrorAction {
    /// How the frame loop should treat the frame that hit the error.
    pub fn outcome(self) -> RenderOutcome {
        match self {
            Self::Reconfigured | Self::SkipFrame => RenderOutcome::Skipped,
            Self::Fatal => RenderOutcome::Fatal,
        }
    }
}
