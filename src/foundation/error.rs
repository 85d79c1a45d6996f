use crate::foundation::core::{BufferShape, FrameIndex};

/// Convenience result type used across shutterblur.
pub type BlurResult<T> = Result<T, BlurError>;

/// Top-level error taxonomy used by engine APIs.
///
/// Frame-scoped variants carry the frame (and subframe where known) so a failed run can be
/// resumed by hand from the right place.
#[derive(thiserror::Error, Debug)]
pub enum BlurError {
    /// Bad shutter, sample bounds, tolerance or other job settings.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Subframe buffers disagree in size, usually a host resolution change mid-run.
    #[error(
        "shape mismatch at {}: expected {expected}, found {found}",
        subframe_location(.frame, .subframe)
    )]
    ShapeMismatch {
        /// Output frame being rendered; `None` for standalone accumulation.
        frame: Option<FrameIndex>,
        /// Index of the offending subframe (or buffer) within the frame.
        subframe: u32,
        /// Shape the frame was started with.
        expected: BufferShape,
        /// Shape of the offending buffer.
        found: BufferShape,
    },

    /// The host renderer failed while producing a subframe.
    #[error("render failure at frame {frame}, subframe {subframe}: {source:#}")]
    RenderFailure {
        /// Output frame being rendered.
        frame: FrameIndex,
        /// Index of the subframe within the frame.
        subframe: u32,
        /// Underlying host error.
        source: anyhow::Error,
    },

    /// The run was interrupted between subframes.
    #[error("cancelled at frame {frame} after {subframe} subframe(s)")]
    Cancelled {
        /// Output frame in progress when the interrupt was observed.
        frame: FrameIndex,
        /// Number of subframes completed for that frame.
        subframe: u32,
    },

    /// The compositor graph could not be wired for capture.
    #[error("compositor error: {0}")]
    Compositor(String),

    /// Reading job/scene files or writing output images failed.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapped lower-level error from host collaborators or dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BlurError {
    /// Build a [`BlurError::InvalidConfiguration`] value.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Build a [`BlurError::Compositor`] value.
    pub fn compositor(msg: impl Into<String>) -> Self {
        Self::Compositor(msg.into())
    }

    /// Build a [`BlurError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Build a [`BlurError::RenderFailure`] for `frame`/`subframe`.
    pub fn render_failure(frame: FrameIndex, subframe: u32, source: anyhow::Error) -> Self {
        Self::RenderFailure {
            frame,
            subframe,
            source,
        }
    }

    /// True for [`BlurError::Cancelled`].
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Frame the error is attributed to, if any.
    pub fn frame(&self) -> Option<FrameIndex> {
        match self {
            Self::RenderFailure { frame, .. } | Self::Cancelled { frame, .. } => Some(*frame),
            Self::ShapeMismatch { frame, .. } => *frame,
            _ => None,
        }
    }
}

fn subframe_location(frame: &Option<FrameIndex>, subframe: &u32) -> String {
    match frame {
        Some(frame) => format!("frame {frame}, subframe {subframe}"),
        None => format!("buffer {subframe}"),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
