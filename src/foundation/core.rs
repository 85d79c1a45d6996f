use std::fmt;

use crate::foundation::error::{BlurError, BlurResult};

/// Integer frame number on the host timeline. Hosts allow negative frames.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub i64);

impl FrameIndex {
    /// Frame `delta` frames away, saturating at the `i64` bounds.
    pub fn offset(self, delta: i64) -> Self {
        Self(self.0.saturating_add(delta))
    }
}

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive frame range walked with a fixed step, matching the host's
/// `frame_start..=frame_end` / `frame_step` settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FrameRange {
    pub start: FrameIndex,
    pub end: FrameIndex, // inclusive
    pub step: u32,       // must be > 0
}

impl FrameRange {
    pub fn new(start: FrameIndex, end: FrameIndex, step: u32) -> BlurResult<Self> {
        if start.0 > end.0 {
            return Err(BlurError::invalid_config("FrameRange start must be <= end"));
        }
        if step == 0 {
            return Err(BlurError::invalid_config("FrameRange step must be > 0"));
        }
        Ok(Self { start, end, step })
    }

    /// Single-frame range.
    pub fn single(frame: FrameIndex) -> Self {
        Self {
            start: frame,
            end: frame,
            step: 1,
        }
    }

    /// Number of frames the range visits.
    pub fn len_frames(self) -> u64 {
        let span = self.end.0.abs_diff(self.start.0);
        span / u64::from(self.step) + 1
    }

    pub fn contains(self, f: FrameIndex) -> bool {
        self.start.0 <= f.0 && f.0 <= self.end.0 && (f.0 - self.start.0) % i64::from(self.step) == 0
    }

    /// Frames in visiting order.
    pub fn iter(self) -> impl Iterator<Item = FrameIndex> {
        (self.start.0..=self.end.0)
            .step_by(self.step as usize)
            .map(FrameIndex)
    }
}

/// A point in time addressed as an integer frame plus a fraction in `[0, 1)`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct SubframeTime {
    pub frame: FrameIndex,
    pub fraction: f64,
}

impl SubframeTime {
    pub fn new(frame: FrameIndex, fraction: f64) -> Self {
        Self { frame, fraction }
    }

    pub fn as_f64(self) -> f64 {
        self.frame.0 as f64 + self.fraction
    }
}

impl fmt::Display for SubframeTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{:.6}", self.frame, self.fraction)
    }
}

/// Effective render resolution in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Base resolution scaled by a percentage, rounded like the host does.
    pub fn scaled(width: u32, height: u32, percentage: u32) -> Self {
        let factor = f64::from(percentage) / 100.0;
        Self {
            width: (f64::from(width) * factor).round() as u32,
            height: (f64::from(height) * factor).round() as u32,
        }
    }

    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }
}

/// Dimensions of a flat pixel buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BufferShape {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
}

impl BufferShape {
    /// RGBA channel count used by host capture buffers.
    pub const RGBA: u32 = 4;

    pub fn new(width: u32, height: u32, channels: u32) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    pub fn rgba(resolution: Resolution) -> Self {
        Self::new(resolution.width, resolution.height, Self::RGBA)
    }

    /// Number of `f32` samples, or `None` on overflow.
    pub fn sample_len(self) -> Option<usize> {
        (self.width as usize)
            .checked_mul(self.height as usize)
            .and_then(|v| v.checked_mul(self.channels as usize))
    }
}

impl fmt::Display for BufferShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
