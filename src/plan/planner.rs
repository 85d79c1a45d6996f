use crate::{
    config::{SamplingConfig, SamplingMode},
    foundation::{
        core::{FrameIndex, SubframeTime},
        error::{BlurError, BlurResult},
    },
};

/// Absorbs float noise in `samples / shutter` (e.g. `3 / 0.6 = 5.000000000000001`) before
/// rounding up.
const MULTIPLIER_SLACK: f64 = 1e-9;

/// One output frame to render. Built by the driver, consumed immediately.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct FrameRequest {
    pub frame: FrameIndex,
    /// Clamped shutter fraction in `(0, 1]`.
    pub shutter: f64,
    pub mode: SamplingMode,
}

impl FrameRequest {
    pub fn new(frame: FrameIndex, config: &SamplingConfig) -> Self {
        Self {
            frame,
            shutter: config.effective_shutter(),
            mode: config.mode,
        }
    }
}

/// Time offset of one render within the shutter window.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct SampleNode {
    pub index: u32,
    /// Fraction of the frame interval in `[0, shutter)`.
    pub offset: f64,
}

/// How one frame is sliced into subframe renders.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct SamplePlan {
    pub sample_count: u32,
    /// Evenly spaced slots per full frame; the first `sample_count` fall inside the shutter.
    pub subframe_multiplier: u32,
    pub time_step: f64,
    pub shutter: f64,
}

impl SamplePlan {
    /// Sample offsets in render order; the first is always `0`.
    pub fn nodes(&self) -> impl Iterator<Item = SampleNode> + '_ {
        (0..self.sample_count).map(|index| SampleNode {
            index,
            offset: self.offset(index),
        })
    }

    pub fn offset(&self, index: u32) -> f64 {
        f64::from(index) / f64::from(self.subframe_multiplier)
    }

    /// Weight of each subframe in the average.
    pub fn weight(&self) -> f32 {
        1.0 / self.sample_count as f32
    }

    /// Fractional time of subframe `index` of `frame`.
    pub fn subframe_time(&self, frame: FrameIndex, index: u32) -> SubframeTime {
        SubframeTime::new(frame, self.offset(index))
    }

    /// Integer frame addressing subframe `index` on a timeline stretched by the multiplier.
    pub fn expanded_frame(&self, frame: FrameIndex, index: u32) -> FrameIndex {
        FrameIndex(
            frame
                .0
                .saturating_mul(i64::from(self.subframe_multiplier))
                .saturating_add(i64::from(index)),
        )
    }
}

fn adaptive_sample_count(config: &SamplingConfig, shutter: f64, velocity: f64) -> u32 {
    let min = f64::from(config.min_samples);
    let max = f64::from(config.effective_max_samples());
    let raw = (velocity * shutter / config.pixel_tolerance).ceil();
    let clamped = raw.clamp(min, max);
    // A moving but sub-tolerance object still needs one sample.
    (clamped as u32).max(1)
}

/// Decide how many subframes `config` needs for a frame moving at `velocity_px_per_frame`.
///
/// The velocity is the full-frame estimate; it is scaled by the shutter before being compared
/// with the pixel tolerance. Static mode ignores it.
pub fn plan_samples(config: &SamplingConfig, velocity_px_per_frame: f64) -> BlurResult<SamplePlan> {
    config.validate()?;
    let shutter = config.effective_shutter();

    let sample_count = match config.mode {
        SamplingMode::Static => {
            let n = config.static_samples.ceil();
            if n < 1.0 || n > f64::from(u32::MAX) {
                return Err(BlurError::invalid_config(format!(
                    "static sample count {} is out of range",
                    config.static_samples
                )));
            }
            n as u32
        }
        SamplingMode::Adaptive => {
            if !velocity_px_per_frame.is_finite() || velocity_px_per_frame < 0.0 {
                return Err(BlurError::invalid_config(format!(
                    "velocity estimate must be finite and >= 0 (got {velocity_px_per_frame})"
                )));
            }
            adaptive_sample_count(config, shutter, velocity_px_per_frame)
        }
    };

    let slots = (f64::from(sample_count) / shutter - MULTIPLIER_SLACK).ceil();
    if !slots.is_finite() || slots > f64::from(u32::MAX) {
        return Err(BlurError::invalid_config(format!(
            "shutter {shutter} with {sample_count} samples needs too many subframe slots"
        )));
    }
    let subframe_multiplier = (slots as u32).max(sample_count);

    Ok(SamplePlan {
        sample_count,
        subframe_multiplier,
        time_step: 1.0 / f64::from(subframe_multiplier),
        shutter,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/plan/planner.rs"]
mod tests;
