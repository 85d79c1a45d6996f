//! Job configuration: how many subframes to render, how to weight and encode them,
//! and where the result goes.
//!
//! A [`BlurJob`] is read once per run (usually from JSON) and passed explicitly to every
//! driver call. Nothing in the engine reads configuration from ambient state.

use std::{fs::File, io::BufReader, path::Path};

use crate::foundation::error::{BlurError, BlurResult};

/// Default gamma exponent, the reciprocal of a 2.2 display gamma.
pub const DEFAULT_GAMMA_EXPONENT: f32 = 1.0 / 2.2;

/// How the per-frame sample count is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    /// Fixed sample count for every frame.
    #[default]
    Static,
    /// Sample count derived from on-screen object velocity each frame.
    Adaptive,
}

/// Exponent applied to the accumulated mean: `out = mean.powf(exponent)`.
///
/// This is the only gamma convention the engine understands. A display gamma of 2.2 is
/// expressed as `0.454545`, never as `2.2`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct GammaExponent(pub f32);

impl Default for GammaExponent {
    fn default() -> Self {
        Self(DEFAULT_GAMMA_EXPONENT)
    }
}

impl GammaExponent {
    /// Exponent that undoes this encoding.
    pub fn inverse(self) -> Self {
        Self(1.0 / self.0)
    }

    pub fn is_identity(self) -> bool {
        self.0 == 1.0
    }
}

/// Sampling parameters shared by every frame of a run. Read-only to the engine.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    pub mode: SamplingMode,
    /// Fraction of the frame interval the shutter is open, in `(0, 1]`. Larger values are
    /// clamped to `1.0` when planning.
    pub shutter: f64,
    /// Samples per frame in [`SamplingMode::Static`]; rounded up.
    pub static_samples: f64,
    /// Largest exposed displacement, in pixels, tolerated between two subframes.
    pub pixel_tolerance: f64,
    pub min_samples: u32,
    pub max_samples: u32,
    pub gamma_exponent: GammaExponent,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            mode: SamplingMode::Static,
            shutter: 0.5,
            static_samples: 8.0,
            pixel_tolerance: 10.0,
            min_samples: 1,
            max_samples: 32,
            gamma_exponent: GammaExponent::default(),
        }
    }
}

impl SamplingConfig {
    pub fn validate(&self) -> BlurResult<()> {
        if !self.shutter.is_finite() || self.shutter <= 0.0 {
            return Err(BlurError::invalid_config(format!(
                "shutter must be a finite value > 0 (got {})",
                self.shutter
            )));
        }
        match self.mode {
            SamplingMode::Static => {
                if !self.static_samples.is_finite() || self.static_samples.ceil() < 1.0 {
                    return Err(BlurError::invalid_config(format!(
                        "static_samples must round up to at least 1 (got {})",
                        self.static_samples
                    )));
                }
            }
            SamplingMode::Adaptive => {
                if !self.pixel_tolerance.is_finite() || self.pixel_tolerance <= 0.0 {
                    return Err(BlurError::invalid_config(format!(
                        "pixel_tolerance must be a finite value > 0 (got {})",
                        self.pixel_tolerance
                    )));
                }
            }
        }
        let g = self.gamma_exponent.0;
        if !g.is_finite() || g <= 0.0 {
            return Err(BlurError::invalid_config(format!(
                "gamma_exponent must be a finite value > 0 (got {g})"
            )));
        }
        Ok(())
    }

    /// Shutter fraction actually used: never more than one full frame.
    pub fn effective_shutter(&self) -> f64 {
        self.shutter.min(1.0)
    }

    /// Upper sample bound, raised to `min_samples` when the bounds are inverted.
    pub fn effective_max_samples(&self) -> u32 {
        self.max_samples.max(self.min_samples)
    }
}

/// Encoding for saved frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    /// 8-bit RGBA PNG, values clamped to `[0, 1]`.
    Png8,
    /// 16-bit RGBA PNG, values clamped to `[0, 1]`.
    Png16,
    /// 32-bit float RGBA OpenEXR, values stored unclamped.
    OpenExr,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png8 | Self::Png16 => ".png",
            Self::OpenExr => ".exr",
        }
    }
}

/// Where finished frames are written.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Prefix the zero-padded frame number is appended to, e.g. `renders/shot_`.
    pub path_prefix: String,
    /// Output encoding; `None` follows the host's configured format.
    pub format: Option<OutputFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path_prefix: "out/".to_string(),
            format: None,
        }
    }
}

/// How a fractional frame position is handed to the host.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeAddressing {
    /// Position the time cursor at `frame + fraction` directly.
    #[default]
    Fractional,
    /// Stretch the timeline by the subframe multiplier (fps and time remap) and address
    /// subframes as integer frames on the stretched timeline.
    ExpandedTimeline,
}

/// Everything a render run needs besides the host itself.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BlurJob {
    pub sampling: SamplingConfig,
    pub output: OutputConfig,
    pub addressing: TimeAddressing,
    /// Free and re-bake simulation caches before the first frame.
    pub rebake_caches: bool,
}

impl BlurJob {
    pub fn validate(&self) -> BlurResult<()> {
        self.sampling.validate()?;
        if self.output.path_prefix.is_empty() {
            return Err(BlurError::invalid_config("output.path_prefix must not be empty"));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> BlurResult<Self> {
        let job: Self = serde_json::from_str(json)
            .map_err(|e| BlurError::invalid_config(format!("parse job JSON: {e}")))?;
        job.validate()?;
        Ok(job)
    }

    pub fn from_json_path(path: &Path) -> BlurResult<Self> {
        let f = File::open(path)
            .map_err(|e| BlurError::io(format!("open job '{}': {e}", path.display())))?;
        let job: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            BlurError::invalid_config(format!("parse job '{}': {e}", path.display()))
        })?;
        job.validate()?;
        Ok(job)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
