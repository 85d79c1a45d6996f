//! JSON description of a synthetic scene for [`MemoryHost`].
//!
//! Objects are boxes moving along linearly interpolated position keys; the camera eye can be
//! keyed the same way. This is enough to exercise velocity estimation and subframe
//! accumulation without a real renderer.
//!
//! [`MemoryHost`]: crate::host::memory::MemoryHost

use std::{fs::File, io::BufReader, path::Path};

use glam::DVec3;

use crate::{
    config::OutputFormat,
    foundation::{
        core::Resolution,
        error::{BlurError, BlurResult},
    },
    geometry::projector::{CameraView, ObjectKind},
    host::compositor::NodeGraph,
};

/// One position key.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Keyframe {
    /// Scene time in frames; may be fractional.
    pub frame: f64,
    pub value: DVec3,
}

/// Linearly interpolated position over time, held constant outside its keys.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Track(pub Vec<Keyframe>);

impl Track {
    pub fn constant(value: DVec3) -> Self {
        Self(vec![Keyframe { frame: 0.0, value }])
    }

    pub fn linear(from: Keyframe, to: Keyframe) -> Self {
        Self(vec![from, to])
    }

    /// Value at scene time `t`. An empty track sits at the origin.
    pub fn sample(&self, t: f64) -> DVec3 {
        let keys = &self.0;
        let (Some(first), Some(last)) = (keys.first(), keys.last()) else {
            return DVec3::ZERO;
        };
        if t <= first.frame {
            return first.value;
        }
        if t >= last.frame {
            return last.value;
        }
        for pair in keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.frame {
                let span = b.frame - a.frame;
                if span <= 0.0 {
                    return b.value;
                }
                return a.value.lerp(b.value, (t - a.frame) / span);
            }
        }
        last.value
    }

    fn validate(&self, what: &str) -> BlurResult<()> {
        for k in &self.0 {
            if !k.frame.is_finite() {
                return Err(BlurError::invalid_config(format!(
                    "{what}: key frame must be finite"
                )));
            }
        }
        if self.0.windows(2).any(|w| w[1].frame < w[0].frame) {
            return Err(BlurError::invalid_config(format!(
                "{what}: keys must be sorted by frame"
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ResolutionSpec {
    pub width: u32,
    pub height: u32,
    /// Render size percentage applied to `width`/`height`.
    pub percentage: u32,
}

impl Default for ResolutionSpec {
    fn default() -> Self {
        Self {
            width: 320,
            height: 180,
            percentage: 100,
        }
    }
}

impl ResolutionSpec {
    pub fn effective(&self) -> Resolution {
        Resolution::scaled(self.width, self.height, self.percentage)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Projection {
    Perspective { fov_y_deg: f64 },
    Orthographic { half_height: f64 },
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CameraSpec {
    pub projection: Projection,
    pub eye: Track,
    pub target: DVec3,
    pub up: DVec3,
    pub near: f64,
    pub far: f64,
}

impl Default for CameraSpec {
    fn default() -> Self {
        Self {
            projection: Projection::Perspective { fov_y_deg: 40.0 },
            eye: Track::constant(DVec3::new(0.0, 0.0, 10.0)),
            target: DVec3::ZERO,
            up: DVec3::Y,
            near: 0.1,
            far: 100.0,
        }
    }
}

impl CameraSpec {
    /// Camera at scene time `t` for a frame of the given aspect ratio.
    pub fn view_at(&self, t: f64, aspect: f64) -> CameraView {
        let eye = self.eye.sample(t);
        match self.projection {
            Projection::Perspective { fov_y_deg } => CameraView::perspective(
                eye,
                self.target,
                self.up,
                fov_y_deg,
                aspect,
                self.near,
                self.far,
            ),
            Projection::Orthographic { half_height } => CameraView::orthographic(
                eye,
                self.target,
                self.up,
                half_height,
                aspect,
                self.near,
                self.far,
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ObjectSpec {
    pub id: String,
    pub kind: ObjectKind,
    pub hide_render: bool,
    /// Half size of the box along each local axis.
    pub half_extents: DVec3,
    /// Flat linear RGBA the box is drawn with.
    pub color: [f32; 4],
    pub position: Track,
}

impl Default for ObjectSpec {
    fn default() -> Self {
        Self {
            id: String::new(),
            kind: ObjectKind::Mesh,
            hide_render: false,
            half_extents: DVec3::splat(0.5),
            color: [1.0, 1.0, 1.0, 1.0],
            position: Track::default(),
        }
    }
}

/// Complete synthetic scene.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SceneSpec {
    pub resolution: ResolutionSpec,
    pub fps: u32,
    pub background: [f32; 4],
    pub camera: CameraSpec,
    pub objects: Vec<ObjectSpec>,
    /// Compositor graph; the default render graph when omitted.
    pub compositor: Option<NodeGraph>,
    pub output_format: OutputFormat,
    /// Initial state of the host's own motion blur toggle.
    pub native_motion_blur: bool,
}

impl Default for SceneSpec {
    fn default() -> Self {
        Self {
            resolution: ResolutionSpec::default(),
            fps: 24,
            background: [0.0, 0.0, 0.0, 1.0],
            camera: CameraSpec::default(),
            objects: Vec::new(),
            compositor: None,
            output_format: OutputFormat::Png8,
            native_motion_blur: false,
        }
    }
}

impl SceneSpec {
    pub fn validate(&self) -> BlurResult<()> {
        let res = self.resolution.effective();
        if res.width == 0 || res.height == 0 {
            return Err(BlurError::invalid_config(
                "scene resolution must be non-zero",
            ));
        }
        if self.fps == 0 {
            return Err(BlurError::invalid_config("scene fps must be > 0"));
        }
        let cam = &self.camera;
        if !(cam.near > 0.0 && cam.far > cam.near) {
            return Err(BlurError::invalid_config(
                "camera clip range must satisfy 0 < near < far",
            ));
        }
        cam.eye.validate("camera.eye")?;

        let mut seen = std::collections::HashSet::new();
        for obj in &self.objects {
            if obj.id.is_empty() {
                return Err(BlurError::invalid_config("object id must not be empty"));
            }
            if !seen.insert(obj.id.as_str()) {
                return Err(BlurError::invalid_config(format!(
                    "duplicate object id '{}'",
                    obj.id
                )));
            }
            obj.position.validate(&format!("objects['{}'].position", obj.id))?;
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> BlurResult<Self> {
        let spec: Self = serde_json::from_str(json)
            .map_err(|e| BlurError::invalid_config(format!("parse scene JSON: {e}")))?;
        spec.validate()?;
        Ok(spec)
    }

    pub fn from_json_path(path: &Path) -> BlurResult<Self> {
        let f = File::open(path)
            .map_err(|e| BlurError::io(format!("open scene '{}': {e}", path.display())))?;
        let spec: Self = serde_json::from_reader(BufReader::new(f)).map_err(|e| {
            BlurError::invalid_config(format!("parse scene '{}': {e}", path.display()))
        })?;
        spec.validate()?;
        Ok(spec)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/scene_file.rs"]
mod tests;
