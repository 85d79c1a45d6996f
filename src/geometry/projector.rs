use glam::{DMat4, DVec3, DVec4};
use kurbo::{Point, Rect};

use crate::foundation::core::Resolution;

/// Clip-space `w` below which a point counts as behind the camera.
const NEAR_W_EPS: f64 = 1e-9;

/// Axis-aligned box in an object's local space.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Aabb {
    pub min: DVec3,
    pub max: DVec3,
}

impl Aabb {
    pub fn new(min: DVec3, max: DVec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Box of half-extent `half` centred on the origin.
    pub fn centered(half: DVec3) -> Self {
        Self::new(-half, half)
    }

    pub fn corners(&self) -> [DVec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            DVec3::new(a.x, a.y, a.z),
            DVec3::new(a.x, a.y, b.z),
            DVec3::new(a.x, b.y, b.z),
            DVec3::new(a.x, b.y, a.z),
            DVec3::new(b.x, a.y, a.z),
            DVec3::new(b.x, a.y, b.z),
            DVec3::new(b.x, b.y, b.z),
            DVec3::new(b.x, b.y, a.z),
        ]
    }
}

/// Object category as reported by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Mesh,
    Curve,
    Surface,
    Meta,
    Text,
    Light,
    Camera,
    Empty,
    Armature,
    Other,
}

impl ObjectKind {
    /// Kinds that produce rendered geometry.
    pub fn is_mesh_like(self) -> bool {
        matches!(
            self,
            Self::Mesh | Self::Curve | Self::Surface | Self::Meta | Self::Text
        )
    }
}

/// Host-side identity of a scene object.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Snapshot of one object at the host's current time cursor.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneObject {
    pub id: ObjectId,
    pub kind: ObjectKind,
    pub hide_render: bool,
    /// Local-to-world transform.
    pub transform: DMat4,
    pub local_bounds: Aabb,
}

impl SceneObject {
    /// Hidden objects and non-geometry kinds are never rendered and never blur.
    pub fn is_renderable(&self) -> bool {
        !self.hide_render && self.kind.is_mesh_like()
    }

    /// World-space position of the two opposing extremal corners (local min and max).
    pub fn extremal_corners_world(&self) -> [DVec3; 2] {
        [
            self.transform.transform_point3(self.local_bounds.min),
            self.transform.transform_point3(self.local_bounds.max),
        ]
    }

    pub fn corners_world(&self) -> [DVec3; 8] {
        self.local_bounds
            .corners()
            .map(|c| self.transform.transform_point3(c))
    }
}

/// Active camera as a world-to-clip matrix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraView {
    pub view_projection: DMat4,
}

impl CameraView {
    pub fn from_matrix(view_projection: DMat4) -> Self {
        Self { view_projection }
    }

    pub fn perspective(
        eye: DVec3,
        target: DVec3,
        up: DVec3,
        fov_y_deg: f64,
        aspect: f64,
        near: f64,
        far: f64,
    ) -> Self {
        let view = DMat4::look_at_rh(eye, target, up);
        let proj = DMat4::perspective_rh(fov_y_deg.to_radians(), aspect, near, far);
        Self::from_matrix(proj * view)
    }

    /// Orthographic camera looking from `eye` to `target`; `half_height` is in world units.
    pub fn orthographic(
        eye: DVec3,
        target: DVec3,
        up: DVec3,
        half_height: f64,
        aspect: f64,
        near: f64,
        far: f64,
    ) -> Self {
        let view = DMat4::look_at_rh(eye, target, up);
        let hw = half_height * aspect;
        let proj = DMat4::orthographic_rh(-hw, hw, -half_height, half_height, near, far);
        Self::from_matrix(proj * view)
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ProjectionError {
    #[error("non-finite {0} while projecting")]
    NonFinite(&'static str),
}

/// A point in normalized screen space: `(0, 0)` is the bottom-left corner of the frame,
/// `(1, 1)` the top-right. `depth` is the clip-space `w`, positive in front of the camera.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScreenPoint {
    pub pos: Point,
    pub depth: f64,
}

impl ScreenPoint {
    pub fn in_front(self) -> bool {
        self.depth > NEAR_W_EPS
    }

    /// Pixel coordinates at `resolution`.
    pub fn to_pixels(self, resolution: Resolution) -> Point {
        Point::new(
            self.pos.x * f64::from(resolution.width),
            self.pos.y * f64::from(resolution.height),
        )
    }
}

pub fn project_point(camera: &CameraView, world: DVec3) -> Result<ScreenPoint, ProjectionError> {
    if !world.is_finite() {
        return Err(ProjectionError::NonFinite("world position"));
    }
    let clip: DVec4 = camera.view_projection * world.extend(1.0);
    if !clip.is_finite() {
        return Err(ProjectionError::NonFinite("clip position"));
    }
    let w = clip.w;
    // Behind the camera the divide flips the image, the same as the host's own helper.
    let w_div = if w.abs() < NEAR_W_EPS {
        NEAR_W_EPS.copysign(w)
    } else {
        w
    };
    let ndc_x = clip.x / w_div;
    let ndc_y = clip.y / w_div;
    Ok(ScreenPoint {
        pos: Point::new(ndc_x * 0.5 + 0.5, ndc_y * 0.5 + 0.5),
        depth: w,
    })
}

/// Screen-space rectangle spanned by a set of projected points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProjectedBounds {
    pub min: Point,
    pub max: Point,
    pub any_in_front: bool,
}

impl ProjectedBounds {
    pub fn from_points(points: impl IntoIterator<Item = ScreenPoint>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut out = Self {
            min: first.pos,
            max: first.pos,
            any_in_front: first.in_front(),
        };
        for p in iter {
            out.min = Point::new(out.min.x.min(p.pos.x), out.min.y.min(p.pos.y));
            out.max = Point::new(out.max.x.max(p.pos.x), out.max.y.max(p.pos.y));
            out.any_in_front |= p.in_front();
        }
        Some(out)
    }

    /// Conservative on-screen test: the bounding rectangle overlaps the unit screen square.
    ///
    /// Can report objects whose box overlaps the frame while their geometry does not.
    pub fn is_in_camera(&self) -> bool {
        self.any_in_front
            && self.min.x < 1.0
            && self.min.y < 1.0
            && self.max.x > 0.0
            && self.max.y > 0.0
    }

    pub fn as_rect(&self) -> Rect {
        Rect::from_points(self.min, self.max)
    }
}

/// The two tracked corners used for velocity plus the full-box bounds used for visibility.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObjectProjection {
    pub tracked: [ScreenPoint; 2],
    pub bounds: ProjectedBounds,
}

impl ObjectProjection {
    pub fn is_in_camera(&self) -> bool {
        self.bounds.is_in_camera()
    }
}

/// Project an object's box at whatever time the host is currently positioned at.
///
/// Only the two opposing extremal corners are tracked for velocity: under affine motion the
/// displacement of those corners bounds the displacement of every interior point.
pub fn project_object(
    camera: &CameraView,
    object: &SceneObject,
) -> Result<ObjectProjection, ProjectionError> {
    if !object.transform.is_finite() {
        return Err(ProjectionError::NonFinite("object transform"));
    }
    let [a, b] = object.extremal_corners_world();
    let tracked = [project_point(camera, a)?, project_point(camera, b)?];

    let mut projected = Vec::with_capacity(8);
    for c in object.corners_world() {
        projected.push(project_point(camera, c)?);
    }
    let bounds = ProjectedBounds::from_points(projected)
        .ok_or(ProjectionError::NonFinite("bounding box"))?;

    Ok(ObjectProjection { tracked, bounds })
}

#[cfg(test)]
#[path = "../../tests/unit/geometry/projector.rs"]
mod tests;
