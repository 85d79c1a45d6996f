use std::collections::BTreeMap;

use anyhow::Context as _;

use crate::{
    foundation::{
        core::{FrameIndex, Resolution},
        error::BlurResult,
    },
    geometry::projector::{ObjectId, ObjectProjection, ProjectionError, project_object},
    host::SceneSource,
};

/// Frames on each side of the current frame the estimator samples.
const HALF_WINDOW: i64 = 1;

/// Screen-space motion of one object around the current frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct VelocitySample {
    pub object: ObjectId,
    /// Largest tracked-corner displacement, in pixels per frame.
    pub px_per_frame: f64,
}

/// Scene-wide result of one velocity scan.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct VelocityReport {
    /// Worst-case displacement over all visible objects, pixels per frame. `0` when nothing
    /// visible moves.
    pub max_px_per_frame: f64,
    pub samples: Vec<VelocitySample>,
    /// Objects dropped because they could not be projected.
    pub skipped: usize,
}

impl VelocityReport {
    pub fn fastest(&self) -> Option<&VelocitySample> {
        self.samples
            .iter()
            .max_by(|a, b| a.px_per_frame.total_cmp(&b.px_per_frame))
    }
}

type WindowEnd = BTreeMap<ObjectId, Result<ObjectProjection, ProjectionError>>;

fn sample_window_end<S: SceneSource + ?Sized>(
    scene: &mut S,
    frame: FrameIndex,
) -> anyhow::Result<WindowEnd> {
    scene
        .set_time_cursor(frame, 0.0)
        .with_context(|| format!("seek to frame {frame} for velocity scan"))?;
    let camera = scene
        .camera()
        .with_context(|| format!("read camera at frame {frame}"))?;
    let objects = scene
        .objects()
        .with_context(|| format!("read scene objects at frame {frame}"))?;

    Ok(objects
        .iter()
        .filter(|o| o.is_renderable())
        .map(|o| (o.id.clone(), project_object(&camera, o)))
        .collect())
}

fn corner_displacement_px(
    before: &ObjectProjection,
    after: &ObjectProjection,
    resolution: Resolution,
) -> f64 {
    before
        .tracked
        .iter()
        .zip(after.tracked.iter())
        .map(|(a, b)| {
            a.to_pixels(resolution)
                .distance(b.to_pixels(resolution))
        })
        .fold(0.0, f64::max)
}

/// Estimate the fastest on-screen motion around `frame`, in pixels per frame.
///
/// Every renderable object is projected at `frame - 1` and `frame + 1`; the larger of its two
/// tracked-corner displacements over that window, halved, is its per-frame velocity. Objects
/// out of camera at both ends are ignored, including one that crosses the whole frame between
/// the two samples. The scene maximum is returned with the per-object samples.
///
/// The time cursor is left wherever the scan finished; callers position it for rendering.
/// Objects whose projection fails are logged and counted in [`VelocityReport::skipped`].
#[tracing::instrument(skip_all, fields(frame = %frame))]
pub fn estimate_max_velocity<S: SceneSource + ?Sized>(
    scene: &mut S,
    frame: FrameIndex,
) -> BlurResult<VelocityReport> {
    let resolution = scene.render_resolution();
    let before = sample_window_end(scene, frame.offset(-HALF_WINDOW))?;
    let after = sample_window_end(scene, frame.offset(HALF_WINDOW))?;

    let mut report = VelocityReport::default();
    for (id, start) in &before {
        let Some(end) = after.get(id) else {
            tracing::debug!(object = %id, "object missing at window end; ignored");
            continue;
        };
        let (start, end) = match (start, end) {
            (Ok(s), Ok(e)) => (s, e),
            (Err(err), _) | (_, Err(err)) => {
                tracing::warn!(object = %id, error = %err, "skipping object in velocity scan");
                report.skipped += 1;
                continue;
            }
        };
        if !start.is_in_camera() && !end.is_in_camera() {
            continue;
        }

        let window_frames = (2 * HALF_WINDOW) as f64;
        let px_per_frame = corner_displacement_px(start, end, resolution) / window_frames;
        report.max_px_per_frame = report.max_px_per_frame.max(px_per_frame);
        report.samples.push(VelocitySample {
            object: id.clone(),
            px_per_frame,
        });
    }

    if report.skipped > 0 {
        tracing::warn!(skipped = report.skipped, "velocity scan skipped objects");
    }
    tracing::debug!(max_px_per_frame = report.max_px_per_frame, "velocity scan done");
    Ok(report)
}

#[cfg(test)]
#[path = "../../tests/unit/velocity/estimator.rs"]
mod tests;
