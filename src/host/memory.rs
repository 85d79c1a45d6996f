//! In-memory host: a [`SceneSpec`] evaluated on demand and rasterized as flat-shaded boxes.
//!
//! Every host call is appended to an event log so callers can check what the engine did and
//! in which order (for instance that render state was restored before an error surfaced).

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use glam::DMat4;

use crate::{
    accumulate::buffer::PixelBuffer,
    config::OutputFormat,
    encode::image_out::save_pixel_buffer,
    foundation::core::{BufferShape, FrameIndex, Resolution},
    geometry::projector::{
        Aabb, CameraView, ObjectId, ProjectedBounds, SceneObject, project_point,
    },
    host::{
        CAPTURE_BUFFER, CompositorSetup, HostRenderState, ImageSink, RenderStateControl,
        SceneSource, SubframeRenderer,
        compositor::{self, NodeGraph, WiringOutcome},
        scene_file::SceneSpec,
    },
};

/// Buffer the renderer always writes, capture node or not.
pub const RENDER_RESULT: &str = "Render Result";

/// Called after each completed render with the number of renders so far.
pub type RenderHook = Box<dyn FnMut(usize) -> anyhow::Result<()> + Send>;

/// One host call, in the order it was made.
#[derive(Clone, Debug, PartialEq)]
pub enum HostEvent {
    TimeCursor { frame: FrameIndex, fraction: f64 },
    Render,
    ApplyState(HostRenderState),
    Save(PathBuf),
    Rebake,
    Wire(WiringOutcome),
}

/// A frame handed to [`ImageSink::save_image`].
#[derive(Clone, Debug)]
pub struct SavedImage {
    pub path: PathBuf,
    pub format: OutputFormat,
    pub buffer: PixelBuffer,
}

pub struct MemoryHost {
    scene: SceneSpec,
    graph: NodeGraph,
    state: HostRenderState,
    fraction: f64,
    resolution: Resolution,
    resize_after: Option<(usize, Resolution)>,
    buffers: HashMap<String, Vec<f32>>,
    render_hook: Option<RenderHook>,
    write_files: bool,
    renders: usize,
    rebakes: usize,
    saved: Vec<SavedImage>,
    events: Vec<HostEvent>,
}

impl std::fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryHost")
            .field("state", &self.state)
            .field("resolution", &self.resolution)
            .field("renders", &self.renders)
            .field("saved", &self.saved.len())
            .finish_non_exhaustive()
    }
}

impl MemoryHost {
    pub fn new(scene: SceneSpec) -> Self {
        let graph = scene
            .compositor
            .clone()
            .unwrap_or_else(NodeGraph::default_render_graph);
        let state = HostRenderState {
            native_motion_blur: scene.native_motion_blur,
            fps: scene.fps,
            ..HostRenderState::default()
        };
        let resolution = scene.resolution.effective();
        Self {
            scene,
            graph,
            state,
            fraction: 0.0,
            resolution,
            resize_after: None,
            buffers: HashMap::new(),
            render_hook: None,
            write_files: false,
            renders: 0,
            rebakes: 0,
            saved: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Encode saved frames to disk in addition to recording them.
    pub fn with_file_output(mut self) -> Self {
        self.write_files = true;
        self
    }

    pub fn with_render_hook(mut self, hook: RenderHook) -> Self {
        self.render_hook = Some(hook);
        self
    }

    /// Switch to `resolution` once `renders` renders have completed.
    pub fn with_resize_after(mut self, renders: usize, resolution: Resolution) -> Self {
        self.resize_after = Some((renders, resolution));
        self
    }

    pub fn with_render_state(mut self, state: HostRenderState) -> Self {
        self.state = state;
        self
    }

    pub fn scene(&self) -> &SceneSpec {
        &self.scene
    }

    pub fn graph(&self) -> &NodeGraph {
        &self.graph
    }

    pub fn events(&self) -> &[HostEvent] {
        &self.events
    }

    pub fn saved(&self) -> &[SavedImage] {
        &self.saved
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn rebake_count(&self) -> usize {
        self.rebakes
    }

    /// Scene time the cursor addresses, after the time remap.
    pub fn scene_time(&self) -> f64 {
        let cursor = self.state.current_frame.0 as f64 + self.fraction;
        cursor * f64::from(self.state.time_remap_old) / f64::from(self.state.time_remap_new.max(1))
    }

    fn aspect(&self) -> f64 {
        f64::from(self.resolution.width) / f64::from(self.resolution.height.max(1))
    }

    fn rasterize(&self) -> anyhow::Result<Vec<f32>> {
        let shape = BufferShape::rgba(self.resolution);
        let mut img = PixelBuffer::zeros(shape)?;
        let bg = self.scene.background;
        for px in img.data_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&bg);
        }

        let camera = self.camera()?;
        let mut boxes: Vec<(f64, ProjectedBounds, [f32; 4])> = Vec::new();
        for (spec, obj) in self.scene.objects.iter().zip(self.objects()?) {
            if !obj.is_renderable() {
                continue;
            }
            let mut points = Vec::with_capacity(8);
            for c in obj.corners_world() {
                points.push(project_point(&camera, c)?);
            }
            let depth = points.iter().map(|p| p.depth).sum::<f64>() / points.len() as f64;
            if let Some(bounds) = ProjectedBounds::from_points(points)
                && bounds.is_in_camera()
            {
                boxes.push((depth, bounds, spec.color));
            }
        }
        // Painter's order: farthest first.
        boxes.sort_by(|a, b| b.0.total_cmp(&a.0));

        let (w, h) = (self.resolution.width, self.resolution.height);
        for (_, bounds, color) in boxes {
            let rect = bounds.as_rect();
            let span = |lo: f64, hi: f64, n: u32| {
                let n = f64::from(n);
                let a = (lo * n - 0.5).ceil().clamp(0.0, n) as u32;
                let b = (hi * n - 0.5).ceil().clamp(0.0, n) as u32;
                a..b
            };
            for y in span(rect.y0, rect.y1, h) {
                for x in span(rect.x0, rect.x1, w) {
                    let idx = (y as usize * w as usize + x as usize) * 4;
                    if let Some(px) = img.data_mut().get_mut(idx..idx + 4) {
                        px.copy_from_slice(&color);
                    }
                }
            }
        }
        Ok(img.into_vec())
    }
}

impl SceneSource for MemoryHost {
    fn set_time_cursor(&mut self, frame: FrameIndex, fraction: f64) -> anyhow::Result<()> {
        if !fraction.is_finite() || !(0.0..1.0).contains(&fraction) {
            anyhow::bail!("subframe fraction {fraction} is outside [0, 1)");
        }
        self.state.current_frame = frame;
        self.fraction = fraction;
        self.events.push(HostEvent::TimeCursor { frame, fraction });
        Ok(())
    }

    fn objects(&self) -> anyhow::Result<Vec<SceneObject>> {
        let t = self.scene_time();
        Ok(self
            .scene
            .objects
            .iter()
            .map(|o| SceneObject {
                id: ObjectId(o.id.clone()),
                kind: o.kind,
                hide_render: o.hide_render,
                transform: DMat4::from_translation(o.position.sample(t)),
                local_bounds: Aabb::centered(o.half_extents),
            })
            .collect())
    }

    fn camera(&self) -> anyhow::Result<CameraView> {
        Ok(self.scene.camera.view_at(self.scene_time(), self.aspect()))
    }

    fn render_resolution(&self) -> Resolution {
        self.resolution
    }

    fn rebake_caches(&mut self) -> anyhow::Result<()> {
        self.rebakes += 1;
        self.events.push(HostEvent::Rebake);
        Ok(())
    }
}

impl SubframeRenderer for MemoryHost {
    fn render_current_frame(&mut self) -> anyhow::Result<()> {
        self.events.push(HostEvent::Render);
        let pixels = self
            .rasterize()
            .with_context(|| format!("rasterize scene at t={:.4}", self.scene_time()))?;
        if self.graph.has_linked_viewer() {
            self.buffers.insert(CAPTURE_BUFFER.to_string(), pixels.clone());
        }
        self.buffers.insert(RENDER_RESULT.to_string(), pixels);
        self.renders += 1;

        if let Some((after, res)) = self.resize_after
            && self.renders >= after
        {
            self.resolution = res;
        }
        if let Some(hook) = self.render_hook.as_mut() {
            hook(self.renders)?;
        }
        Ok(())
    }

    fn read_named_buffer(&self, name: &str) -> anyhow::Result<Vec<f32>> {
        self.buffers
            .get(name)
            .cloned()
            .with_context(|| format!("no buffer named '{name}' (is the capture node wired?)"))
    }

    fn output_format(&self) -> OutputFormat {
        self.scene.output_format
    }
}

impl RenderStateControl for MemoryHost {
    fn render_state(&self) -> HostRenderState {
        self.state
    }

    fn apply_render_state(&mut self, state: &HostRenderState) -> anyhow::Result<()> {
        if state.fps == 0 || state.time_remap_old == 0 || state.time_remap_new == 0 {
            anyhow::bail!("render state {state:?} has a zero rate");
        }
        self.state = *state;
        self.events.push(HostEvent::ApplyState(*state));
        Ok(())
    }
}

impl ImageSink for MemoryHost {
    fn save_image(
        &mut self,
        buffer: &PixelBuffer,
        path: &Path,
        format: OutputFormat,
    ) -> anyhow::Result<()> {
        if self.write_files {
            save_pixel_buffer(buffer, path, format)?;
        }
        self.events.push(HostEvent::Save(path.to_path_buf()));
        self.saved.push(SavedImage {
            path: path.to_path_buf(),
            format,
            buffer: buffer.clone(),
        });
        Ok(())
    }
}

impl CompositorSetup for MemoryHost {
    fn ensure_capture_wired(&mut self) -> anyhow::Result<WiringOutcome> {
        let outcome = compositor::ensure_capture_wired(&mut self.graph)?;
        self.events.push(HostEvent::Wire(outcome));
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/host/memory.rs"]
mod tests;
