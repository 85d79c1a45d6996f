//! Collaborator boundary: everything the engine needs from the host renderer/compositor.
//!
//! The engine never talks to a concrete renderer. Every call goes through these traits, so
//! the numeric core runs the same against a production host and against [`MemoryHost`].
//!
//! [`MemoryHost`]: crate::host::memory::MemoryHost

pub mod compositor;
pub mod memory;
pub mod scene_file;

use std::path::Path;

use crate::{
    accumulate::buffer::PixelBuffer,
    config::OutputFormat,
    foundation::core::{FrameIndex, Resolution},
    geometry::projector::{CameraView, SceneObject},
    host::compositor::WiringOutcome,
};

/// Name of the buffer the capture node writes rendered pixels into.
pub const CAPTURE_BUFFER: &str = "Viewer Node";

/// Scene access at the host's time cursor.
pub trait SceneSource {
    /// Position the scene at `frame + fraction`, `fraction` in `[0, 1)`.
    fn set_time_cursor(&mut self, frame: FrameIndex, fraction: f64) -> anyhow::Result<()>;

    /// Objects as evaluated at the current time cursor.
    fn objects(&self) -> anyhow::Result<Vec<SceneObject>>;

    /// Active camera at the current time cursor.
    fn camera(&self) -> anyhow::Result<CameraView>;

    /// Effective render resolution (base size times percentage).
    fn render_resolution(&self) -> Resolution;

    /// Free and re-bake simulation caches. Hosts without caches keep the default.
    fn rebake_caches(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// The host renderer, invoked once per subframe.
pub trait SubframeRenderer {
    /// Render the current time cursor into the host's named buffers. Blocking.
    fn render_current_frame(&mut self) -> anyhow::Result<()>;

    /// Flat RGBA, row-major, linear-light `f32` pixels of a named buffer.
    fn read_named_buffer(&self, name: &str) -> anyhow::Result<Vec<f32>>;

    /// Output encoding the host is configured for.
    fn output_format(&self) -> OutputFormat;
}

/// Host settings the driver perturbs while rendering subframes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostRenderState {
    /// The host's own (approximate) motion blur; disabled while subframes render.
    pub native_motion_blur: bool,
    pub fps: u32,
    pub time_remap_old: u32,
    pub time_remap_new: u32,
    pub current_frame: FrameIndex,
}

impl Default for HostRenderState {
    fn default() -> Self {
        Self {
            native_motion_blur: false,
            fps: 24,
            time_remap_old: 100,
            time_remap_new: 100,
            current_frame: FrameIndex(1),
        }
    }
}

pub trait RenderStateControl {
    fn render_state(&self) -> HostRenderState;

    fn apply_render_state(&mut self, state: &HostRenderState) -> anyhow::Result<()>;
}

/// Persists finished frames.
pub trait ImageSink {
    fn save_image(
        &mut self,
        buffer: &PixelBuffer,
        path: &Path,
        format: OutputFormat,
    ) -> anyhow::Result<()>;
}

/// One-time compositor setup so rendered pixels can be read back.
pub trait CompositorSetup {
    /// Attach a capture node in parallel with the final output. Must be idempotent.
    fn ensure_capture_wired(&mut self) -> anyhow::Result<WiringOutcome>;
}

/// Everything the frame driver needs from a host.
pub trait Host:
    SceneSource + SubframeRenderer + RenderStateControl + ImageSink + CompositorSetup
{
}

impl<T> Host for T where
    T: SceneSource + SubframeRenderer + RenderStateControl + ImageSink + CompositorSetup + ?Sized
{
}
