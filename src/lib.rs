//! shutterblur approximates camera motion blur for renderers without a temporal blur of their
//! own: every output frame is rendered as several subframes spread over the open shutter and
//! averaged into one gamma-encoded image.
//!
//! # Pipeline overview
//!
//! 1. **Plan**: `SamplingConfig (+ velocity) -> SamplePlan` (how many subframes, at which offsets)
//! 2. **Estimate** (adaptive mode): project every visible object one frame either side of the
//!    current frame and take the fastest screen-space motion in pixels per frame
//! 3. **Render**: one host render per subframe, read back from the capture buffer
//! 4. **Accumulate**: running mean of the subframes, gamma-encoded when the frame completes
//! 5. **Save**: `<prefix><frame:04><ext>` through the host's image sink
//!
//! The host renderer, scene and compositor are reached only through the traits in [`host`].
//! [`MemoryHost`] implements them in memory for tests and the command-line tool.
//!
//! Host render state (native motion blur, frame rate, time remap, current frame) is changed
//! only through [`HostStateGuard`], which restores it on every exit path.
#![forbid(unsafe_code)]

pub mod accumulate;
pub mod config;
pub mod driver;
pub mod encode;
pub mod foundation;
pub mod geometry;
pub mod host;
pub mod plan;
pub mod velocity;

pub use accumulate::accumulator::{Accumulator, accumulate, encode_gamma};
pub use accumulate::buffer::PixelBuffer;
pub use config::{
    BlurJob, DEFAULT_GAMMA_EXPONENT, GammaExponent, OutputConfig, OutputFormat, SamplingConfig,
    SamplingMode, TimeAddressing,
};
pub use driver::frame::{
    CancelToken, EtaEstimator, FrameDriver, FramePlan, FrameReport, RangeProgress, RangeReport,
    plan_frame, prepare_run, render_frame, render_range,
};
pub use driver::state::{HostStateGuard, subframe_render_state};
pub use encode::image_out::{ensure_parent_dir, frame_output_path, save_pixel_buffer};
pub use foundation::core::{BufferShape, FrameIndex, FrameRange, Resolution, SubframeTime};
pub use foundation::error::{BlurError, BlurResult};
pub use geometry::projector::{
    Aabb, CameraView, ObjectId, ObjectKind, ObjectProjection, ProjectedBounds, ProjectionError,
    SceneObject, ScreenPoint, project_object, project_point,
};
pub use host::compositor::{NodeGraph, NodeKind, WiringOutcome, ensure_capture_wired};
pub use host::memory::{HostEvent, MemoryHost, SavedImage};
pub use host::scene_file::SceneSpec;
pub use host::{
    CAPTURE_BUFFER, CompositorSetup, Host, HostRenderState, ImageSink, RenderStateControl,
    SceneSource, SubframeRenderer,
};
pub use plan::planner::{FrameRequest, SampleNode, SamplePlan, plan_samples};
pub use velocity::estimator::{VelocityReport, VelocitySample, estimate_max_velocity};
