use std::{
    path::PathBuf,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use crate::{
    accumulate::accumulator::Accumulator,
    config::{BlurJob, SamplingConfig, SamplingMode, TimeAddressing},
    driver::state::HostStateGuard,
    encode::image_out::frame_output_path,
    foundation::{
        core::{BufferShape, FrameIndex, FrameRange, Resolution},
        error::{BlurError, BlurResult},
    },
    host::{CAPTURE_BUFFER, Host, SceneSource},
    plan::planner::{FrameRequest, SamplePlan, plan_samples},
    velocity::estimator::{VelocityReport, estimate_max_velocity},
};

/// Cooperative interrupt flag, checked between subframes.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Sample plan for one frame, with the velocity scan that produced it in adaptive mode.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct FramePlan {
    pub request: FrameRequest,
    pub plan: SamplePlan,
    pub velocity: Option<VelocityReport>,
}

/// Outcome of one rendered frame.
#[derive(Clone, Debug, serde::Serialize)]
pub struct FrameReport {
    pub frame: FrameIndex,
    pub plan: SamplePlan,
    pub velocity: Option<VelocityReport>,
    pub elapsed: Duration,
    pub output_path: PathBuf,
}

#[derive(Clone, Debug, Default, serde::Serialize)]
pub struct RangeReport {
    pub frames: Vec<FrameReport>,
    pub total_elapsed: Duration,
    pub average_frame_time: Duration,
}

/// Handed to the range progress callback after every frame.
#[derive(Clone, Copy, Debug)]
pub struct RangeProgress<'a> {
    pub report: &'a FrameReport,
    pub done: u64,
    pub total: u64,
    /// Estimated time left for the remaining frames.
    pub eta: Duration,
}

/// Two-point rolling average of consecutive frame times.
#[derive(Clone, Copy, Debug, Default)]
pub struct EtaEstimator {
    last: Option<Duration>,
}

impl EtaEstimator {
    /// Record a finished frame and return the smoothed frame time.
    pub fn observe(&mut self, frame_time: Duration) -> Duration {
        let smoothed = match self.last {
            Some(prev) => (prev + frame_time) / 2,
            None => frame_time,
        };
        self.last = Some(frame_time);
        smoothed
    }

    pub fn eta(&mut self, frame_time: Duration, remaining: u64) -> Duration {
        self.observe(frame_time).mul_f64(remaining as f64)
    }
}

/// Decide the sample plan for `request`, scanning scene motion in adaptive mode.
///
/// The scan moves the host's time cursor; callers that care hold a [`HostStateGuard`].
pub fn plan_frame<S: SceneSource + ?Sized>(
    scene: &mut S,
    request: &FrameRequest,
    sampling: &SamplingConfig,
) -> BlurResult<FramePlan> {
    let velocity = match request.mode {
        SamplingMode::Static => None,
        SamplingMode::Adaptive => Some(estimate_max_velocity(scene, request.frame)?),
    };
    let v = velocity.as_ref().map_or(0.0, |r| r.max_px_per_frame);
    let plan = plan_samples(sampling, v)?;
    Ok(FramePlan {
        request: *request,
        plan,
        velocity,
    })
}

/// Free and re-bake simulation caches once per run when the job asks for it.
pub fn prepare_run<H: Host + ?Sized>(host: &mut H, job: &BlurJob) -> BlurResult<()> {
    job.validate()?;
    if job.rebake_caches {
        tracing::info!("re-baking simulation caches");
        host.rebake_caches()
            .map_err(|e| BlurError::Other(e.context("re-bake simulation caches")))?;
    }
    Ok(())
}

fn wire_capture<H: Host + ?Sized>(host: &mut H) -> BlurResult<()> {
    host.ensure_capture_wired().map_err(|e| match e.downcast::<BlurError>() {
        Ok(err) => err,
        Err(e) => BlurError::compositor(format!("{e:#}")),
    })?;
    Ok(())
}

/// Renders frames one at a time, reusing a single accumulation slot.
#[derive(Debug, Default)]
pub struct FrameDriver {
    accumulator: Accumulator,
}

impl FrameDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render, accumulate and save one output frame.
    ///
    /// Host render state is snapshotted before anything touches the host and restored on
    /// every exit path, cancellation and render failure included, before the error
    /// reaches the caller.
    #[tracing::instrument(skip_all, fields(frame = %frame))]
    pub fn render_frame<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        frame: FrameIndex,
        job: &BlurJob,
        cancel: &CancelToken,
    ) -> BlurResult<FrameReport> {
        let started = Instant::now();
        job.validate()?;
        wire_capture(host)?;

        let format = job.output.format.unwrap_or_else(|| host.output_format());
        let output_path = frame_output_path(&job.output.path_prefix, frame, format);
        let request = FrameRequest::new(frame, &job.sampling);

        let mut guard = HostStateGuard::acquire(host)?;
        let FramePlan { plan, velocity, .. } = plan_frame(&mut *guard, &request, &job.sampling)?;
        tracing::debug!(
            samples = plan.sample_count,
            multiplier = plan.subframe_multiplier,
            "frame planned"
        );
        guard.apply_addressing(job.addressing, &plan)?;

        self.accumulate_subframes(&mut *guard, frame, &plan, job.addressing, cancel)?;
        let image = self.accumulator.finish(job.sampling.gamma_exponent)?;
        guard
            .save_image(image, &output_path, format)
            .map_err(|e| {
                BlurError::io(format!(
                    "save frame {frame} to '{}': {e:#}",
                    output_path.display()
                ))
            })?;
        guard.release()?;

        let elapsed = started.elapsed();
        tracing::info!(
            samples = plan.sample_count,
            elapsed_ms = elapsed.as_secs_f64() * 1e3,
            path = %output_path.display(),
            "frame rendered"
        );
        Ok(FrameReport {
            frame,
            plan,
            velocity,
            elapsed,
            output_path,
        })
    }

    fn accumulate_subframes<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        frame: FrameIndex,
        plan: &SamplePlan,
        addressing: TimeAddressing,
        cancel: &CancelToken,
    ) -> BlurResult<()> {
        self.accumulator.begin(plan.sample_count)?;
        let expected = BufferShape::rgba(host.render_resolution());
        for node in plan.nodes() {
            if cancel.is_cancelled() {
                tracing::warn!(subframe = node.index, "render cancelled");
                return Err(BlurError::Cancelled {
                    frame,
                    subframe: node.index,
                });
            }
            let fail = move |e: anyhow::Error| BlurError::render_failure(frame, node.index, e);

            let (at, fraction) = match addressing {
                TimeAddressing::Fractional => (frame, node.offset),
                TimeAddressing::ExpandedTimeline => (plan.expanded_frame(frame, node.index), 0.0),
            };
            host.set_time_cursor(at, fraction)
                .map_err(|e| fail(e.context(format!("seek to {at}+{fraction:.6}"))))?;
            host.render_current_frame().map_err(fail)?;
            let pixels = host
                .read_named_buffer(CAPTURE_BUFFER)
                .map_err(|e| fail(e.context("read capture buffer")))?;

            if Some(pixels.len()) != expected.sample_len() {
                return Err(BlurError::ShapeMismatch {
                    frame: Some(frame),
                    subframe: node.index,
                    expected,
                    found: readback_shape(host.render_resolution(), pixels.len()),
                });
            }
            self.accumulator.add(expected, &pixels)?;
            tracing::debug!(subframe = node.index, offset = node.offset, "subframe accumulated");
        }
        Ok(())
    }

    /// Dry run: plan every frame of `range` without rendering.
    pub fn plan_range<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        range: FrameRange,
        job: &BlurJob,
    ) -> BlurResult<Vec<FramePlan>> {
        job.validate()?;
        let mut guard = HostStateGuard::acquire(host)?;
        let mut plans = Vec::new();
        for frame in range.iter() {
            let request = FrameRequest::new(frame, &job.sampling);
            plans.push(plan_frame(&mut *guard, &request, &job.sampling)?);
        }
        guard.release()?;
        Ok(plans)
    }

    /// Render every frame of `range` in order.
    ///
    /// The first failing frame aborts the rest of the range; its error is logged and
    /// returned unchanged. `progress` is called after every finished frame.
    #[tracing::instrument(skip_all, fields(start = %range.start, end = %range.end, step = range.step))]
    pub fn render_range<H, P>(
        &mut self,
        host: &mut H,
        range: FrameRange,
        job: &BlurJob,
        cancel: &CancelToken,
        mut progress: P,
    ) -> BlurResult<RangeReport>
    where
        H: Host + ?Sized,
        P: FnMut(&RangeProgress<'_>),
    {
        let started = Instant::now();
        prepare_run(host, job)?;

        let total = range.len_frames();
        let mut eta = EtaEstimator::default();
        let mut report = RangeReport::default();
        for (done, frame) in (1u64..).zip(range.iter()) {
            let frame_report = match self.render_frame(host, frame, job, cancel) {
                Ok(r) => r,
                Err(err) => {
                    tracing::error!(frame = %frame, error = %err, "frame failed; aborting range");
                    return Err(err);
                }
            };
            let remaining = total - done;
            let left = eta.eta(frame_report.elapsed, remaining);
            tracing::info!(
                frame = %frame,
                done,
                total,
                eta_s = left.as_secs_f64(),
                "range progress"
            );
            progress(&RangeProgress {
                report: &frame_report,
                done,
                total,
                eta: left,
            });
            report.frames.push(frame_report);
        }

        report.total_elapsed = started.elapsed();
        if let Ok(n) = u32::try_from(report.frames.len())
            && n > 0
        {
            report.average_frame_time = report.total_elapsed / n;
        }
        Ok(report)
    }
}

/// Render the host's frame `frame` as a complete run.
pub fn render_frame<H: Host + ?Sized>(
    host: &mut H,
    frame: FrameIndex,
    job: &BlurJob,
    cancel: &CancelToken,
) -> BlurResult<FrameReport> {
    prepare_run(host, job)?;
    FrameDriver::new().render_frame(host, frame, job, cancel)
}

/// Render `range` as a complete run.
pub fn render_range<H, P>(
    host: &mut H,
    range: FrameRange,
    job: &BlurJob,
    cancel: &CancelToken,
    progress: P,
) -> BlurResult<RangeReport>
where
    H: Host + ?Sized,
    P: FnMut(&RangeProgress<'_>),
{
    FrameDriver::new().render_range(host, range, job, cancel, progress)
}

/// Shape of a capture buffer of `len` samples. The host's current resolution is trusted when it
/// accounts for every sample, otherwise the buffer is reported as one RGBA row.
fn readback_shape(resolution: Resolution, len: usize) -> BufferShape {
    let reported = BufferShape::rgba(resolution);
    if reported.sample_len() == Some(len) {
        return reported;
    }
    let width = u32::try_from(len / BufferShape::RGBA as usize).unwrap_or(u32::MAX);
    BufferShape::new(width, 1, BufferShape::RGBA)
}

#[cfg(test)]
#[path = "../../tests/unit/driver/frame.rs"]
mod tests;
