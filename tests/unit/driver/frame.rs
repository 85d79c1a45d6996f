use super::*;
use crate::host::{
    RenderStateControl,
    memory::{HostEvent, MemoryHost},
    scene_file::SceneSpec,
};

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn eta_smooths_two_consecutive_frames() {
    let mut eta = EtaEstimator::default();
    assert_eq!(eta.eta(ms(100), 4), ms(400));
    assert_eq!(eta.eta(ms(300), 2), ms(400));
    // Only the previous frame counts, not the running average.
    assert_eq!(eta.eta(ms(300), 1), ms(300));
    assert_eq!(eta.eta(ms(50), 0), Duration::ZERO);
}

#[test]
fn cancel_token_is_shared_between_clones() {
    let token = CancelToken::new();
    let other = token.clone();
    assert!(!token.is_cancelled());
    other.cancel();
    assert!(token.is_cancelled());
}

#[test]
fn static_plan_skips_the_velocity_scan() {
    let mut host = MemoryHost::new(SceneSpec::default());
    let job = BlurJob::default();
    let request = FrameRequest::new(FrameIndex(5), &job.sampling);
    let plan = plan_frame(&mut host, &request, &job.sampling).unwrap();
    assert!(plan.velocity.is_none());
    assert_eq!(plan.plan.sample_count, 8);
    assert_eq!(plan.plan.subframe_multiplier, 16);
    assert!(host.events().is_empty());
}

#[test]
fn adaptive_plan_scans_around_the_frame() {
    let mut host = MemoryHost::new(SceneSpec::default());
    let mut job = BlurJob::default();
    job.sampling.mode = SamplingMode::Adaptive;
    let request = FrameRequest::new(FrameIndex(5), &job.sampling);
    let plan = plan_frame(&mut host, &request, &job.sampling).unwrap();
    assert_eq!(plan.velocity.map(|v| v.max_px_per_frame), Some(0.0));
    assert_eq!(plan.plan.sample_count, 1);
    assert_eq!(
        host.events(),
        &[
            HostEvent::TimeCursor {
                frame: FrameIndex(4),
                fraction: 0.0
            },
            HostEvent::TimeCursor {
                frame: FrameIndex(6),
                fraction: 0.0
            },
        ]
    );
}

#[test]
fn dry_run_restores_the_frame_cursor() {
    let mut host = MemoryHost::new(SceneSpec::default());
    let before = host.render_state();
    let mut job = BlurJob::default();
    job.sampling.mode = SamplingMode::Adaptive;
    let range = FrameRange::new(FrameIndex(1), FrameIndex(5), 2).unwrap();

    let plans = FrameDriver::new().plan_range(&mut host, range, &job).unwrap();
    let frames: Vec<i64> = plans.iter().map(|p| p.request.frame.0).collect();
    assert_eq!(frames, vec![1, 3, 5]);
    assert_eq!(host.render_state(), before);
    assert_eq!(host.render_count(), 0);
}

#[test]
fn compositor_errors_keep_their_kind() {
    let scene = SceneSpec {
        compositor: Some(crate::host::compositor::NodeGraph::new()),
        ..SceneSpec::default()
    };
    let mut host = MemoryHost::new(scene);
    let err = FrameDriver::new()
        .render_frame(&mut host, FrameIndex(1), &BlurJob::default(), &CancelToken::new())
        .unwrap_err();
    assert!(matches!(err, BlurError::Compositor(_)));
    assert!(host.events().is_empty());
}

#[test]
fn readback_shape_prefers_the_reported_resolution() {
    let res = Resolution::new(50, 50);
    assert_eq!(readback_shape(res, 10_000), BufferShape::new(50, 50, 4));
    assert_eq!(readback_shape(res, 400), BufferShape::new(100, 1, 4));
}
