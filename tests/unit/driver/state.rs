use super::*;
use crate::{
    config::{SamplingConfig, SamplingMode},
    foundation::{core::FrameIndex, error::BlurError},
    plan::planner::plan_samples,
};

#[derive(Default)]
struct StateOnly {
    state: HostRenderState,
    applied: Vec<HostRenderState>,
    fail_next: bool,
}

impl RenderStateControl for StateOnly {
    fn render_state(&self) -> HostRenderState {
        self.state
    }

    fn apply_render_state(&mut self, state: &HostRenderState) -> anyhow::Result<()> {
        if std::mem::take(&mut self.fail_next) {
            anyhow::bail!("host refused state");
        }
        self.state = *state;
        self.applied.push(*state);
        Ok(())
    }
}

fn plan(samples: f64, shutter: f64) -> SamplePlan {
    plan_samples(
        &SamplingConfig {
            mode: SamplingMode::Static,
            static_samples: samples,
            shutter,
            ..SamplingConfig::default()
        },
        0.0,
    )
    .unwrap()
}

fn initial() -> HostRenderState {
    HostRenderState {
        native_motion_blur: true,
        fps: 25,
        time_remap_old: 100,
        time_remap_new: 100,
        current_frame: FrameIndex(7),
    }
}

#[test]
fn fractional_only_disables_native_blur() {
    let s = subframe_render_state(&initial(), TimeAddressing::Fractional, &plan(4.0, 0.5));
    assert_eq!(
        s,
        HostRenderState {
            native_motion_blur: false,
            ..initial()
        }
    );
}

#[test]
fn expanded_timeline_stretches_rate_and_remap() {
    let p = plan(3.0, 0.5);
    assert_eq!(p.subframe_multiplier, 6);
    let s = subframe_render_state(&initial(), TimeAddressing::ExpandedTimeline, &p);
    assert_eq!(s.fps, 150);
    assert_eq!((s.time_remap_old, s.time_remap_new), (1, 6));
    assert!(!s.native_motion_blur);
}

#[test]
fn release_restores_snapshot() {
    let mut host = StateOnly {
        state: initial(),
        ..StateOnly::default()
    };
    let mut guard = HostStateGuard::acquire(&mut host).unwrap();
    assert!(!guard.render_state().native_motion_blur);
    guard
        .apply_addressing(TimeAddressing::ExpandedTimeline, &plan(2.0, 1.0))
        .unwrap();
    assert_eq!(guard.render_state().time_remap_new, 2);
    guard.state.current_frame = FrameIndex(99);
    guard.release().unwrap();

    assert_eq!(host.state, initial());
    assert_eq!(host.applied.len(), 3);
}

#[test]
fn drop_restores_on_early_exit() {
    let mut host = StateOnly {
        state: initial(),
        ..StateOnly::default()
    };
    let run = |h: &mut StateOnly| -> BlurResult<()> {
        let mut guard = HostStateGuard::acquire(h)?;
        guard.apply_addressing(TimeAddressing::ExpandedTimeline, &plan(4.0, 0.5))?;
        Err(BlurError::invalid_config("boom"))
    };
    assert!(run(&mut host).is_err());
    assert_eq!(host.state, initial());
    assert_eq!(host.applied.last(), Some(&initial()));
}

#[test]
fn fractional_addressing_applies_nothing() {
    let mut host = StateOnly {
        state: initial(),
        ..StateOnly::default()
    };
    let mut guard = HostStateGuard::acquire(&mut host).unwrap();
    guard
        .apply_addressing(TimeAddressing::Fractional, &plan(4.0, 0.5))
        .unwrap();
    assert_eq!(guard.applied.len(), 1);
    drop(guard);
    assert_eq!(host.applied.len(), 2);
}

#[test]
fn failed_restore_is_reported_by_release() {
    let mut host = StateOnly {
        state: initial(),
        ..StateOnly::default()
    };
    let mut guard = HostStateGuard::acquire(&mut host).unwrap();
    guard.fail_next = true;
    assert!(guard.release().is_err());
}

#[test]
fn failed_acquire_leaves_state_untouched() {
    let mut host = StateOnly {
        state: initial(),
        fail_next: true,
        ..StateOnly::default()
    };
    assert!(HostStateGuard::acquire(&mut host).is_err());
    assert_eq!(host.state, initial());
}
