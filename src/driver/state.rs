use std::ops::{Deref, DerefMut};

use anyhow::Context as _;

use crate::{
    config::TimeAddressing,
    foundation::error::BlurResult,
    host::{HostRenderState, RenderStateControl},
    plan::planner::SamplePlan,
};

/// Render state a frame needs while its subframes render.
///
/// Native motion blur is always off. [`TimeAddressing::ExpandedTimeline`] additionally
/// stretches the timeline by the subframe multiplier so subframe `i` of frame `f` is the
/// integer frame `f * m + i`.
pub fn subframe_render_state(
    saved: &HostRenderState,
    addressing: TimeAddressing,
    plan: &SamplePlan,
) -> HostRenderState {
    let mut state = HostRenderState {
        native_motion_blur: false,
        ..*saved
    };
    if addressing == TimeAddressing::ExpandedTimeline {
        let m = plan.subframe_multiplier;
        state.fps = saved.fps.saturating_mul(m);
        state.time_remap_old = 1;
        state.time_remap_new = m;
    }
    state
}

/// Scoped host render-state mutation.
///
/// Acquiring snapshots the host's state and turns native motion blur off; the snapshot,
/// current frame included, is put back by [`HostStateGuard::release`] or, on any early exit,
/// by `Drop`. While the guard is alive the host is reached through it.
pub struct HostStateGuard<'h, H: RenderStateControl + ?Sized> {
    host: &'h mut H,
    saved: HostRenderState,
    released: bool,
}

impl<'h, H: RenderStateControl + ?Sized> HostStateGuard<'h, H> {
    pub fn acquire(host: &'h mut H) -> BlurResult<Self> {
        let saved = host.render_state();
        let mut guard = Self {
            host,
            saved,
            released: false,
        };
        // A partially applied state is still undone by Drop.
        guard
            .host
            .apply_render_state(&HostRenderState {
                native_motion_blur: false,
                ..saved
            })
            .context("disable native motion blur")?;
        tracing::debug!(fps = saved.fps, "host render state acquired");
        Ok(guard)
    }

    /// Switch the host to the time addressing `plan` renders with.
    pub fn apply_addressing(
        &mut self,
        addressing: TimeAddressing,
        plan: &SamplePlan,
    ) -> BlurResult<()> {
        if addressing == TimeAddressing::Fractional {
            return Ok(());
        }
        let wanted = subframe_render_state(&self.saved, addressing, plan);
        self.host
            .apply_render_state(&wanted)
            .context("stretch timeline for subframes")?;
        tracing::debug!(
            fps = wanted.fps,
            remap_new = wanted.time_remap_new,
            "timeline stretched"
        );
        Ok(())
    }

    pub fn saved(&self) -> &HostRenderState {
        &self.saved
    }

    /// Restore the snapshot now and report failure to the caller.
    pub fn release(mut self) -> BlurResult<()> {
        self.released = true;
        self.restore().context("restore host render state")?;
        Ok(())
    }

    fn restore(&mut self) -> anyhow::Result<()> {
        self.host.apply_render_state(&self.saved)?;
        tracing::debug!(frame = %self.saved.current_frame, "host render state restored");
        Ok(())
    }
}

impl<H: RenderStateControl + ?Sized> Deref for HostStateGuard<'_, H> {
    type Target = H;

    fn deref(&self) -> &H {
        self.host
    }
}

impl<H: RenderStateControl + ?Sized> DerefMut for HostStateGuard<'_, H> {
    fn deref_mut(&mut self) -> &mut H {
        self.host
    }
}

impl<H: RenderStateControl + ?Sized> Drop for HostStateGuard<'_, H> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(err) = self.restore() {
            tracing::error!(error = %format!("{err:#}"), "failed to restore host render state");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/driver/state.rs"]
mod tests;
