//! Bounded-step colour fades with cooperative cancellation.
//!
//! A fade writes `steps + 1` frames: the start colour, `steps - 1`
//! intermediate blends, and the target. The cancellation token is checked
//! before every frame. A cancelled fade returns without forcing a final
//! frame; the caller decides what the strip should settle on.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::config::LightingConfig;
use crate::output::Renderer;
use crate::tracing::prelude::*;
use crate::types::{ColourSpace, Rgb8};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FadeOutcome {
    /// The target colour was written.
    Completed,
    /// Stopped early after writing `frames` frames.
    Cancelled { frames: u32 },
}

impl FadeOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, FadeOutcome::Completed)
    }
}

/// Fade `from` → `to` over `steps` increments, pausing `step_duration`
/// between frames.
pub async fn fade(
    renderer: &mut Renderer,
    from: Rgb8,
    to: Rgb8,
    steps: u32,
    step_duration: Duration,
    space: ColourSpace,
    cancel: &CancellationToken,
) -> FadeOutcome {
    let steps = steps.max(1);

    for step in 0..=steps {
        if cancel.is_cancelled() {
            debug!(frames = step, total = steps + 1, "Fade cancelled");
            return FadeOutcome::Cancelled { frames: step };
        }

        let t = step as f32 / steps as f32;
        let colour = renderer.math().interpolate(space, from, to, t);
        renderer.paint(colour).await;

        if step < steps {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(step_duration) => {}
            }
        }
    }

    FadeOutcome::Completed
}

/// Fade parameters shared by every clock-driven transition.
#[derive(Debug, Clone, Copy)]
pub struct Fader {
    pub steps: u32,
    pub step_duration: Duration,
    pub space: ColourSpace,
}

impl Fader {
    pub fn from_config(config: &LightingConfig) -> Self {
        Self {
            steps: config.fade_steps,
            step_duration: config.fade_step_duration(),
            space: config.fade_space,
        }
    }

    pub async fn run(
        &self,
        renderer: &mut Renderer,
        from: Rgb8,
        to: Rgb8,
        cancel: &CancellationToken,
    ) -> FadeOutcome {
        fade(
            renderer,
            from,
            to,
            self.steps,
            self.step_duration,
            self.space,
            cancel,
        )
        .await
    }

    /// Two-leg fade through `via`, the dawn/dusk reddening.
    pub async fn run_via(
        &self,
        renderer: &mut Renderer,
        from: Rgb8,
        via: Rgb8,
        to: Rgb8,
        cancel: &CancellationToken,
    ) -> FadeOutcome {
        match self.run(renderer, from, via, cancel).await {
            FadeOutcome::Completed => {}
            cancelled => return cancelled,
        }
        match self.run(renderer, via, to, cancel).await {
            FadeOutcome::Completed => FadeOutcome::Completed,
            FadeOutcome::Cancelled { frames } => FadeOutcome::Cancelled {
                frames: frames + self.steps + 1,
            },
        }
    }
}
