//! The states and what each one does while active.
//!
//! Every state has the same three-part behaviour: `enter` renders its
//! initial output, `task` runs in the background until told to wind down,
//! and `exit` waits for that wind-down before the next state may enter.
//! Dispatch is a `match` on [`StateId`].

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::clock::VirtualClock;
use crate::config::LightingConfig;
use crate::fade::{FadeOutcome, Fader};
use crate::output::{Renderer, STATUS_ROW_CLOCK, STATUS_ROW_STATE, StateLock, Status};
use crate::tracing::prelude::*;
use crate::types::Rgb8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum StateId {
    /// Pseudo-initial state; leaves for `Off` immediately.
    Start,
    Off,
    Day,
    Night,
    ClockDay,
    ClockNight,
    /// Terminal state entered on shutdown.
    Finish,
}

impl StateId {
    pub fn is_clock(self) -> bool {
        matches!(self, StateId::ClockDay | StateId::ClockNight)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StateId::Finish)
    }

    /// Colour the state settles on, if it renders anything.
    pub fn target_colour(self, config: &LightingConfig) -> Option<Rgb8> {
        match self {
            StateId::Start => None,
            StateId::Off | StateId::Finish => Some(config.off_colour),
            StateId::Day | StateId::ClockDay => Some(config.day_colour),
            StateId::Night | StateId::ClockNight => Some(config.night_colour),
        }
    }

    /// The other half of a clock-mode pair.
    fn clock_counterpart(self) -> Option<StateId> {
        match self {
            StateId::ClockDay => Some(StateId::ClockNight),
            StateId::ClockNight => Some(StateId::ClockDay),
            _ => None,
        }
    }
}

/// How a state task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    /// Output is at the state's target (or the state has none).
    Settled,
    /// Told to stop before the target landed; output is somewhere
    /// between colours.
    Interrupted,
}

/// Everything a state's behaviour touches.
pub struct StateContext {
    pub config: LightingConfig,
    pub state_lock: StateLock,
    pub status: Status,
    pub clock: VirtualClock,
    pub fader: Fader,
}

impl StateContext {
    /// Render the state's initial output and update the display.
    pub async fn enter(&self, state: StateId, previous: StateId) {
        self.status
            .write_line(STATUS_ROW_STATE, &state.to_string())
            .await;

        match state {
            StateId::Start => {}

            StateId::Off | StateId::Day | StateId::Night | StateId::Finish => {
                if previous.is_clock() {
                    self.status.write_line(STATUS_ROW_CLOCK, "").await;
                }
                if let Some(colour) = state.target_colour(&self.config) {
                    self.state_lock.lock().await.paint(colour).await;
                }
            }

            // The state task fades into the target.
            StateId::ClockDay | StateId::ClockNight => {
                if !previous.is_clock() {
                    let config = &self.config;
                    self.clock.start(
                        config.clock_start_minute,
                        config.dawn_minute,
                        config.dusk_minute,
                    );
                }
            }
        }
    }

    /// Background behaviour while `state` is active.
    ///
    /// Holds the state lock for its whole run; `started` is called once
    /// the lock is taken. Clock states fade into their target. Every state
    /// with a target then repaints it until the sink accepts it. Returns
    /// once `remain` is cancelled and output is no longer being touched.
    pub async fn task(
        self: Arc<Self>,
        state: StateId,
        previous: StateId,
        remain: CancellationToken,
        started: impl FnOnce(),
    ) -> TaskOutcome {
        let mut renderer = self.state_lock.clone().lock_owned().await;
        started();

        let target = state.target_colour(&self.config);
        let outcome = match (state.is_clock(), target) {
            (true, Some(target)) => {
                let from = renderer.shown().unwrap_or(self.config.off_colour);
                let fade = if from == target {
                    FadeOutcome::Completed
                } else if state.clock_counterpart() == Some(previous) {
                    debug!(%state, ?from, ?target, "Clock fade via intermediate colour");
                    self.fader
                        .run_via(&mut renderer, from, self.config.mid_colour, target, &remain)
                        .await
                } else {
                    debug!(%state, ?from, ?target, "Clock fade");
                    self.fader.run(&mut renderer, from, target, &remain).await
                };

                match fade {
                    FadeOutcome::Completed => TaskOutcome::Settled,
                    FadeOutcome::Cancelled { .. } => TaskOutcome::Interrupted,
                }
            }
            _ => TaskOutcome::Settled,
        };

        let outcome = match (outcome, target) {
            (TaskOutcome::Settled, Some(target)) => {
                self.settle(&mut renderer, state, target, &remain).await
            }
            (outcome, _) => outcome,
        };

        // Hold the output until told to go.
        remain.cancelled().await;
        outcome
    }

    /// Repaint `target` every `repaint_interval` until a frame of it is
    /// written. Interrupted if `remain` is cancelled first.
    async fn settle(
        &self,
        renderer: &mut Renderer,
        state: StateId,
        target: Rgb8,
        remain: &CancellationToken,
    ) -> TaskOutcome {
        while renderer.shown() != Some(target) {
            tokio::select! {
                biased;
                _ = remain.cancelled() => return TaskOutcome::Interrupted,
                _ = tokio::time::sleep(self.config.repaint_interval) => {}
            }
            debug!(%state, ?target, "Repainting target");
            renderer.paint(target).await;
        }
        TaskOutcome::Settled
    }

    /// Tidy up after the state task has wound down.
    ///
    /// A clock state whose task did not settle (interrupted, or aborted
    /// so the outcome is unknown) re-asserts its target so the next state
    /// starts from a definite colour. Leaving clock mode stops the virtual
    /// clock.
    pub async fn exit(&self, state: StateId, next: StateId, outcome: Option<TaskOutcome>) {
        let settled = outcome == Some(TaskOutcome::Settled);
        if let (true, false, Some(target)) = (
            state.is_clock(),
            settled,
            state.target_colour(&self.config),
        ) {
            debug!(%state, ?target, "Re-asserting target before leaving");
            self.state_lock.lock().await.paint(target).await;
        }

        if state.is_clock() && !next.is_clock() {
            self.clock.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::output::memory::{MemoryDisplay, MemorySink};
    use crate::sync::Mailbox;
    use crate::types::ColourMath;

    const REPAINT: Duration = Duration::from_secs(1);

    fn context(sink: &MemorySink) -> Arc<StateContext> {
        let config = LightingConfig {
            gamma: None,
            repaint_interval: REPAINT,
            ..LightingConfig::default()
        };
        Arc::new(StateContext {
            fader: Fader::from_config(&config),
            state_lock: Renderer::new(Box::new(sink.clone()), ColourMath::linear()).into_lock(),
            status: Status::new(Box::new(MemoryDisplay::new())),
            clock: VirtualClock::new(config.clock_tick_interval, Arc::new(Mailbox::new()), None),
            config,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn static_state_repaints_rejected_target() {
        let sink = MemorySink::new();
        let context = context(&sink);
        let day = context.config.day_colour;

        sink.fail_next(2);
        context.enter(StateId::Day, StateId::Off).await;
        assert!(sink.frames().is_empty());

        let remain = CancellationToken::new();
        let task = tokio::spawn(context.clone().task(
            StateId::Day,
            StateId::Off,
            remain.clone(),
            || {},
        ));

        // First retry is also rejected, the second lands.
        tokio::time::sleep(REPAINT + REPAINT / 2).await;
        assert!(sink.frames().is_empty());
        tokio::time::sleep(REPAINT).await;
        assert_eq!(sink.frames(), vec![day]);

        // Nothing more once the target is shown.
        tokio::time::sleep(REPAINT * 10).await;
        assert_eq!(sink.frames(), vec![day]);

        remain.cancel();
        assert_eq!(task.await.unwrap(), TaskOutcome::Settled);
    }

    #[tokio::test(start_paused = true)]
    async fn target_never_landing_is_interrupted() {
        let sink = MemorySink::new();
        let context = context(&sink);

        sink.fail_next(u32::MAX);
        context.enter(StateId::Night, StateId::Off).await;

        let remain = CancellationToken::new();
        let task = tokio::spawn(context.clone().task(
            StateId::Night,
            StateId::Off,
            remain.clone(),
            || {},
        ));
        tokio::time::sleep(REPAINT * 5).await;
        remain.cancel();

        assert_eq!(task.await.unwrap(), TaskOutcome::Interrupted);
        assert!(sink.frames().is_empty());
    }

    #[tokio::test]
    async fn exit_reasserts_clock_target_unless_settled() {
        let sink = MemorySink::new();
        let context = context(&sink);
        let night = context.config.night_colour;

        context
            .exit(StateId::ClockNight, StateId::Off, Some(TaskOutcome::Settled))
            .await;
        assert!(sink.frames().is_empty());

        context.exit(StateId::ClockNight, StateId::Off, None).await;
        assert_eq!(sink.frames(), vec![night]);

        context
            .exit(StateId::ClockNight, StateId::Off, Some(TaskOutcome::Interrupted))
            .await;
        assert_eq!(sink.frames(), vec![night, night]);
    }

    #[test]
    fn clock_states_are_exactly_the_clock_pair() {
        use strum::IntoEnumIterator;
        let clock: Vec<StateId> = StateId::iter().filter(|s| s.is_clock()).collect();
        assert_eq!(clock, vec![StateId::ClockDay, StateId::ClockNight]);
    }

    #[test]
    fn targets_follow_configuration() {
        let config = LightingConfig::default();
        assert_eq!(StateId::Start.target_colour(&config), None);
        assert_eq!(StateId::Off.target_colour(&config), Some(Rgb8::BLACK));
        assert_eq!(
            StateId::ClockDay.target_colour(&config),
            Some(config.day_colour)
        );
        assert_eq!(
            StateId::Night.target_colour(&config),
            Some(config.night_colour)
        );
    }
}
