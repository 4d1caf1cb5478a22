//! The lighting state machine.
//!
//! Exactly one state is active at a time. While it is, two activities run
//! together: the state's background task (rendering) and the transition
//! listener (waiting on the mailbox). The listener holds the transition
//! lock for its whole wait, so at most one transition is ever pending or
//! in progress.
//!
//! # Transition protocol
//!
//! ```text
//!  listener: get() ─► table hit ─► remain.cancel()
//!                                       │
//!  exit:     wait for state task (bounded by exit_drain) ─► state exit
//!                                       │
//!  swap:     current = next  (transition lock still held) ─► unlock
//!                                       │
//!  enter:    next.enter() ─► spawn next task ─► listen again
//! ```
//!
//! The exit waits on the state task's completion rather than a fixed
//! delay. If the task has not finished within `exit_drain` it is logged,
//! aborted at its next suspension point, and the transition proceeds.

mod state;
mod table;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, OwnedMutexGuard, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub use state::{StateContext, StateId, TaskOutcome};
pub use table::TransitionTable;

use crate::clock::VirtualClock;
use crate::config::{ConfigError, LightingConfig};
use crate::fade::Fader;
use crate::output::{Renderer, Status};
use crate::sync::Mailbox;
use crate::tracing::prelude::*;
use crate::types::Event;

/// Lifecycle notifications, in the order they happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Entered(StateId),
    TaskStarted(StateId),
    TaskStopped(StateId),
    Exited(StateId),
}

pub struct Machine {
    table: TransitionTable,
    context: Arc<StateContext>,
    mailbox: Arc<Mailbox<Event>>,
    transition_lock: Arc<Mutex<()>>,
    input_lock: Arc<Mutex<()>>,
    current: watch::Sender<StateId>,
    lifecycle: Option<mpsc::UnboundedSender<Lifecycle>>,
    exit_drain: Duration,
}

impl Machine {
    /// Build a machine over the given collaborators.
    ///
    /// Fails if `config` is inconsistent; nothing has been rendered or
    /// started at that point.
    pub fn new(
        config: LightingConfig,
        renderer: Renderer,
        status: Status,
        mailbox: Arc<Mailbox<Event>>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let clock = VirtualClock::new(
            config.clock_tick_interval,
            mailbox.clone(),
            Some(status.clone()),
        );
        let exit_drain = config.exit_drain;
        let context = StateContext {
            fader: Fader::from_config(&config),
            config,
            state_lock: renderer.into_lock(),
            status,
            clock,
        };
        let (current, _) = watch::channel(StateId::Start);

        Ok(Self {
            table: TransitionTable::canonical(),
            context: Arc::new(context),
            mailbox,
            transition_lock: Arc::new(Mutex::new(())),
            input_lock: Arc::new(Mutex::new(())),
            current,
            lifecycle: None,
            exit_drain,
        })
    }

    /// Publish lifecycle notifications on `tx`.
    pub fn with_lifecycle(mut self, tx: mpsc::UnboundedSender<Lifecycle>) -> Self {
        self.lifecycle = Some(tx);
        self
    }

    /// Watch the active state.
    pub fn subscribe(&self) -> watch::Receiver<StateId> {
        self.current.subscribe()
    }

    pub fn mailbox(&self) -> Arc<Mailbox<Event>> {
        self.mailbox.clone()
    }

    /// Lock serializing everything that injects events into the mailbox.
    pub fn input_lock(&self) -> Arc<Mutex<()>> {
        self.input_lock.clone()
    }

    /// Run until the terminal state is reached. Returns the final state.
    pub async fn run(self) -> StateId {
        info!("State machine starting");

        let start = StateId::Start;
        self.context.enter(start, start).await;
        self.notify(Lifecycle::Entered(start));

        // Start leaves immediately; the auto transition takes the lock
        // explicitly since no listener is holding it.
        let Some(first) = self.table.next(start, &Event::auto()) else {
            unreachable!("transition table has no way out of {start}");
        };
        let guard = self.transition_lock.clone().lock_owned().await;
        let mut previous = start;
        let mut state = self.transition(start, first, None, guard).await;

        while !state.is_terminal() {
            let remain = CancellationToken::new();
            let task = self.spawn_task(state, previous, remain.clone());

            let (next, guard) = self.listen(state).await;
            remain.cancel();

            previous = state;
            state = self.transition(state, next, Some(task), guard).await;
        }

        info!(state = %state, "State machine finished");
        state
    }

    /// Wait for an event that applies in `state`.
    ///
    /// Returns the target state together with the transition lock, which
    /// is held from before the wait until the caller finishes the swap.
    async fn listen(&self, state: StateId) -> (StateId, OwnedMutexGuard<()>) {
        let guard = self.transition_lock.clone().lock_owned().await;

        loop {
            let event = match self.mailbox.get().await {
                Ok(event) => event,
                Err(_) => {
                    warn!(state = %state, "Mailbox closed, shutting down");
                    Event::shutdown()
                }
            };

            match self.table.next(state, &event) {
                Some(next) => {
                    debug!(state = %state, event = %event, next = %next, "Transition triggered");
                    return (next, guard);
                }
                None if event == Event::shutdown() => {
                    // A closed mailbox in a state without a shutdown edge
                    // would otherwise spin here.
                    return (StateId::Finish, guard);
                }
                None => {
                    debug!(state = %state, event = %event, "Event ignored");
                }
            }
        }
    }

    /// Leave `from`, make `to` current, and enter it.
    async fn transition(
        &self,
        from: StateId,
        to: StateId,
        task: Option<JoinHandle<TaskOutcome>>,
        guard: OwnedMutexGuard<()>,
    ) -> StateId {
        let outcome = match task {
            Some(task) => self.drain(from, task).await,
            None => None,
        };
        self.context.exit(from, to, outcome).await;
        self.notify(Lifecycle::Exited(from));

        self.current.send_replace(to);
        drop(guard);
        info!(from = %from, to = %to, "State changed");

        self.context.enter(to, from).await;
        self.notify(Lifecycle::Entered(to));
        to
    }

    /// Wait, within `exit_drain`, for a state task to observe that it
    /// should stop.
    async fn drain(
        &self,
        state: StateId,
        mut task: JoinHandle<TaskOutcome>,
    ) -> Option<TaskOutcome> {
        match tokio::time::timeout(self.exit_drain, &mut task).await {
            Ok(Ok(outcome)) => Some(outcome),
            Ok(Err(e)) => {
                error!(state = %state, error = %e, "State task failed");
                None
            }
            Err(_) => {
                warn!(
                    state = %state,
                    drain = ?self.exit_drain,
                    "State task did not wind down in time, aborting it"
                );
                task.abort();
                None
            }
        }
    }

    fn spawn_task(
        &self,
        state: StateId,
        previous: StateId,
        remain: CancellationToken,
    ) -> JoinHandle<TaskOutcome> {
        let context = self.context.clone();
        let lifecycle = self.lifecycle.clone();

        tokio::spawn(async move {
            let notify = |event| {
                if let Some(tx) = &lifecycle {
                    let _ = tx.send(event);
                }
            };

            let outcome = context
                .task(state, previous, remain, || notify(Lifecycle::TaskStarted(state)))
                .await;
            notify(Lifecycle::TaskStopped(state));
            outcome
        })
    }

    fn notify(&self, event: Lifecycle) {
        trace!(?event, "Lifecycle");
        if let Some(tx) = &self.lifecycle {
            let _ = tx.send(event);
        }
    }
}
