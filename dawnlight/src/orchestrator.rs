//! Wires clock, buttons, mailbox and state machine together and runs them
//! until shutdown.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::config::LightingConfig;
use crate::error::Result;
use crate::input::{ButtonTask, ClassifierMode, InputForwarder, RawButton};
use crate::machine::{Lifecycle, Machine, StateId};
use crate::output::{PixelSink, Renderer, Status, StatusDisplay};
use crate::sync::{Mailbox, RingChannel};
use crate::tracing::prelude::*;
use crate::types::{ButtonId, ColourMath, Event};

/// Room for button presses queued ahead of the mailbox.
const INPUT_QUEUE_CAPACITY: usize = 8;

/// Classification used for each physical button.
pub fn classifier_mode(button: ButtonId, config: &LightingConfig) -> ClassifierMode {
    match button {
        ButtonId::A | ButtonId::B => ClassifierMode::ClickOnly,
        ButtonId::U => ClassifierMode::ClickOrHold {
            threshold: config.hold_threshold,
        },
    }
}

pub struct Orchestrator {
    config: LightingConfig,
    machine: Machine,
    buttons: Vec<(ButtonId, Box<dyn RawButton>)>,
    queue: Arc<RingChannel<Event>>,
}

impl Orchestrator {
    /// Validate `config` and build the machine. A bad configuration is
    /// reported here, before anything renders.
    pub fn new(
        config: LightingConfig,
        sink: Box<dyn PixelSink>,
        display: Box<dyn StatusDisplay>,
    ) -> Result<Self> {
        if let Err(e) = config.validate() {
            error!(error = %e, "Refusing to start with invalid configuration");
            return Err(e.into());
        }

        let renderer = Renderer::new(sink, ColourMath::new(config.gamma));
        let status = Status::new(display);
        let mailbox = Arc::new(Mailbox::new());
        let machine = Machine::new(config.clone(), renderer, status, mailbox)?;

        Ok(Self {
            config,
            machine,
            buttons: Vec::new(),
            queue: Arc::new(RingChannel::new(INPUT_QUEUE_CAPACITY)),
        })
    }

    pub fn with_button(mut self, id: ButtonId, raw: impl RawButton + 'static) -> Self {
        self.buttons.push((id, Box::new(raw)));
        self
    }

    pub fn with_lifecycle(
        mut self,
        tx: tokio::sync::mpsc::UnboundedSender<Lifecycle>,
    ) -> Self {
        self.machine = self.machine.with_lifecycle(tx);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<StateId> {
        self.machine.subscribe()
    }

    /// Run until `shutdown` is cancelled or the machine reaches its
    /// terminal state. Returns the final state.
    pub async fn run(self, shutdown: CancellationToken) -> StateId {
        let inputs = CancellationToken::new();
        let mailbox = self.machine.mailbox();
        let input_lock = self.machine.input_lock();

        for (id, raw) in self.buttons {
            let mode = classifier_mode(id, &self.config);
            debug!(button = %id, ?mode, "Starting button task");
            let task = ButtonTask::new(
                id,
                raw,
                mode,
                self.config.poll_interval,
                self.queue.clone(),
            );
            tokio::spawn(task.run(inputs.clone()));
        }

        let forwarder = InputForwarder::new(self.queue.clone(), mailbox.clone(), input_lock.clone());
        tokio::spawn(forwarder.run(inputs.clone()));

        let mut machine = tokio::spawn(self.machine.run());

        let finished = tokio::select! {
            finished = &mut machine => Some(finished),
            _ = shutdown.cancelled() => None,
        };

        let finished = match finished {
            Some(finished) => finished,
            None => {
                info!("Shutdown requested");
                {
                    let _input = input_lock.lock().await;
                    if mailbox.put(Event::shutdown()).await.is_err() {
                        warn!("Mailbox already closed during shutdown");
                    }
                }
                machine.await
            }
        };

        inputs.cancel();
        self.queue.close();
        mailbox.close();

        match finished {
            Ok(state) => state,
            Err(e) => {
                error!(error = %e, "State machine task failed");
                StateId::Finish
            }
        }
    }
}
