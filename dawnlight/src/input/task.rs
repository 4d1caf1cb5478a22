//! Polling tasks that turn button levels into events.
//!
//! Each [`ButtonTask`] samples its button every poll interval and queues
//! classified presses on a shared [`RingChannel`]. A single
//! [`InputForwarder`] drains that queue into the machine's mailbox while
//! holding the input lock, so button events and other injected events
//! reach the mailbox one at a time.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use super::{ButtonClassifier, ClassifierMode, Press, RawButton};
use crate::sync::{Mailbox, RingChannel};
use crate::tracing::prelude::*;
use crate::types::{ButtonId, Event};

pub struct ButtonTask<B> {
    id: ButtonId,
    raw: B,
    classifier: ButtonClassifier,
    poll_interval: Duration,
    queue: Arc<RingChannel<Event>>,
}

impl<B: RawButton> ButtonTask<B> {
    pub fn new(
        id: ButtonId,
        raw: B,
        mode: ClassifierMode,
        poll_interval: Duration,
        queue: Arc<RingChannel<Event>>,
    ) -> Self {
        Self {
            id,
            raw,
            classifier: ButtonClassifier::new(mode),
            poll_interval,
            queue,
        }
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            if let Some(press) = self.classifier.poll(self.raw.is_pressed()) {
                debug!(button = %self.id, ?press, "Button press classified");
            }

            let Some(press) = self.classifier.result() else {
                continue;
            };

            let event = match press {
                Press::Click => Event::click(self.id),
                Press::Hold => Event::hold(self.id),
            };

            // The press stays latched while the queue is full.
            tokio::select! {
                _ = cancel.cancelled() => break,
                queued = self.queue.put(event) => {
                    if queued.is_err() {
                        debug!(button = %self.id, "Input queue closed");
                        break;
                    }
                }
            }

            self.classifier.clear(self.raw.is_pressed());
        }

        trace!(button = %self.id, "Button task stopped");
    }
}

pub struct InputForwarder {
    queue: Arc<RingChannel<Event>>,
    mailbox: Arc<Mailbox<Event>>,
    input_lock: Arc<Mutex<()>>,
}

impl InputForwarder {
    pub fn new(
        queue: Arc<RingChannel<Event>>,
        mailbox: Arc<Mailbox<Event>>,
        input_lock: Arc<Mutex<()>>,
    ) -> Self {
        Self {
            queue,
            mailbox,
            input_lock,
        }
    }

    pub async fn run(self, cancel: CancellationToken) {
        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => break,
                event = self.queue.get() => match event {
                    Ok(event) => event,
                    Err(_) => break,
                },
            };

            let _input = self.input_lock.lock().await;
            tokio::select! {
                _ = cancel.cancelled() => break,
                delivered = self.mailbox.put(event) => {
                    if delivered.is_err() {
                        debug!("Mailbox closed, input forwarder exiting");
                        break;
                    }
                    trace!(event = %event, "Input forwarded");
                }
            }
        }

        trace!("Input forwarder stopped");
    }
}
