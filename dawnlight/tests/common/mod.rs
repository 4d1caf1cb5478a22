//! Shared harness for driving a machine against in-memory collaborators.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use dawnlight::config::LightingConfig;
use dawnlight::machine::{Lifecycle, Machine, StateId};
use dawnlight::output::memory::{MemoryDisplay, MemorySink};
use dawnlight::output::{Renderer, Status};
use dawnlight::sync::Mailbox;
use dawnlight::types::{ColourMath, Event, Rgb8};

pub const DAY: Rgb8 = Rgb8::new(250, 200, 100);
pub const NIGHT: Rgb8 = Rgb8::new(10, 20, 90);
pub const MID: Rgb8 = Rgb8::new(200, 30, 0);

/// Pause before a rejected target colour is painted again.
pub const REPAINT: Duration = Duration::from_millis(500);

/// Small, fast, gamma-free configuration so frames compare exactly.
///
/// The clock starts ten simulated minutes before dusk and ticks once a
/// second; each fade leg is ten 100 ms steps.
pub fn test_config() -> LightingConfig {
    LightingConfig {
        day_colour: DAY,
        night_colour: NIGHT,
        mid_colour: MID,
        off_colour: Rgb8::BLACK,
        dawn_minute: 360,
        dusk_minute: 1080,
        clock_start_minute: 1070,
        clock_tick_interval: Duration::from_secs(1),
        fade_duration: Duration::from_secs(1),
        fade_steps: 10,
        gamma: None,
        repaint_interval: REPAINT,
        exit_drain: Duration::from_millis(100),
        ..LightingConfig::default()
    }
}

pub struct Harness {
    pub mailbox: Arc<Mailbox<Event>>,
    pub sink: MemorySink,
    pub display: MemoryDisplay,
    pub state: watch::Receiver<StateId>,
    pub lifecycle: mpsc::UnboundedReceiver<Lifecycle>,
    pub seen: Vec<Lifecycle>,
    pub machine: JoinHandle<StateId>,
}

impl Harness {
    /// Start a machine and wait until `Off` is rendering.
    pub async fn start(config: LightingConfig) -> Self {
        let sink = MemorySink::new();
        let display = MemoryDisplay::new();
        let mailbox = Arc::new(Mailbox::new());
        let (tx, lifecycle) = mpsc::unbounded_channel();

        let machine = Machine::new(
            config.clone(),
            Renderer::new(Box::new(sink.clone()), ColourMath::new(config.gamma)),
            Status::new(Box::new(display.clone())),
            mailbox.clone(),
        )
        .expect("test config is valid")
        .with_lifecycle(tx);
        let state = machine.subscribe();
        let machine = tokio::spawn(machine.run());

        let mut harness = Self {
            mailbox,
            sink,
            display,
            state,
            lifecycle,
            seen: Vec::new(),
            machine,
        };
        harness
            .wait_lifecycle(Lifecycle::TaskStarted(StateId::Off))
            .await;
        harness
    }

    pub async fn send(&self, event: Event) {
        self.mailbox.put(event).await.expect("mailbox open");
    }

    /// Send `event` and wait until `state`'s task has taken the output.
    pub async fn drive(&mut self, event: Event, state: StateId) {
        self.send(event).await;
        self.wait_lifecycle(Lifecycle::TaskStarted(state)).await;
        assert_eq!(self.current(), state);
    }

    pub fn current(&self) -> StateId {
        *self.state.borrow()
    }

    /// Consume lifecycle notifications until `expected` arrives.
    pub async fn wait_lifecycle(&mut self, expected: Lifecycle) {
        let waited = tokio::time::timeout(Duration::from_secs(600), async {
            while let Some(event) = self.lifecycle.recv().await {
                self.seen.push(event);
                if event == expected {
                    return;
                }
            }
            panic!("lifecycle channel closed before {expected:?}");
        })
        .await;
        assert!(waited.is_ok(), "timed out waiting for {expected:?}");
    }

    /// Shut down and return the final state.
    pub async fn shutdown(mut self) -> (StateId, Vec<Lifecycle>) {
        self.send(Event::shutdown()).await;
        let final_state = self.machine.await.expect("machine task");
        while let Ok(event) = self.lifecycle.try_recv() {
            self.seen.push(event);
        }
        (final_state, self.seen)
    }
}
