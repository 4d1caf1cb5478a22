//! Buttons through the input queue into a running machine.

mod common;

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use common::{DAY, test_config};
use dawnlight::config::{ConfigError, LightingConfig};
use dawnlight::error::Error;
use dawnlight::input::SimulatedButton;
use dawnlight::machine::{Lifecycle, StateId};
use dawnlight::orchestrator::Orchestrator;
use dawnlight::output::memory::{MemoryDisplay, MemorySink};
use dawnlight::types::{ButtonId, Rgb8};

async fn tap(button: &SimulatedButton, held: Duration) {
    button.press();
    sleep(held).await;
    button.release();
}

#[tokio::test(start_paused = true)]
async fn button_presses_drive_states_until_shutdown() {
    let sink = MemorySink::new();
    let a = SimulatedButton::new();
    let u = SimulatedButton::new();
    let (tx, mut lifecycle) = mpsc::unbounded_channel();

    let orchestrator = Orchestrator::new(
        test_config(),
        Box::new(sink.clone()),
        Box::new(MemoryDisplay::new()),
    )
    .expect("valid config")
    .with_button(ButtonId::A, a.clone())
    .with_button(ButtonId::U, u.clone())
    .with_lifecycle(tx);
    let mut state = orchestrator.subscribe();

    let shutdown = CancellationToken::new();
    let run = tokio::spawn(orchestrator.run(shutdown.clone()));

    state.wait_for(|s| *s == StateId::Off).await.unwrap();
    tap(&a, Duration::from_millis(100)).await;
    state.wait_for(|s| *s == StateId::Day).await.unwrap();

    // A short press of U is a click, which Day ignores.
    tap(&u, Duration::from_millis(200)).await;
    sleep(Duration::from_millis(500)).await;
    assert_eq!(*state.borrow(), StateId::Day);

    tap(&u, Duration::from_secs(1)).await;
    state.wait_for(|s| *s == StateId::Off).await.unwrap();

    shutdown.cancel();
    assert_eq!(run.await.unwrap(), StateId::Finish);
    assert_eq!(sink.frames(), vec![Rgb8::BLACK, DAY, Rgb8::BLACK, Rgb8::BLACK]);

    let mut last = None;
    while let Ok(event) = lifecycle.try_recv() {
        last = Some(event);
    }
    assert_eq!(last, Some(Lifecycle::Entered(StateId::Finish)));
}

#[tokio::test(start_paused = true)]
async fn shutdown_from_clock_mode_stops_cleanly() {
    let sink = MemorySink::new();
    let b = SimulatedButton::new();

    let orchestrator = Orchestrator::new(
        test_config(),
        Box::new(sink.clone()),
        Box::new(MemoryDisplay::new()),
    )
    .expect("valid config")
    .with_button(ButtonId::B, b.clone());
    let mut state = orchestrator.subscribe();

    let shutdown = CancellationToken::new();
    let run = tokio::spawn(orchestrator.run(shutdown.clone()));

    state.wait_for(|s| *s == StateId::Off).await.unwrap();
    tap(&b, Duration::from_millis(100)).await;
    state.wait_for(|s| *s == StateId::ClockDay).await.unwrap();
    sleep(Duration::from_millis(300)).await;

    shutdown.cancel();
    assert_eq!(run.await.unwrap(), StateId::Finish);
    assert_eq!(sink.last(), Some(Rgb8::BLACK));
}

#[tokio::test]
async fn invalid_config_is_rejected_before_rendering() {
    let sink = MemorySink::new();
    let config = LightingConfig {
        dawn_minute: 1200,
        dusk_minute: 1200,
        ..test_config()
    };

    let result = Orchestrator::new(
        config,
        Box::new(sink.clone()),
        Box::new(MemoryDisplay::new()),
    );

    match result.err() {
        Some(Error::Config(ConfigError::DuskNotAfterDawn { dawn, dusk })) => {
            assert_eq!((dawn, dusk), (1200, 1200));
        }
        other => panic!("expected dusk-not-after-dawn, got {other:?}"),
    }
    assert!(sink.frames().is_empty());
}
