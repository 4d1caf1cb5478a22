//! Lighting controller daemon.
//!
//! Runs the controller against log-only output. Buttons are simulated
//! from stdin, one command per line:
//!
//! ```text
//! a    click button A        b    click button B
//! u    click button U        U    hold button U
//! q    quit
//! ```
//!
//! Ctrl-C also shuts down. Without a console (stdin closed) the daemon
//! keeps running until signalled.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;

use dawnlight::config::LightingConfig;
use dawnlight::input::SimulatedButton;
use dawnlight::orchestrator::Orchestrator;
use dawnlight::output::log::{LogDisplay, LogSink};
use dawnlight::tracing::prelude::*;
use dawnlight::types::{ButtonId, ColourSpace};

/// Ambient day/night lighting controller
#[derive(Parser, Debug)]
#[command(name = "dawnlightd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Number of pixels on the strip
    #[arg(long, default_value = "60")]
    pixels: usize,

    /// Real milliseconds per simulated minute
    #[arg(long)]
    tick_ms: Option<u64>,

    /// Minute of day the clock turns to day
    #[arg(long)]
    dawn: Option<u16>,

    /// Minute of day the clock turns to night
    #[arg(long)]
    dusk: Option<u16>,

    /// Minute of day the clock starts at in clock mode
    #[arg(long)]
    start_minute: Option<u16>,

    /// Seconds per fade leg
    #[arg(long)]
    fade_secs: Option<u64>,

    /// Colour space fades interpolate in (rgb or hsv)
    #[arg(long)]
    fade_space: Option<ColourSpace>,

    /// Write raw values without gamma correction
    #[arg(long)]
    no_gamma: bool,
}

impl Args {
    fn config(&self) -> LightingConfig {
        let mut config = LightingConfig::default();
        if let Some(ms) = self.tick_ms {
            config.clock_tick_interval = Duration::from_millis(ms);
        }
        if let Some(dawn) = self.dawn {
            config.dawn_minute = dawn;
        }
        if let Some(dusk) = self.dusk {
            config.dusk_minute = dusk;
        }
        if let Some(minute) = self.start_minute {
            config.clock_start_minute = minute;
        }
        if let Some(secs) = self.fade_secs {
            config.fade_duration = Duration::from_secs(secs);
        }
        if let Some(space) = self.fade_space {
            config.fade_space = space;
        }
        if self.no_gamma {
            config.gamma = None;
        }
        config
    }
}

/// How long a simulated press stays down.
const CLICK_DURATION: Duration = Duration::from_millis(100);
const HOLD_DURATION: Duration = Duration::from_millis(1000);

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dawnlight::tracing::init_journald_or_stdout();

    let args = Args::parse();
    let config = args.config();

    let button_a = SimulatedButton::new();
    let button_b = SimulatedButton::new();
    let button_u = SimulatedButton::new();

    let orchestrator = Orchestrator::new(
        config,
        Box::new(LogSink::new(args.pixels)),
        Box::new(LogDisplay),
    )?
    .with_button(ButtonId::A, button_a.clone())
    .with_button(ButtonId::B, button_b.clone())
    .with_button(ButtonId::U, button_u.clone());

    let shutdown = CancellationToken::new();

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                shutdown.cancel();
            }
        }
    });

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                let (button, held) = match line.trim() {
                    "a" => (&button_a, CLICK_DURATION),
                    "b" => (&button_b, CLICK_DURATION),
                    "u" => (&button_u, CLICK_DURATION),
                    "U" => (&button_u, HOLD_DURATION),
                    "q" => {
                        shutdown.cancel();
                        break;
                    }
                    "" => continue,
                    other => {
                        warn!("Unknown command {other:?}, expected a, b, u, U or q");
                        continue;
                    }
                };
                button.press();
                tokio::time::sleep(held).await;
                button.release();
            }
        }
    });

    let final_state = orchestrator.run(shutdown).await;
    info!(state = %final_state, "Controller stopped");
    Ok(())
}
