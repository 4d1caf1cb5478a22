//! Collaborators that only log, used by the daemon when no hardware is
//! attached.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use super::{PixelSink, SinkError, StatusDisplay};
use crate::tracing::prelude::*;
use crate::types::Rgb8;

/// Minimum spacing between flushes, matching a WS2812 latch period with
/// margin.
const MIN_FLUSH_SPACING: Duration = Duration::from_micros(300);

/// Pixel sink that logs each latched frame.
pub struct LogSink {
    pixels: usize,
    staged: Option<Rgb8>,
    last_flush: Option<Instant>,
}

impl LogSink {
    pub fn new(pixels: usize) -> Self {
        Self {
            pixels,
            staged: None,
            last_flush: None,
        }
    }
}

#[async_trait]
impl PixelSink for LogSink {
    async fn set_all(&mut self, colour: Rgb8) -> Result<(), SinkError> {
        self.staged = Some(colour);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        if let Some(last) = self.last_flush {
            let since = last.elapsed();
            if since < MIN_FLUSH_SPACING {
                tokio::time::sleep(MIN_FLUSH_SPACING - since).await;
            }
        }
        self.last_flush = Some(Instant::now());

        if let Some(Rgb8 { r, g, b }) = self.staged.take() {
            debug!(pixels = self.pixels, "Strip #{r:02x}{g:02x}{b:02x}");
        }
        Ok(())
    }
}

/// Status display that logs each line.
#[derive(Default)]
pub struct LogDisplay;

#[async_trait]
impl StatusDisplay for LogDisplay {
    async fn write_line(&mut self, row: u8, text: &str) {
        info!(row, "Display: {text}");
    }
}
