//! Output collaborators: the pixel sink and the status display.
//!
//! The bit-level LED protocol and the display hardware live behind these
//! traits. Everything the controller writes goes through a [`Renderer`]
//! (pixels) or a [`Status`] handle (text).

pub mod log;
pub mod memory;
mod renderer;

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

pub use renderer::{Renderer, StateLock};

use crate::types::Rgb8;

/// Errors from the pixel sink. Never fatal to the controller: a failed
/// frame is logged and skipped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SinkError {
    #[error("sink unavailable: {0}")]
    Unavailable(String),

    #[error("write failed: {0}")]
    Write(String),
}

/// A strip of addressable pixels driven as a single colour.
#[async_trait]
pub trait PixelSink: Send {
    /// Stage `colour` for every pixel.
    async fn set_all(&mut self, colour: Rgb8) -> Result<(), SinkError>;

    /// Latch staged pixels onto the strip. Implementations enforce their
    /// own minimum spacing between flushes.
    async fn flush(&mut self) -> Result<(), SinkError>;
}

/// A small character display. Writes are best effort.
#[async_trait]
pub trait StatusDisplay: Send {
    async fn write_line(&mut self, row: u8, text: &str);
}

/// Row showing the active state's name.
pub const STATUS_ROW_STATE: u8 = 0;

/// Row showing the virtual clock time while in clock mode.
pub const STATUS_ROW_CLOCK: u8 = 1;

/// Shared handle to the status display.
///
/// The display is separate from the state lock so the virtual clock can
/// update the time while a state task owns the pixels.
#[derive(Clone)]
pub struct Status {
    display: Arc<Mutex<Box<dyn StatusDisplay>>>,
}

impl Status {
    pub fn new(display: Box<dyn StatusDisplay>) -> Self {
        Self {
            display: Arc::new(Mutex::new(display)),
        }
    }

    pub async fn write_line(&self, row: u8, text: &str) {
        self.display.lock().await.write_line(row, text).await;
    }
}
