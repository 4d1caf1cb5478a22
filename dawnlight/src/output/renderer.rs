use std::sync::Arc;

use tokio::sync::Mutex;

use super::PixelSink;
use crate::tracing::prelude::*;
use crate::types::{ColourMath, Rgb8};

/// The state lock. Whoever holds it owns the pixels.
pub type StateLock = Arc<Mutex<Renderer>>;

/// Writes whole-strip colours to the sink, applying gamma correction.
pub struct Renderer {
    sink: Box<dyn PixelSink>,
    math: ColourMath,
    shown: Option<Rgb8>,
    frames_skipped: u64,
}

impl Renderer {
    pub fn new(sink: Box<dyn PixelSink>, math: ColourMath) -> Self {
        Self {
            sink,
            math,
            shown: None,
            frames_skipped: 0,
        }
    }

    pub fn into_lock(self) -> StateLock {
        Arc::new(Mutex::new(self))
    }

    /// Show `colour` on the whole strip.
    ///
    /// Returns `false` when the sink rejected the frame. The failure is
    /// logged and the frame is dropped; callers keep going and the next
    /// frame retries.
    pub async fn paint(&mut self, colour: Rgb8) -> bool {
        let corrected = self.math.apply_gamma(colour);

        let result = match self.sink.set_all(corrected).await {
            Ok(()) => self.sink.flush().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                trace!(?colour, ?corrected, "Frame written");
                self.shown = Some(colour);
                true
            }
            Err(e) => {
                self.frames_skipped += 1;
                warn!(
                    error = %e,
                    ?colour,
                    frames_skipped = self.frames_skipped,
                    "Pixel sink write failed, skipping frame"
                );
                false
            }
        }
    }

    /// Last colour successfully written, before gamma correction.
    pub fn shown(&self) -> Option<Rgb8> {
        self.shown
    }

    pub fn math(&self) -> &ColourMath {
        &self.math
    }

    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }
}
