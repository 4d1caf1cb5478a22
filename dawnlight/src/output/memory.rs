//! In-memory collaborators for tests and dry runs.
//!
//! Both types are cheap handles over shared buffers: hand a clone to the
//! controller and keep one to inspect what was written.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{PixelSink, SinkError, StatusDisplay};
use crate::types::Rgb8;

#[derive(Debug, Default)]
struct SinkState {
    staged: Option<Rgb8>,
    frames: Vec<Rgb8>,
    flushes: u64,
    failures_pending: u32,
}

/// Records every flushed frame.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    state: Arc<Mutex<SinkState>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to `set_all` fail.
    pub fn fail_next(&self, count: u32) {
        self.state.lock().failures_pending = count;
    }

    /// Every frame flushed so far, oldest first.
    pub fn frames(&self) -> Vec<Rgb8> {
        self.state.lock().frames.clone()
    }

    pub fn last(&self) -> Option<Rgb8> {
        self.state.lock().frames.last().copied()
    }

    pub fn flushes(&self) -> u64 {
        self.state.lock().flushes
    }
}

#[async_trait]
impl PixelSink for MemorySink {
    async fn set_all(&mut self, colour: Rgb8) -> Result<(), SinkError> {
        let mut state = self.state.lock();
        if state.failures_pending > 0 {
            state.failures_pending -= 1;
            return Err(SinkError::Unavailable("injected failure".into()));
        }
        state.staged = Some(colour);
        Ok(())
    }

    async fn flush(&mut self) -> Result<(), SinkError> {
        let mut state = self.state.lock();
        state.flushes += 1;
        if let Some(colour) = state.staged.take() {
            state.frames.push(colour);
        }
        Ok(())
    }
}

/// Records every status line written.
#[derive(Debug, Clone, Default)]
pub struct MemoryDisplay {
    lines: Arc<Mutex<Vec<(u8, String)>>>,
}

impl MemoryDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<(u8, String)> {
        self.lines.lock().clone()
    }

    /// Most recent text written to `row`.
    pub fn row(&self, row: u8) -> Option<String> {
        self.lines
            .lock()
            .iter()
            .rev()
            .find(|(r, _)| *r == row)
            .map(|(_, text)| text.clone())
    }
}

#[async_trait]
impl StatusDisplay for MemoryDisplay {
    async fn write_line(&mut self, row: u8, text: &str) {
        self.lines.lock().push((row, text.to_owned()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unflushed_frames_are_not_recorded() {
        let mut sink = MemorySink::new();
        sink.set_all(Rgb8::new(1, 1, 1)).await.unwrap();
        assert!(sink.frames().is_empty());
        sink.flush().await.unwrap();
        assert_eq!(sink.frames(), vec![Rgb8::new(1, 1, 1)]);
    }

    #[tokio::test]
    async fn injected_failures_run_out() {
        let mut sink = MemorySink::new();
        sink.fail_next(2);
        assert!(sink.set_all(Rgb8::BLACK).await.is_err());
        assert!(sink.set_all(Rgb8::BLACK).await.is_err());
        assert!(sink.set_all(Rgb8::BLACK).await.is_ok());
    }

    #[tokio::test]
    async fn display_reports_latest_line_per_row() {
        let mut display = MemoryDisplay::new();
        display.write_line(0, "Off").await;
        display.write_line(1, "12:00").await;
        display.write_line(0, "Day").await;
        assert_eq!(display.row(0).as_deref(), Some("Day"));
        assert_eq!(display.row(1).as_deref(), Some("12:00"));
        assert_eq!(display.row(2), None);
    }
}
