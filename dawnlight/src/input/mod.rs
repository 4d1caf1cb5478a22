//! Button input: raw level reads, press classification, and the tasks
//! that forward classified presses to the state machine.

pub mod classifier;
pub mod task;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub use classifier::{ButtonClassifier, ClassifierMode, Press};
pub use task::{ButtonTask, InputForwarder};

/// Instantaneous electrical level of one button.
pub trait RawButton: Send {
    /// `true` while the button is held down.
    fn is_pressed(&self) -> bool;
}

impl<B: RawButton + ?Sized> RawButton for Box<B> {
    fn is_pressed(&self) -> bool {
        (**self).is_pressed()
    }
}

/// A button whose level is set in software.
///
/// Clones share the same level, so one copy can be handed to the
/// classifier while another is driven from a test or a console.
#[derive(Debug, Clone, Default)]
pub struct SimulatedButton {
    level: Arc<AtomicBool>,
}

impl SimulatedButton {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self) {
        self.level.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.level.store(false, Ordering::SeqCst);
    }
}

impl RawButton for SimulatedButton {
    fn is_pressed(&self) -> bool {
        self.level.load(Ordering::SeqCst)
    }
}
