//! Press classification with a latched result.
//!
//! # State Machine
//!
//! ```text
//!            pressed                 released
//!  Released ─────────► Pressed(t0) ──────────► Latched(click | hold)
//!     ▲                                               │
//!     └─────────────────── clear() ───────────────────┘
//! ```
//!
//! The result stays latched until the consumer calls
//! [`clear`](ButtonClassifier::clear). While latched, further presses are
//! not classified, so a slow consumer delays the button instead of losing
//! a press.

use std::time::Duration;

use tokio::time::Instant;

/// Classified outcome of one press/release cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Click,
    Hold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassifierMode {
    /// Every release is a click.
    ClickOnly,
    /// Releases after at least `threshold` held are holds.
    ClickOrHold { threshold: Duration },
}

#[derive(Debug)]
enum State {
    Released,
    Pressed(Instant),
    Latched(Press),
    /// Latched result was cleared while the button is still down. Wait
    /// for a release before timing a new press.
    AwaitRelease,
}

#[derive(Debug)]
pub struct ButtonClassifier {
    mode: ClassifierMode,
    state: State,
}

impl ButtonClassifier {
    pub fn new(mode: ClassifierMode) -> Self {
        Self {
            mode,
            state: State::Released,
        }
    }

    /// Feed one level sample. Returns the classification made on this
    /// sample, if any; the same value stays available from
    /// [`result`](Self::result) until cleared.
    pub fn poll(&mut self, pressed: bool) -> Option<Press> {
        self.poll_at(pressed, Instant::now())
    }

    fn poll_at(&mut self, pressed: bool, now: Instant) -> Option<Press> {
        match (&self.state, pressed) {
            (State::Released, true) => {
                self.state = State::Pressed(now);
                None
            }
            (State::Released, false) => None,

            (State::Pressed(_), true) => None,
            (State::Pressed(since), false) => {
                let press = self.classify(now.duration_since(*since));
                self.state = State::Latched(press);
                Some(press)
            }

            (State::Latched(_), _) => None,

            (State::AwaitRelease, true) => None,
            (State::AwaitRelease, false) => {
                self.state = State::Released;
                None
            }
        }
    }

    fn classify(&self, held: Duration) -> Press {
        match self.mode {
            ClassifierMode::ClickOnly => Press::Click,
            ClassifierMode::ClickOrHold { threshold } if held >= threshold => Press::Hold,
            ClassifierMode::ClickOrHold { .. } => Press::Click,
        }
    }

    /// The latched, not yet acknowledged result.
    pub fn result(&self) -> Option<Press> {
        match self.state {
            State::Latched(press) => Some(press),
            _ => None,
        }
    }

    /// Acknowledge the latched result so the next press can be
    /// classified.
    ///
    /// `still_pressed` is the current level: a button already down again
    /// must be released before its next press is timed, since the start
    /// of that press was never observed.
    pub fn clear(&mut self, still_pressed: bool) {
        if matches!(self.state, State::Latched(_)) {
            self.state = if still_pressed {
                State::AwaitRelease
            } else {
                State::Released
            };
        }
    }
}
