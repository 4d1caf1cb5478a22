//! Events flowing from input sources to the state machine.
//!
//! Events are opaque to the mailbox. Only the state machine's transition
//! table gives them meaning, keyed on both the source and the kind so
//! that "click on A" and "click on B" are different triggers.

use std::fmt;

/// Physical buttons on the installation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
pub enum ButtonId {
    /// Toggles between the static day and night modes.
    A,
    /// Enters clock-driven mode.
    B,
    /// Universal "off" button, acts on hold.
    U,
}

/// Where an event originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    Button(ButtonId),
    Clock,
    /// Synthetic events raised by the controller itself (`Start` → `Off`,
    /// shutdown).
    System,
}

impl fmt::Display for EventSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventSource::Button(id) => write!(f, "button-{id}"),
            EventSource::Clock => f.write_str("clock"),
            EventSource::System => f.write_str("system"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum EventKind {
    Click,
    Hold,
    DayTrigger,
    NightTrigger,
    Auto,
    Shutdown,
}

/// An immutable, classified event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Event {
    pub source: EventSource,
    pub kind: EventKind,
}

impl Event {
    pub const fn new(source: EventSource, kind: EventKind) -> Self {
        Self { source, kind }
    }

    pub const fn click(button: ButtonId) -> Self {
        Self::new(EventSource::Button(button), EventKind::Click)
    }

    pub const fn hold(button: ButtonId) -> Self {
        Self::new(EventSource::Button(button), EventKind::Hold)
    }

    pub const fn day_trigger() -> Self {
        Self::new(EventSource::Clock, EventKind::DayTrigger)
    }

    pub const fn night_trigger() -> Self {
        Self::new(EventSource::Clock, EventKind::NightTrigger)
    }

    pub const fn auto() -> Self {
        Self::new(EventSource::System, EventKind::Auto)
    }

    pub const fn shutdown() -> Self {
        Self::new(EventSource::System, EventKind::Shutdown)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.source, self.kind)
    }
}
