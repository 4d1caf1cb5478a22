mod colour;
mod event;

pub use colour::{ColourMath, ColourSpace, Hsv, Rgb8};
pub use event::{ButtonId, Event, EventKind, EventSource};
