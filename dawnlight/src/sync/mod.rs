//! Blocking hand-off channels between event producers and the state
//! machine.
//!
//! Both channels exert backpressure: a producer waits for room rather
//! than overwriting a pending item, so nothing is silently dropped.

use std::fmt;

pub mod mailbox;
pub mod ring;

pub use mailbox::Mailbox;
pub use ring::RingChannel;

/// The channel was closed while waiting. Carries the undelivered item
/// back to a producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Closed<T>(pub T);

impl<T> fmt::Display for Closed<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("channel closed")
    }
}

impl<T: fmt::Debug> std::error::Error for Closed<T> {}
