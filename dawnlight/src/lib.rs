//! Ambient day/night lighting controller.
//!
//! Drives an addressable-LED installation through a handful of mutually
//! exclusive modes (off, static day, static night, and clock-driven
//! day/night with sunrise/sunset fades). Buttons and an accelerated
//! virtual clock feed events through a single-slot mailbox into a state
//! machine that guarantees exactly one state renders at a time.
//!
//! The LED wire protocol, status display hardware and raw GPIO access are
//! external collaborators behind the traits in [`output`] and [`input`].

pub mod clock;
pub mod config;
pub mod error;
pub mod fade;
pub mod input;
pub mod machine;
pub mod orchestrator;
pub mod output;
pub mod sync;
pub mod tracing;
pub mod types;
