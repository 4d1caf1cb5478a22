//! Crate-wide error type.

use crate::config::ConfigError;

/// Errors surfaced by the controller's public entry points.
///
/// Output failures are not among them: the renderer logs a failed frame
/// and retries, so they never reach a caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
