//! Dispatcher error types

use thiserror::Error;

/// Errors raised while building sinks
///
/// Per-send failures never surface here; they travel as
/// [`contracts::ContractError`] through the sink trait.
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// A sink could not be set up
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Destination host did not resolve
    #[error("cannot resolve destination '{target}'")]
    Resolve { target: String },

    /// HTTP client could not be built
    #[error("http client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Socket setup failed
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),
}

impl DispatcherError {
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }
}
