use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by adapters and the manager.
///
/// Every network, parsing or transport failure is wrapped into one of these
/// kinds before leaving the adapter boundary; callers never see a raw
/// transport error. Corruption of an individual stream frame is recovered
/// locally and never surfaced (the stream continues without the frame).
#[derive(Error, Debug)]
pub enum Error {
    /// A required credential or context is missing. Not retryable; the
    /// caller must fix the configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The backend reported a non-success status or an unusable payload.
    /// The remote error text is carried verbatim in the message.
    #[error("backend error: {backend} - {message}")]
    Backend { backend: String, message: String },

    /// No response arrived within the configured window.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    pub fn backend(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Backend {
            backend: backend.into(),
            message: message.into(),
        }
    }
}
