//! Engine-level transport failure.

/// Fatal error from the multiplex engine (not tied to one transfer).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport error {code}: {message}")]
pub struct TransportError {
    /// Engine-specific status code (libcurl `CURLMcode`/`CURLcode`, or 0).
    pub code: i32,
    pub message: String,
}

impl TransportError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Error for an id the session does not know about.
    pub fn unknown_transfer(id: super::TransferId) -> Self {
        Self::new(0, format!("unknown transfer {}", id))
    }
}

impl From<curl::MultiError> for TransportError {
    fn from(e: curl::MultiError) -> Self {
        Self::new(e.code() as i32, e.description().to_string())
    }
}

impl From<curl::Error> for TransportError {
    fn from(e: curl::Error) -> Self {
        Self::new(e.code() as i32, e.description().to_string())
    }
}
