//! Errors that abort a whole scheduler run.

use crate::transport::TransportError;

/// A run failed as a whole; no partial results are returned.
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The transport engine failed outside any single transfer.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A completion callback returned an error.
    #[error("completion callback failed for {url}")]
    Callback {
        url: String,
        #[source]
        source: anyhow::Error,
    },
}
