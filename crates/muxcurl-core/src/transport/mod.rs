//! Multiplexed transport the scheduler drives.
//!
//! A `Transport` opens one `Session` per scheduler run. The session owns
//! every in-flight transfer; dropping it releases them all. The scheduler
//! only ever calls it from one thread.

mod curl_backend;
mod error;

pub use curl_backend::CurlTransport;
pub use error::TransportError;

use std::fmt;
use std::time::Duration;

use crate::request::TransferSpec;

/// Stable identifier of a transfer, assigned by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TransferId(pub u64);

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a transfer ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Transfer finished; inspect the status code for the HTTP result.
    Done,
    /// Connect or total timeout elapsed.
    TimedOut,
    /// Any other per-transfer failure (DNS, connection reset, ...).
    Failed(String),
}

/// Data captured from a finished transfer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransferInfo {
    /// HTTP status code; 0 when no response was received.
    pub status: u32,
    /// URL after following redirects.
    pub effective_url: String,
    pub body: Vec<u8>,
    /// Raw `Content-Type` header value.
    pub content_type: Option<String>,
    pub total_time: Duration,
    pub connect_time: Duration,
}

/// A transfer the session reports as finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub id: TransferId,
    pub outcome: Outcome,
    pub info: TransferInfo,
}

/// Result of one event-processing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Perform {
    /// Transfers still in progress inside the session.
    pub running: usize,
    /// True if the step should be called again before waiting.
    pub again: bool,
}

/// Factory for multiplex contexts.
pub trait Transport {
    type Session: Session;

    /// Creates a fresh multiplex context for one run.
    fn open(&mut self) -> Result<Self::Session, TransportError>;
}

/// One multiplex context holding many concurrent transfers.
///
/// Errors returned from any method are fatal for the whole run; per-transfer
/// failures are reported through `Completed::outcome` instead.
pub trait Session {
    /// Starts a new transfer.
    fn add(&mut self, id: TransferId, spec: TransferSpec) -> Result<(), TransportError>;

    /// Re-submits a completed, not yet released transfer with the same configuration.
    fn restart(&mut self, id: TransferId) -> Result<(), TransportError>;

    /// Drives I/O without blocking.
    fn perform(&mut self) -> Result<Perform, TransportError>;

    /// Blocks until some transfer has activity or `timeout` elapses.
    fn wait(&mut self, timeout: Duration) -> Result<(), TransportError>;

    /// Drains transfers that finished since the last call.
    fn completed(&mut self) -> Result<Vec<Completed>, TransportError>;

    /// Frees a completed transfer.
    fn release(&mut self, id: TransferId) -> Result<(), TransportError>;
}
