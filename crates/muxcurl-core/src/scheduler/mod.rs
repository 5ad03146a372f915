//! Bounded-concurrency request scheduler.
//!
//! Callers enqueue requests and call `run` once. The scheduler keeps at most
//! `multiplex_limit` transfers in flight on one transport session, consults
//! the throttle before each dispatch batch, retries timeouts and HTTP 429 up
//! to `max_attempts` total attempts, and returns responses in completion
//! order.

mod active;
mod error;
mod queue;
mod run;

pub use active::{ActiveSet, ActiveTransfer};
pub use error::SchedulerError;
pub use queue::PendingQueue;

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::config::MuxConfig;
use crate::request::{Headers, Request, TransferOptions};
use crate::response::Response;
use crate::throttle::{OpenThrottle, SlidingWindow, Throttle};
use crate::transport::{CurlTransport, Transport};

/// Hook invoked with every finalized request and its response.
pub type CompletionHook = Box<dyn FnMut(&Request, &Response) -> anyhow::Result<()>>;

/// Default number of concurrent transfers.
pub const DEFAULT_MULTIPLEX_LIMIT: usize = 5;
/// Default attempts per request, including the first (no retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 1;
/// Default bound on one transport wait.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Whether a run is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

/// Schedules requests over a multiplexed transport.
///
/// A scheduler is single-threaded: its run state, throttle and callbacks are
/// not `Send`, so it stays on the thread that created it.
///
/// ```compile_fail
/// fn assert_send<T: Send>() {}
/// assert_send::<muxcurl_core::Scheduler>();
/// ```
pub struct Scheduler<T: Transport = CurlTransport> {
    transport: T,
    throttle: Box<dyn Throttle>,
    pending: PendingQueue,
    options: TransferOptions,
    headers: Headers,
    multiplex_limit: usize,
    max_attempts: u32,
    poll_interval: Duration,
    on_complete: Option<CompletionHook>,
    state: Rc<Cell<RunState>>,
}

impl Scheduler<CurlTransport> {
    /// Scheduler over libcurl with default settings.
    pub fn with_curl() -> Self {
        Self::new(CurlTransport::new())
    }
}

impl Default for Scheduler<CurlTransport> {
    fn default() -> Self {
        Self::with_curl()
    }
}

impl<T: Transport> Scheduler<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            throttle: Box::new(OpenThrottle),
            pending: PendingQueue::new(),
            options: TransferOptions::defaults(),
            headers: Headers::new(),
            multiplex_limit: DEFAULT_MULTIPLEX_LIMIT,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            on_complete: None,
            state: Rc::new(Cell::new(RunState::Idle)),
        }
    }

    /// Builds a scheduler from loaded configuration.
    pub fn from_config(cfg: &MuxConfig, transport: T) -> Self {
        let mut scheduler = Self::new(transport);
        scheduler.set_multiplex_limit(cfg.multiplex_limit);
        scheduler.set_max_attempts(cfg.max_attempts);
        scheduler.set_poll_interval(Duration::from_millis(cfg.poll_interval_ms));
        scheduler.add_options(&cfg.transfer.to_options());
        scheduler.add_headers(cfg.headers.iter());
        if let Some(ref throttle) = cfg.throttle {
            scheduler.set_throttle(SlidingWindow::new(throttle.rate_per_second));
        }
        scheduler
    }

    /// Enqueues a request. The most recently added request is dispatched first.
    pub fn add_request(&mut self, request: Request) {
        self.pending.push(request);
    }

    /// Merges transport options applied to every request; per-request options win.
    pub fn add_options(&mut self, options: &TransferOptions) {
        self.options.merge(options);
    }

    pub fn options(&self) -> &TransferOptions {
        &self.options
    }

    /// Adds headers sent with every request; per-request headers win.
    pub fn add_headers<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToString,
    {
        self.headers.replace_with(headers);
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn multiplex_limit(&self) -> usize {
        self.multiplex_limit
    }

    /// Sets how many transfers may be in flight at once (at least 1).
    pub fn set_multiplex_limit(&mut self, limit: usize) {
        self.multiplex_limit = limit.max(1);
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Sets total attempts per request for timeouts and HTTP 429. 0 behaves as 1.
    pub fn set_max_attempts(&mut self, attempts: u32) {
        self.max_attempts = attempts;
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    pub fn set_poll_interval(&mut self, interval: Duration) {
        self.poll_interval = interval;
    }

    /// Sets the hook called with `(request, response)` as each request finalizes.
    pub fn set_on_complete<F>(&mut self, hook: F)
    where
        F: FnMut(&Request, &Response) -> anyhow::Result<()> + 'static,
    {
        self.on_complete = Some(Box::new(hook));
    }

    pub fn throttle(&self) -> &dyn Throttle {
        self.throttle.as_ref()
    }

    pub fn throttle_mut(&mut self) -> &mut dyn Throttle {
        self.throttle.as_mut()
    }

    pub fn set_throttle(&mut self, throttle: impl Throttle + 'static) {
        self.throttle = Box::new(throttle);
    }

    pub fn is_running(&self) -> bool {
        self.state.get() == RunState::Running
    }

    pub fn has_requests(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_request_count(&self) -> usize {
        self.pending.len()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }
}
