//! In-memory transport for scheduler tests.
//!
//! Every transfer completes a fixed delay after it is (re)submitted. The
//! outcome of each attempt is scripted per URL path; unscripted attempts
//! finish with HTTP 200. A shared `Probe` records what the scheduler did.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::{Duration, Instant};

use muxcurl_core::request::TransferSpec;
use muxcurl_core::transport::{
    Completed, Outcome, Perform, Session, TransferId, TransferInfo, Transport, TransportError,
};

/// Scripted result of one attempt.
#[derive(Debug, Clone)]
pub struct Step {
    pub outcome: Outcome,
    pub status: u32,
}

impl Step {
    pub fn ok() -> Self {
        Self::status(200)
    }

    pub fn status(status: u32) -> Self {
        Self {
            outcome: Outcome::Done,
            status,
        }
    }

    pub fn timed_out() -> Self {
        Self {
            outcome: Outcome::TimedOut,
            status: 0,
        }
    }

    pub fn failed(reason: &str) -> Self {
        Self {
            outcome: Outcome::Failed(reason.to_string()),
            status: 0,
        }
    }
}

/// Observations shared between the test and the transport.
#[derive(Debug, Default)]
pub struct Probe {
    /// URL path of every submission, retries included, in order.
    pub submissions: Vec<String>,
    /// Specs passed to `add`.
    pub specs: Vec<TransferSpec>,
    /// Transfers added and not yet released.
    pub active_now: usize,
    pub max_active: usize,
    pub sessions_opened: usize,
    pub sessions_dropped: usize,
}

pub struct MockTransport {
    pub probe: Rc<RefCell<Probe>>,
    delay: Duration,
    script: Rc<RefCell<HashMap<String, VecDeque<Step>>>>,
    fail_on_perform: Option<usize>,
}

impl MockTransport {
    pub fn new(delay: Duration) -> Self {
        Self {
            probe: Rc::new(RefCell::new(Probe::default())),
            delay,
            script: Rc::new(RefCell::new(HashMap::new())),
            fail_on_perform: None,
        }
    }

    /// Scripts the attempts for `path` in order.
    pub fn script(self, path: &str, steps: Vec<Step>) -> Self {
        self.script
            .borrow_mut()
            .insert(path.to_string(), steps.into_iter().collect());
        self
    }

    /// Makes the n-th `perform` call (1-based) fail with an engine error.
    pub fn fail_on_perform(mut self, n: usize) -> Self {
        self.fail_on_perform = Some(n);
        self
    }

    pub fn probe(&self) -> Rc<RefCell<Probe>> {
        Rc::clone(&self.probe)
    }
}

impl Transport for MockTransport {
    type Session = MockSession;

    fn open(&mut self) -> Result<MockSession, TransportError> {
        self.probe.borrow_mut().sessions_opened += 1;
        Ok(MockSession {
            probe: Rc::clone(&self.probe),
            delay: self.delay,
            script: Rc::clone(&self.script),
            fail_on_perform: self.fail_on_perform,
            performs: 0,
            in_flight: Vec::new(),
            ready: Vec::new(),
            finished: HashMap::new(),
        })
    }
}

struct InFlight {
    id: TransferId,
    spec: TransferSpec,
    started: Instant,
}

pub struct MockSession {
    probe: Rc<RefCell<Probe>>,
    delay: Duration,
    script: Rc<RefCell<HashMap<String, VecDeque<Step>>>>,
    fail_on_perform: Option<usize>,
    performs: usize,
    in_flight: Vec<InFlight>,
    ready: Vec<Completed>,
    finished: HashMap<TransferId, TransferSpec>,
}

fn path_of(spec: &TransferSpec) -> String {
    url::Url::parse(&spec.url)
        .map(|u| u.path().to_string())
        .unwrap_or_default()
}

impl MockSession {
    fn submit(&mut self, id: TransferId, spec: TransferSpec) {
        self.probe.borrow_mut().submissions.push(path_of(&spec));
        self.in_flight.push(InFlight {
            id,
            spec,
            started: Instant::now(),
        });
    }

    fn next_step(&self, spec: &TransferSpec) -> Step {
        self.script
            .borrow_mut()
            .get_mut(&path_of(spec))
            .and_then(|steps| steps.pop_front())
            .unwrap_or_else(Step::ok)
    }
}

impl Session for MockSession {
    fn add(&mut self, id: TransferId, spec: TransferSpec) -> Result<(), TransportError> {
        {
            let mut probe = self.probe.borrow_mut();
            probe.specs.push(spec.clone());
            probe.active_now += 1;
            probe.max_active = probe.max_active.max(probe.active_now);
        }
        self.submit(id, spec);
        Ok(())
    }

    fn restart(&mut self, id: TransferId) -> Result<(), TransportError> {
        let spec = self
            .finished
            .remove(&id)
            .ok_or_else(|| TransportError::unknown_transfer(id))?;
        self.submit(id, spec);
        Ok(())
    }

    fn perform(&mut self) -> Result<Perform, TransportError> {
        self.performs += 1;
        if self.fail_on_perform == Some(self.performs) {
            return Err(TransportError::new(7, "engine failure"));
        }
        let now = Instant::now();
        let (done, still): (Vec<InFlight>, Vec<InFlight>) = self
            .in_flight
            .drain(..)
            .partition(|t| now.duration_since(t.started) >= self.delay);
        self.in_flight = still;
        for t in done {
            let step = self.next_step(&t.spec);
            let body = if t.spec.no_body {
                Vec::new()
            } else {
                format!("{} {}", t.spec.method, path_of(&t.spec)).into_bytes()
            };
            self.ready.push(Completed {
                id: t.id,
                outcome: step.outcome,
                info: TransferInfo {
                    status: step.status,
                    effective_url: t.spec.url.clone(),
                    body,
                    content_type: Some("text/plain; charset=UTF-8".to_string()),
                    total_time: now.duration_since(t.started),
                    connect_time: Duration::ZERO,
                },
            });
            self.finished.insert(t.id, t.spec);
        }
        Ok(Perform {
            running: self.in_flight.len(),
            again: false,
        })
    }

    fn wait(&mut self, timeout: Duration) -> Result<(), TransportError> {
        let now = Instant::now();
        let next = self
            .in_flight
            .iter()
            .map(|t| (t.started + self.delay).saturating_duration_since(now))
            .min()
            .unwrap_or(Duration::ZERO);
        std::thread::sleep(next.min(timeout));
        Ok(())
    }

    fn completed(&mut self) -> Result<Vec<Completed>, TransportError> {
        Ok(std::mem::take(&mut self.ready))
    }

    fn release(&mut self, id: TransferId) -> Result<(), TransportError> {
        self.finished
            .remove(&id)
            .ok_or_else(|| TransportError::unknown_transfer(id))?;
        self.probe.borrow_mut().active_now -= 1;
        Ok(())
    }
}

impl Drop for MockSession {
    fn drop(&mut self) {
        self.probe.borrow_mut().sessions_dropped += 1;
    }
}
