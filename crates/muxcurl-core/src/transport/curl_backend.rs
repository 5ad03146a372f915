//! libcurl multi backend: one `Multi` handle, one `Easy2` per transfer.
//!
//! Completed handles are detached from the multi handle and parked until the
//! scheduler either restarts or releases them.

use std::collections::HashMap;
use std::time::Duration;

use curl::easy::{Easy2, Handler, List, WriteError};
use curl::multi::{Easy2Handle, Multi};

use crate::request::TransferSpec;

use super::{
    Completed, Outcome, Perform, Session, TransferId, TransferInfo, Transport, TransportError,
};

/// Transport backed by libcurl's multi interface.
#[derive(Debug, Clone, Copy, Default)]
pub struct CurlTransport;

impl CurlTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for CurlTransport {
    type Session = CurlSession;

    fn open(&mut self) -> Result<CurlSession, TransportError> {
        Ok(CurlSession {
            running: HashMap::new(),
            finished: HashMap::new(),
            multi: Multi::new(),
        })
    }
}

/// Collects the response body of one transfer.
#[derive(Debug, Default)]
pub struct Collector {
    body: Vec<u8>,
}

impl Handler for Collector {
    fn write(&mut self, data: &[u8]) -> Result<usize, WriteError> {
        self.body.extend_from_slice(data);
        Ok(data.len())
    }
}

/// One curl multi context. Handles are declared before `multi` so they
/// detach before it is cleaned up.
pub struct CurlSession {
    running: HashMap<TransferId, Easy2Handle<Collector>>,
    finished: HashMap<TransferId, Easy2<Collector>>,
    multi: Multi,
}

/// Applies `spec` to a fresh easy handle.
fn configure(spec: &TransferSpec) -> Result<Easy2<Collector>, TransportError> {
    let mut easy = Easy2::new(Collector::default());
    easy.url(&spec.url)?;

    match spec.method.as_str() {
        "GET" => easy.get(true)?,
        "HEAD" => easy.nobody(true)?,
        "POST" => easy.post(true)?,
        other => easy.custom_request(other)?,
    }
    if spec.no_body {
        easy.nobody(true)?;
    }
    if let Some(ref body) = spec.body {
        if spec.method != "POST" {
            easy.post(true)?;
            easy.custom_request(&spec.method)?;
        }
        easy.post_fields_copy(body)?;
    }

    let opts = &spec.options;
    if let Some(follow) = opts.follow_redirects {
        easy.follow_location(follow)?;
    }
    if let Some(max) = opts.max_redirects {
        easy.max_redirections(max)?;
    }
    if let Some(t) = opts.connect_timeout {
        easy.connect_timeout(t)?;
    }
    if let Some(t) = opts.timeout {
        easy.timeout(t)?;
    }
    if let Some(ref ua) = opts.user_agent {
        easy.useragent(ua)?;
    }

    if !spec.headers.is_empty() {
        let mut list = List::new();
        for line in spec.headers.to_lines() {
            list.append(&line)?;
        }
        easy.http_headers(list)?;
    }
    Ok(easy)
}

/// Reads status, timing and body out of a detached handle.
fn transfer_info(easy: &mut Easy2<Collector>) -> TransferInfo {
    let effective_url = easy
        .effective_url()
        .ok()
        .flatten()
        .unwrap_or_default()
        .to_string();
    TransferInfo {
        status: easy.response_code().unwrap_or(0),
        effective_url,
        content_type: easy.content_type().ok().flatten().map(str::to_string),
        total_time: easy.total_time().unwrap_or(Duration::ZERO),
        connect_time: easy.connect_time().unwrap_or(Duration::ZERO),
        body: std::mem::take(&mut easy.get_mut().body),
    }
}

fn outcome_of(result: Result<(), curl::Error>) -> Outcome {
    match result {
        Ok(()) => Outcome::Done,
        Err(e) if e.is_operation_timedout() => Outcome::TimedOut,
        Err(e) => Outcome::Failed(e.to_string()),
    }
}

impl Session for CurlSession {
    fn add(&mut self, id: TransferId, spec: TransferSpec) -> Result<(), TransportError> {
        let easy = configure(&spec)?;
        let handle = self.multi.add2(easy)?;
        tracing::trace!(transfer = %id, url = %spec.url, "curl handle added");
        self.running.insert(id, handle);
        Ok(())
    }

    fn restart(&mut self, id: TransferId) -> Result<(), TransportError> {
        let mut easy = self
            .finished
            .remove(&id)
            .ok_or_else(|| TransportError::unknown_transfer(id))?;
        easy.get_mut().body.clear();
        let handle = self.multi.add2(easy)?;
        self.running.insert(id, handle);
        Ok(())
    }

    fn perform(&mut self) -> Result<Perform, TransportError> {
        let running = self.multi.perform()?;
        Ok(Perform {
            running: running as usize,
            again: false,
        })
    }

    fn wait(&mut self, timeout: Duration) -> Result<(), TransportError> {
        self.multi.wait(&mut [], timeout)?;
        Ok(())
    }

    fn completed(&mut self) -> Result<Vec<Completed>, TransportError> {
        let mut done: Vec<(TransferId, Result<(), curl::Error>)> = Vec::new();
        let running = &self.running;
        self.multi.messages(|msg| {
            for (id, handle) in running.iter() {
                if let Some(result) = msg.result_for2(handle) {
                    done.push((*id, result));
                    break;
                }
            }
        });

        let mut completed = Vec::with_capacity(done.len());
        for (id, result) in done {
            let Some(handle) = self.running.remove(&id) else {
                continue;
            };
            let mut easy = self.multi.remove2(handle)?;
            let info = transfer_info(&mut easy);
            completed.push(Completed {
                id,
                outcome: outcome_of(result),
                info,
            });
            self.finished.insert(id, easy);
        }
        Ok(completed)
    }

    fn release(&mut self, id: TransferId) -> Result<(), TransportError> {
        self.finished
            .remove(&id)
            .map(drop)
            .ok_or_else(|| TransportError::unknown_transfer(id))
    }
}
