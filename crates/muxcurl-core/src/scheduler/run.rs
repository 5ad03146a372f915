//! The dispatch / poll / retry / finalize loop.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use crate::response::Response;
use crate::transport::{Completed, Outcome, Session, Transport, TransportError};

use super::active::{ActiveSet, ActiveTransfer};
use super::error::SchedulerError;
use super::{RunState, Scheduler};

/// HTTP status that asks the client to slow down and try again.
const TOO_MANY_REQUESTS: u32 = 429;

/// Sleep used when the throttle blocks dispatch, nothing is in flight, and
/// it has no estimate to offer.
const IDLE_BACKOFF: Duration = Duration::from_millis(10);

/// Puts the scheduler back to idle when the run ends, including by panic.
struct RunGuard(Rc<Cell<RunState>>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.set(RunState::Idle);
    }
}

/// Drives the session until it has no immediate work left; returns how many
/// transfers are still running.
fn drive<S: Session>(session: &mut S) -> Result<usize, TransportError> {
    loop {
        let step = session.perform()?;
        if !step.again {
            return Ok(step.running);
        }
    }
}

impl<T: Transport> Scheduler<T> {
    /// Runs every pending request to completion and returns the responses in
    /// the order they finished.
    ///
    /// Returns an empty list without doing anything if a run is already in
    /// progress. On error the run is abandoned as a whole: every transfer is
    /// released and no responses are returned.
    pub fn run(&mut self) -> Result<Vec<Response>, SchedulerError> {
        if self.state.get() == RunState::Running {
            tracing::warn!("run requested while already running; ignoring");
            return Ok(Vec::new());
        }
        self.state.set(RunState::Running);
        let _guard = RunGuard(Rc::clone(&self.state));

        let queued = self.pending.len();
        tracing::info!(
            queued,
            multiplex_limit = self.multiplex_limit,
            max_attempts = self.max_attempts,
            "scheduler run started"
        );
        match self.run_loop() {
            Ok(output) => {
                tracing::info!(responses = output.len(), "scheduler run finished");
                Ok(output)
            }
            Err(e) => {
                tracing::warn!(error = %e, "scheduler run aborted");
                Err(e)
            }
        }
    }

    fn run_loop(&mut self) -> Result<Vec<Response>, SchedulerError> {
        let mut session = self.transport.open()?;
        let mut active = ActiveSet::new();
        let mut output = Vec::new();

        loop {
            self.throttle.tick();

            let throttled = !self.throttle.can_request();
            if !throttled {
                self.dispatch(&mut session, &mut active)?;
            } else if let Some(delay) = self.throttle.estimate().filter(|d| !d.is_zero()) {
                tracing::debug!(?delay, "throttled; waiting");
                std::thread::sleep(delay);
                continue;
            }

            let running = drive(&mut session)?;
            for done in session.completed()? {
                self.finish(&mut session, &mut active, done, &mut output)?;
            }

            if running == 0 && active.is_empty() && self.pending.is_empty() {
                break;
            }
            if running > 0 {
                session.wait(self.poll_interval)?;
            } else if throttled && active.is_empty() {
                std::thread::sleep(IDLE_BACKOFF);
            }
        }

        Ok(output)
    }

    /// Moves pending requests into the session until the queue is empty or
    /// the multiplex limit is reached.
    fn dispatch(
        &mut self,
        session: &mut T::Session,
        active: &mut ActiveSet,
    ) -> Result<(), TransportError> {
        while active.len() < self.multiplex_limit {
            let Some(request) = self.pending.pop() else {
                break;
            };
            let spec = request.to_transfer(&self.options, &self.headers);
            let id = active.insert(request);
            tracing::debug!(transfer = %id, method = %spec.method, url = %spec.url, "dispatch");
            session.add(id, spec)?;
        }
        Ok(())
    }

    /// Retries or finalizes one completed transfer.
    fn finish(
        &mut self,
        session: &mut T::Session,
        active: &mut ActiveSet,
        done: Completed,
        output: &mut Vec<Response>,
    ) -> Result<(), SchedulerError> {
        let Completed { id, outcome, info } = done;
        self.throttle.record_transfer(info.total_time);

        let slot = active
            .get_mut(id)
            .ok_or_else(|| TransportError::unknown_transfer(id))?;
        let transient = outcome == Outcome::TimedOut || info.status == TOO_MANY_REQUESTS;
        if transient && slot.attempts < self.max_attempts.saturating_sub(1) {
            slot.attempts += 1;
            tracing::warn!(
                transfer = %id,
                url = %slot.request.url(),
                status = info.status,
                ?outcome,
                attempt = slot.attempts + 1,
                "retrying transfer"
            );
            session.restart(id)?;
            return Ok(());
        }

        let ActiveTransfer {
            mut request,
            attempts,
        } = active
            .remove(id)
            .ok_or_else(|| TransportError::unknown_transfer(id))?;
        if let Outcome::Failed(ref reason) = outcome {
            tracing::debug!(transfer = %id, %reason, "transfer failed");
        }

        let response = Response::from_transfer(&info);
        tracing::debug!(
            transfer = %id,
            url = %response.url(),
            status = response.status(),
            attempts = attempts + 1,
            time_ms = response.time().as_millis() as u64,
            "transfer finalized"
        );

        let hooked = match self.on_complete.as_mut() {
            Some(hook) => hook(&request, &response),
            None => Ok(()),
        };
        if let Err(source) = hooked.and_then(|()| request.complete(&response)) {
            return Err(SchedulerError::Callback {
                url: request.url().to_string(),
                source,
            });
        }

        session.release(id)?;
        output.push(response);
        Ok(())
    }
}
