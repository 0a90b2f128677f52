//! Dispatch controller — classify inline, forward in the background.
//!
//! `dispatch()` is synchronous and returns as soon as the message is either
//! dropped or handed to the worker pool, so the source that raised the
//! message is never held up by network I/O. Forwarding tasks live in a
//! `JoinSet` owned by the dispatcher; a semaphore caps how many run at once.
//! Every completed (or panicked) attempt is logged and broadcast as a
//! [`ForwardReport`].

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use futures::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::{Semaphore, broadcast};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::DispatchConfig;
use crate::error::ConfigError;
use crate::pipeline::classifier::Classifier;
use crate::pipeline::forwarder::Forwarder;
use crate::pipeline::types::{
    ForwardOutcome, ForwardReport, ForwardRequest, IncomingMessage, ReportStatus,
};

/// What `dispatch()` did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchDecision {
    /// Not a bank SMS; nothing was sent.
    Ignored { matched: usize },
    /// Handed to the worker pool.
    Submitted { dispatch_id: Uuid },
}

/// Routes classified messages to the forwarder on background tasks.
pub struct Dispatcher {
    classifier: Classifier,
    forwarder: Arc<Forwarder>,
    runtime: Handle,
    permits: Arc<Semaphore>,
    tasks: Mutex<JoinSet<()>>,
    reports: broadcast::Sender<ForwardReport>,
}

impl Dispatcher {
    /// Create a dispatcher bound to the current Tokio runtime.
    ///
    /// After construction `dispatch()` may be called from any thread,
    /// including ones outside the runtime.
    pub fn new(
        classifier: Classifier,
        forwarder: Arc<Forwarder>,
        config: &DispatchConfig,
    ) -> Result<Self, ConfigError> {
        let runtime = Handle::try_current().map_err(|e| ConfigError::NoRuntime(e.to_string()))?;
        let (reports, _) = broadcast::channel(config.report_capacity.max(1));

        Ok(Self {
            classifier,
            forwarder,
            runtime,
            permits: Arc::new(Semaphore::new(config.max_concurrent_forwards.max(1))),
            tasks: Mutex::new(JoinSet::new()),
            reports,
        })
    }

    /// Subscribe to completion reports for forwarding attempts.
    pub fn subscribe(&self) -> broadcast::Receiver<ForwardReport> {
        self.reports.subscribe()
    }

    /// Number of forwarding tasks not yet reaped.
    pub fn in_flight(&self) -> usize {
        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        reap_finished(&mut tasks);
        tasks.len()
    }

    /// Classify `message` and, if it is a bank SMS, start forwarding it.
    pub fn dispatch(&self, message: IncomingMessage) -> DispatchDecision {
        let classification = self.classifier.evaluate(&message.body);
        if !classification.is_financial {
            debug!(
                message_id = %message.id,
                sender = %message.sender,
                matches = classification.match_count(),
                "Not a bank SMS, ignoring"
            );
            return DispatchDecision::Ignored {
                matched: classification.match_count(),
            };
        }

        let dispatch_id = message.id;
        info!(
            dispatch_id = %dispatch_id,
            sender = %message.sender,
            matches = classification.match_count(),
            "Bank SMS detected, forwarding"
        );

        let request = ForwardRequest::from_message(&message);
        let forwarder = Arc::clone(&self.forwarder);
        let permits = Arc::clone(&self.permits);
        let reports = self.reports.clone();

        let task = async move {
            let started = Instant::now();
            let attempt = async {
                // Never closed, so acquire cannot fail.
                let _permit = permits.acquire_owned().await.ok();
                forwarder.forward(&request).await
            };

            let status = match AssertUnwindSafe(attempt).catch_unwind().await {
                Ok(outcome) => ReportStatus::Completed(outcome),
                Err(panic) => ReportStatus::Aborted {
                    reason: panic_message(panic.as_ref()),
                },
            };

            let report = ForwardReport {
                dispatch_id,
                sender: message.sender,
                received_at: message.received_at,
                status,
                elapsed: started.elapsed(),
            };
            log_report(&report);
            // No subscribers is fine.
            let _ = reports.send(report);
        };

        let mut tasks = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
        reap_finished(&mut tasks);
        tasks.spawn_on(task, &self.runtime);

        DispatchDecision::Submitted { dispatch_id }
    }

    /// Wait for every in-flight forwarding attempt to finish.
    ///
    /// Attempts are not cancelled; each runs to completion or failure.
    pub async fn shutdown(&self) {
        let mut tasks = {
            let mut guard = self.tasks.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };

        if !tasks.is_empty() {
            info!(in_flight = tasks.len(), "Waiting for in-flight forwards");
        }
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                log_join_error(&e);
            }
        }
    }
}

impl Drop for Dispatcher {
    /// Running forwards are detached, not aborted; they finish on the runtime
    /// and still send their reports.
    fn drop(&mut self) {
        let tasks = self.tasks.get_mut().unwrap_or_else(|e| e.into_inner());
        if !tasks.is_empty() {
            debug!(in_flight = tasks.len(), "Dispatcher dropped, detaching forwards");
        }
        tasks.detach_all();
    }
}

fn reap_finished(tasks: &mut JoinSet<()>) {
    while let Some(result) = tasks.try_join_next() {
        if let Err(e) = result {
            log_join_error(&e);
        }
    }
}

fn log_join_error(e: &JoinError) {
    error!(error = %e, "Forwarding task ended abnormally");
}

fn log_report(report: &ForwardReport) {
    let elapsed_ms = report.elapsed.as_millis() as u64;
    match &report.status {
        ReportStatus::Completed(ForwardOutcome::Success { status }) => info!(
            dispatch_id = %report.dispatch_id,
            status,
            elapsed_ms,
            "Forwarding attempt succeeded"
        ),
        ReportStatus::Completed(ForwardOutcome::AuthMissing) => warn!(
            dispatch_id = %report.dispatch_id,
            "Forwarding skipped: device not linked"
        ),
        ReportStatus::Completed(ForwardOutcome::HttpFailure(failure)) => warn!(
            dispatch_id = %report.dispatch_id,
            failure = %failure,
            elapsed_ms,
            "Forwarding attempt failed"
        ),
        ReportStatus::Aborted { reason } => error!(
            dispatch_id = %report.dispatch_id,
            reason = %reason,
            "Forwarding attempt panicked"
        ),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
