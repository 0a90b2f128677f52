//! Classify-and-forward pipeline.
//!
//! Every message from any source flows through:
//! 1. `MessageSource::start()` — source-specific I/O
//! 2. `Classifier::evaluate()` — regex signal matching, inline
//! 3. `Forwarder::forward()` — authenticated webhook POST, on a worker task
//!
//! Outcomes are reported through tracing and `Dispatcher::subscribe()`; none
//! flow back to the source.

pub mod classifier;
pub mod dispatcher;
pub mod forwarder;
pub mod types;

use std::future::Future;

use futures::StreamExt;
use tracing::info;

use crate::channels::MessageStream;
use dispatcher::{DispatchDecision, Dispatcher};

/// Counters for one `run()` invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub received: u64,
    pub submitted: u64,
    pub ignored: u64,
}

/// Feed `messages` into `dispatcher` until the stream ends or `shutdown`
/// resolves, then wait for in-flight forwards to finish.
pub async fn run<S>(mut messages: MessageStream, dispatcher: &Dispatcher, shutdown: S) -> RunStats
where
    S: Future<Output = ()>,
{
    let mut stats = RunStats::default();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => {
                info!("Shutdown requested, no longer accepting messages");
                break;
            }

            next = messages.next() => {
                let Some(message) = next else {
                    info!("All message sources closed");
                    break;
                };
                stats.received += 1;
                match dispatcher.dispatch(message) {
                    DispatchDecision::Submitted { .. } => stats.submitted += 1,
                    DispatchDecision::Ignored { .. } => stats.ignored += 1,
                }
            }
        }
    }

    dispatcher.shutdown().await;
    info!(
        received = stats.received,
        submitted = stats.submitted,
        ignored = stats.ignored,
        "Pipeline stopped"
    );
    stats
}
