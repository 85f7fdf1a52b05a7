use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::config::StageKind;
use super::error::{Error, Result};
use super::stats::RunResult;

/// One failing request, surfaced at the moment it is classified.
#[derive(Debug, Clone)]
pub struct FailureEvent {
    pub iteration: u64,
    pub stage: StageKind,
    pub error: String,
}

/// Sends failure events toward the run handle. Receiver loss is fine; the
/// run never blocks on an unconsumed failure stream.
#[derive(Debug, Clone)]
pub(crate) struct Reporter {
    tx: mpsc::UnboundedSender<FailureEvent>,
}

impl Reporter {
    pub(crate) fn new(tx: mpsc::UnboundedSender<FailureEvent>) -> Self {
        Self { tx }
    }

    pub(crate) fn failure(&self, event: FailureEvent) {
        let _ = self.tx.send(event);
    }
}

/// Handle to an in-flight run: a stream of interim failure events plus one
/// final result.
#[derive(Debug)]
pub struct RunHandle {
    failures: Option<mpsc::UnboundedReceiver<FailureEvent>>,
    task: JoinHandle<Result<RunResult>>,
}

impl RunHandle {
    pub(crate) fn new(
        failures: mpsc::UnboundedReceiver<FailureEvent>,
        task: JoinHandle<Result<RunResult>>,
    ) -> Self {
        Self {
            failures: Some(failures),
            task,
        }
    }

    /// Take the failure-event receiver. Yields `None` the second time.
    pub fn take_failures(&mut self) -> Option<mpsc::UnboundedReceiver<FailureEvent>> {
        self.failures.take()
    }

    /// Await the final result. Resolves exactly once, after the `after`
    /// stage completes, however many requests failed along the way.
    pub async fn wait(self) -> Result<RunResult> {
        match self.task.await {
            Ok(result) => result,
            Err(err) => Err(Error::Join(err)),
        }
    }
}
