//! ReconciliationWorker - Background service that drains the outbox.
//!
//! Producers write outbox entries in the same transaction as their domain
//! change. This worker claims batches of pending entries, dispatches each to
//! its operation handler against the git host, and records the outcome.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `poll_interval` | 5s | Sleep between polls when there is no backlog |
//! | `batch_size` | 10 | Max entries claimed per poll |
//! | `stale_claim_timeout` | 600s | Time since the last renewal after which a claim is released |
//!
//! ## Leases
//!
//! Each entry's claim is renewed immediately before it is dispatched, and an
//! entry whose claim was released in the meantime is skipped. A lease only
//! has to cover one dispatch, however large the batch.
//!
//! ## Graceful Shutdown
//!
//! The shutdown signal is observed between batches. A batch that has been
//! claimed always runs to completion, so no entry is left in `processing`
//! by an orderly stop.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tokio::time;

use crate::application::{OperationDispatcher, OperationError};
use crate::domain::foundation::DomainError;
use crate::domain::outbox::{OutboxEntry, OutboxStatus};
use crate::ports::OutboxStore;

/// Configuration for the ReconciliationWorker.
#[derive(Debug, Clone)]
pub struct ReconciliationWorkerConfig {
    /// How long to sleep after a poll that found no backlog.
    pub poll_interval: Duration,

    /// Maximum entries claimed per poll.
    pub batch_size: u32,

    /// Claims not renewed for this long are returned to `pending`. Must
    /// exceed the longest single dispatch. `None` disables it.
    pub stale_claim_timeout: Option<Duration>,
}

impl Default for ReconciliationWorkerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            batch_size: 10,
            stale_claim_timeout: Some(Duration::from_secs(600)),
        }
    }
}

impl ReconciliationWorkerConfig {
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn with_stale_claim_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.stale_claim_timeout = timeout;
        self
    }
}

/// What one poll did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Stale claims returned to `pending` before claiming.
    pub released: u64,
    pub claimed: usize,
    pub completed: usize,
    /// Failed attempts that went back to `pending`.
    pub retried: usize,
    /// Failed attempts that exhausted `max_attempts`.
    pub failed: usize,
    /// Outcomes discarded because the claim was taken over.
    pub lost: usize,
}

impl BatchReport {
    fn merge_entry(&mut self, outcome: EntryOutcome) {
        match outcome {
            EntryOutcome::Recorded(OutboxStatus::Completed) => self.completed += 1,
            EntryOutcome::Recorded(OutboxStatus::Pending) => self.retried += 1,
            EntryOutcome::Recorded(OutboxStatus::Failed) => self.failed += 1,
            EntryOutcome::Recorded(OutboxStatus::Processing) | EntryOutcome::Lost => {
                self.lost += 1
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum EntryOutcome {
    Recorded(OutboxStatus),
    Lost,
}

/// Background service that reconciles outbox entries with the git host.
pub struct ReconciliationWorker {
    outbox: Arc<dyn OutboxStore>,
    dispatcher: Arc<OperationDispatcher>,
    config: ReconciliationWorkerConfig,
}

impl ReconciliationWorker {
    /// Create a worker with default configuration.
    pub fn new(outbox: Arc<dyn OutboxStore>, dispatcher: Arc<OperationDispatcher>) -> Self {
        Self::with_config(outbox, dispatcher, ReconciliationWorkerConfig::default())
    }

    pub fn with_config(
        outbox: Arc<dyn OutboxStore>,
        dispatcher: Arc<OperationDispatcher>,
        config: ReconciliationWorkerConfig,
    ) -> Self {
        Self {
            outbox,
            dispatcher,
            config,
        }
    }

    /// Run the poll loop until the shutdown signal is set or its sender is
    /// dropped. Errors are logged and the loop keeps going.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            batch_size = self.config.batch_size,
            "Reconciliation worker started"
        );

        while !*shutdown.borrow() {
            let backlog = match self.poll_once().await {
                Ok(report) => self.has_backlog(&report),
                Err(e) => {
                    tracing::error!(error = %e, "Reconciliation poll failed");
                    false
                }
            };
            if backlog {
                continue;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = time::sleep(self.config.poll_interval) => {}
            }
        }

        tracing::info!("Reconciliation worker stopped");
    }

    /// A full batch with no retries suggests more work is waiting; anything
    /// else waits for the next interval so failing entries are not retried
    /// back to back.
    fn has_backlog(&self, report: &BatchReport) -> bool {
        report.claimed >= self.config.batch_size as usize && report.retried == 0
    }

    /// Run exactly one poll cycle: release stale claims, claim a batch and
    /// process it to completion.
    pub async fn poll_once(&self) -> Result<BatchReport, DomainError> {
        let mut report = BatchReport {
            released: self.release_stale_claims().await?,
            ..BatchReport::default()
        };
        let entries = self.outbox.claim_batch(self.config.batch_size).await?;
        report.claimed = entries.len();

        for entry in entries {
            match self.process_entry(entry).await {
                Ok(outcome) => report.merge_entry(outcome),
                Err(e) => {
                    // The entry stays in `processing` until its claim goes stale.
                    tracing::error!(error = %e, "Failed to record outbox outcome");
                }
            }
        }

        if report.claimed > 0 {
            tracing::debug!(
                claimed = report.claimed,
                completed = report.completed,
                retried = report.retried,
                failed = report.failed,
                lost = report.lost,
                "Outbox batch processed"
            );
        }
        Ok(report)
    }

    async fn release_stale_claims(&self) -> Result<u64, DomainError> {
        let Some(timeout) = self.config.stale_claim_timeout else {
            return Ok(0);
        };

        let released = self.outbox.release_stale(timeout).await?;
        if released > 0 {
            tracing::warn!(released, "Released stale outbox claims");
        }
        Ok(released)
    }

    async fn process_entry(&self, mut entry: OutboxEntry) -> Result<EntryOutcome, DomainError> {
        let Some(claim_token) = entry.claim_token else {
            tracing::warn!(entry_id = %entry.id, "Claimed entry carries no claim token");
            return Ok(EntryOutcome::Lost);
        };

        // Entries later in the batch may have waited out the lease while
        // earlier ones ran. Dispatch only if the claim is still ours.
        if !self.outbox.renew_claim(entry.id, claim_token).await? {
            tracing::warn!(
                entry_id = %entry.id,
                "Outbox claim was released before dispatch, skipping"
            );
            return Ok(EntryOutcome::Lost);
        }

        let result = match entry.decode_operation() {
            Ok(operation) => self.dispatcher.dispatch(&operation).await,
            Err(e) => Err(OperationError::from(e)),
        };

        let status = match result {
            Ok(outcome) => {
                entry.complete(Utc::now())?;
                tracing::info!(
                    entry_id = %entry.id,
                    operation = %entry.operation,
                    attempts = entry.attempts,
                    outcome = ?outcome,
                    "Outbox entry completed"
                );
                OutboxStatus::Completed
            }
            Err(err) => {
                let status = entry.record_failure(&err.to_string())?;
                if status == OutboxStatus::Failed {
                    tracing::error!(
                        entry_id = %entry.id,
                        operation = %entry.operation,
                        attempts = entry.attempts,
                        category = err.category(),
                        error = %err,
                        "Outbox entry failed permanently"
                    );
                } else {
                    tracing::warn!(
                        entry_id = %entry.id,
                        operation = %entry.operation,
                        attempts = entry.attempts,
                        max_attempts = entry.max_attempts,
                        category = err.category(),
                        error = %err,
                        "Outbox entry failed, will retry"
                    );
                }
                status
            }
        };

        if self.outbox.record_outcome(&entry, claim_token).await? {
            Ok(EntryOutcome::Recorded(status))
        } else {
            tracing::warn!(
                entry_id = %entry.id,
                "Outbox claim was lost before the outcome was recorded"
            );
            Ok(EntryOutcome::Lost)
        }
    }

    /// Start the worker on the runtime and return a handle that stops it.
    pub fn spawn(self) -> WorkerHandle {
        let (shutdown, receiver) = watch::channel(false);
        let task = tokio::spawn(async move {
            self.run(receiver).await;
            // Dropping the worker here releases the git host client only
            // after the loop has finished.
            drop(self);
        });
        WorkerHandle { shutdown, task }
    }
}

/// Handle to a spawned worker.
pub struct WorkerHandle {
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl WorkerHandle {
    /// Signal shutdown and wait for the in-flight batch to finish.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        // A send error means the task already exited; joining still reports it.
        let _ = self.shutdown.send(true);
        self.task.await
    }
}
