//! Outbox adapters.
//!
//! - `ReconciliationWorker` - Background service that drains the outbox

mod reconciliation_worker;

pub use reconciliation_worker::{
    BatchReport, ReconciliationWorker, ReconciliationWorkerConfig, WorkerHandle,
};
