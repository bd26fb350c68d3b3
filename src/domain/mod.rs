//! Domain layer - pure reconciliation types with no I/O.

pub mod claim;
pub mod foundation;
pub mod outbox;
