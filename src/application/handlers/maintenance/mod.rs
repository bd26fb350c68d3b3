//! Operator maintenance handlers.

mod inspect;
mod reset_unfinished;

pub use inspect::{InspectionHandler, ListOutboxQuery, MAX_INSPECT_LIMIT};
pub use reset_unfinished::{ResetUnfinishedHandler, ResetUnfinishedResult};
