//! Per-vehicle delivery ordering.
//!
//! - [`select_next`] — picks the next package: group in progress, earliest deadline, nearest
//! - [`RouteScheduler`] — delivers a loaded vehicle until empty or stalled

mod scheduler;
mod selection;

pub use scheduler::{RouteScheduler, RunOutcome, RunReport};
pub use selection::{select_next, Selection, SelectionReason};
