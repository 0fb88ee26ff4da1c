//! Fleet-level dispatch: driver availability and stall recovery around the
//! per-vehicle scheduler.

mod dispatcher;

pub use dispatcher::{dispatch, run_fleet, DispatchOptions, StallPolicy};
