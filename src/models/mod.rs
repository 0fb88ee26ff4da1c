//! Domain model types for delivery dispatch.
//!
//! Provides the core abstractions: packages with deadlines and dispatch
//! constraints, a registry that owns them, capacity-bounded vehicles,
//! routes as ordered sequences of deliveries, and the fleet-wide solution.

mod location;
mod package;
mod registry;
mod route;
mod solution;
mod time;
mod vehicle;

pub use location::Location;
pub use package::{AddressCorrection, PackageId, PackageRecord, PackageStatus};
pub use registry::PackageRegistry;
pub use route::{Route, Stop};
pub use solution::{Solution, Violation, ViolationType};
pub use time::{format_time, time_of_day, Deadline};
pub use vehicle::{Vehicle, VehicleId, DEFAULT_CAPACITY, DEFAULT_SPEED};
