//! # u-dispatch
//!
//! Same-day package delivery dispatch: constraint-aware assignment of
//! packages to a capacity-bounded fleet, followed by greedy deadline-first
//! nearest-neighbor routing on a simulated clock.
//!
//! ## Modules
//!
//! - [`models`] — Domain types (PackageRecord, PackageRegistry, Vehicle, Route, Solution)
//! - [`distance`] — Distance oracle trait and lower-triangular distance matrix
//! - [`assignment`] — Constraint-aware package-to-vehicle assignment
//! - [`scheduling`] — Per-vehicle next-package selection and delivery loop
//! - [`simulation`] — Fleet dispatch with limited drivers and stall recovery
//! - [`evaluation`] — Post-dispatch audit of deadlines and group rules
//! - [`config`] — JSON configuration for fleet, packages, and distances
//! - [`error`] — Error types

pub mod assignment;
pub mod config;
pub mod distance;
pub mod error;
pub mod evaluation;
pub mod models;
pub mod scheduling;
pub mod simulation;

pub use error::{DispatchError, Result};
