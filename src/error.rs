//! Error types for assignment, scheduling, and distance lookup.

use thiserror::Error;

use crate::models::{Location, PackageId, PackageStatus, VehicleId};

/// The constraint that made a package impossible to place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Constraint {
    /// No vehicle can hold the whole delivery-together group.
    Group {
        /// Shared group id of the members.
        group_id: u32,
    },
    /// Members of one group demand different vehicles.
    ConflictingRestriction {
        /// Shared group id of the members.
        group_id: u32,
    },
    /// The package's required vehicle is full.
    RequiredVehicle {
        /// Vehicle the package is restricted to.
        vehicle_id: VehicleId,
    },
    /// Every vehicle in the fleet is full.
    Capacity,
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Group { group_id } => write!(f, "no vehicle can carry all of group {group_id}"),
            Self::ConflictingRestriction { group_id } => {
                write!(f, "group {group_id} is restricted to more than one vehicle")
            }
            Self::RequiredVehicle { vehicle_id } => {
                write!(f, "required vehicle {vehicle_id} is at capacity")
            }
            Self::Capacity => f.write_str("every vehicle is at capacity"),
        }
    }
}

/// Errors raised while planning or running deliveries.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A package could not be placed on any vehicle.
    ///
    /// Raised before any vehicle departs; no partial assignment is kept.
    #[error("package {package_id} cannot be assigned: {constraint}")]
    AssignmentInfeasible {
        /// First package that failed to place.
        package_id: PackageId,
        /// Constraint that could not be met.
        constraint: Constraint,
    },
    /// The distance oracle has no entry for a location.
    #[error("location {location} is not in the distance table")]
    LocationNotFound {
        /// Location that failed to resolve.
        location: Location,
    },
    /// Loading one more package would exceed the vehicle's capacity.
    #[error("vehicle {vehicle_id} is at capacity ({capacity} packages)")]
    CapacityExceeded {
        /// Full vehicle.
        vehicle_id: VehicleId,
        /// Its capacity.
        capacity: usize,
    },
    /// The registry has no record with this id.
    #[error("package {package_id} not found")]
    PackageNotFound {
        /// Requested id.
        package_id: PackageId,
    },
    /// A package is already owned by another vehicle.
    #[error("package {package_id} is already held by vehicle {owner}")]
    AlreadyClaimed {
        /// Contested package.
        package_id: PackageId,
        /// Vehicle that currently owns it.
        owner: VehicleId,
    },
    /// Two records share one id.
    #[error("duplicate package id {package_id}")]
    DuplicatePackage {
        /// Repeated id.
        package_id: PackageId,
    },
    /// Package ids must be positive.
    #[error("package id must be positive")]
    InvalidPackageId,
    /// A package or fleet entry names a vehicle that does not exist.
    #[error("vehicle {vehicle_id} is not part of the fleet")]
    UnknownVehicle {
        /// Missing vehicle id.
        vehicle_id: VehicleId,
    },
    /// A status change that the package lifecycle does not allow.
    #[error("package {package_id} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Affected package.
        package_id: PackageId,
        /// Current status.
        from: PackageStatus,
        /// Requested status.
        to: PackageStatus,
    },
    /// A distance entry is negative or not finite.
    #[error("invalid distance {value} between {from} and {to}")]
    InvalidDistance {
        /// First location.
        from: Location,
        /// Second location.
        to: Location,
        /// Offending value.
        value: f64,
    },
    /// A location appears twice in a distance table.
    #[error("location {location} appears more than once in the distance table")]
    DuplicateLocation {
        /// Repeated location.
        location: Location,
    },
    /// Distance table rows do not match its locations.
    #[error("malformed distance table: {reason}")]
    MalformedMatrix {
        /// What does not line up.
        reason: String,
    },
    /// Vehicle speed must be positive and finite.
    #[error("vehicle {vehicle_id} has invalid speed {speed}")]
    InvalidSpeed {
        /// Affected vehicle.
        vehicle_id: VehicleId,
        /// Offending speed.
        speed: f64,
    },
    /// Parsing the dispatch configuration failed.
    #[error("failed to parse dispatch configuration")]
    InvalidConfig {
        /// Source error from `serde_json`.
        #[source]
        source: serde_json::Error,
    },
    /// The configuration is well-formed but semantically wrong.
    #[error("invalid dispatch configuration: {reason}")]
    InvalidFleet {
        /// What is wrong with it.
        reason: String,
    },
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DispatchError>;
