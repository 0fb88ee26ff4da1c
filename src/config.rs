//! JSON dispatch configuration: fleet, options, packages and distances.
//!
//! ```json
//! {
//!   "hub": "hub",
//!   "drivers": 2,
//!   "vehicles": [{ "id": 1 }, { "id": 2, "earliest_departure": 9.08 }],
//!   "packages": [{ "id": 1, "location": "a", "deadline": { "By": 10.5 } }],
//!   "distances": { "locations": ["hub", "a"], "rows": [[0.0], [7.2, 0.0]] }
//! }
//! ```

use std::collections::BTreeSet;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::distance::DistanceMatrix;
use crate::error::{DispatchError, Result};
use crate::models::{
    Location, PackageRecord, PackageRegistry, Vehicle, VehicleId, DEFAULT_CAPACITY, DEFAULT_SPEED,
};
use crate::simulation::DispatchOptions;

/// Default earliest departure, 08:00.
pub const DEFAULT_DEPARTURE: f64 = 8.0;

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_speed() -> f64 {
    DEFAULT_SPEED
}

fn default_departure() -> f64 {
    DEFAULT_DEPARTURE
}

/// One vehicle of the fleet descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSpec {
    /// Vehicle id.
    pub id: VehicleId,
    /// Maximum packages on board.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Average speed in distance units per hour.
    #[serde(default = "default_speed")]
    pub speed: f64,
    /// Starting location; falls back to the configuration's hub.
    #[serde(default)]
    pub hub: Option<Location>,
    /// Earliest time the vehicle may leave.
    #[serde(default = "default_departure")]
    pub earliest_departure: f64,
}

impl VehicleSpec {
    /// Creates a spec with default capacity, speed and departure.
    pub fn new(id: VehicleId) -> Self {
        Self {
            id,
            capacity: DEFAULT_CAPACITY,
            speed: DEFAULT_SPEED,
            hub: None,
            earliest_departure: DEFAULT_DEPARTURE,
        }
    }
}

/// Lower-triangular distance table as it appears in configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceTableSpec {
    /// Location per row, in row order.
    pub locations: Vec<Location>,
    /// Row `i` holds distances to locations `0..=i`.
    pub rows: Vec<Vec<f64>>,
}

/// A complete dispatch description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Default starting location of every vehicle.
    pub hub: Location,
    /// Fleet in dispatch order.
    pub vehicles: Vec<VehicleSpec>,
    /// Driver count, return trips and stall handling.
    #[serde(flatten)]
    pub options: DispatchOptions,
    /// Packages to deliver.
    #[serde(default)]
    pub packages: Vec<PackageRecord>,
    /// Distance table; may be supplied separately.
    #[serde(default)]
    pub distances: Option<DistanceTableSpec>,
}

impl DispatchConfig {
    /// Parses a configuration from a JSON string.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidConfig`] wrapping the parse error.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|source| DispatchError::InvalidConfig { source })
    }

    /// Parses a configuration from a JSON reader.
    ///
    /// # Errors
    ///
    /// [`DispatchError::InvalidConfig`] wrapping the parse or I/O error.
    pub fn from_reader(reader: impl Read) -> Result<Self> {
        serde_json::from_reader(reader).map_err(|source| DispatchError::InvalidConfig { source })
    }

    /// Builds the fleet in descriptor order.
    ///
    /// # Errors
    ///
    /// - [`DispatchError::InvalidSpeed`] for a non-positive or non-finite speed.
    /// - [`DispatchError::InvalidFleet`] for an empty fleet, a repeated id,
    ///   zero capacity or a non-finite departure.
    pub fn build_fleet(&self) -> Result<Vec<Vehicle>> {
        if self.vehicles.is_empty() {
            return Err(DispatchError::InvalidFleet {
                reason: "the fleet has no vehicles".to_string(),
            });
        }
        let mut seen = BTreeSet::new();
        let mut fleet = Vec::with_capacity(self.vehicles.len());
        for spec in &self.vehicles {
            if !seen.insert(spec.id) {
                return Err(DispatchError::InvalidFleet {
                    reason: format!("vehicle id {} appears more than once", spec.id),
                });
            }
            if !(spec.speed.is_finite() && spec.speed > 0.0) {
                return Err(DispatchError::InvalidSpeed {
                    vehicle_id: spec.id,
                    speed: spec.speed,
                });
            }
            if spec.capacity == 0 {
                return Err(DispatchError::InvalidFleet {
                    reason: format!("vehicle {} has zero capacity", spec.id),
                });
            }
            if !spec.earliest_departure.is_finite() {
                return Err(DispatchError::InvalidFleet {
                    reason: format!("vehicle {} has no valid departure time", spec.id),
                });
            }
            let hub = spec.hub.clone().unwrap_or_else(|| self.hub.clone());
            fleet.push(
                Vehicle::new(spec.id, spec.capacity, hub)
                    .with_speed(spec.speed)
                    .with_departure(spec.earliest_departure),
            );
        }
        Ok(fleet)
    }

    /// Builds the package registry.
    ///
    /// # Errors
    ///
    /// Propagates registry validation (zero or repeated ids).
    pub fn build_registry(&self) -> Result<PackageRegistry> {
        PackageRegistry::from_records(self.packages.iter().cloned())
    }

    /// Builds the distance matrix.
    ///
    /// # Errors
    ///
    /// [`DispatchError::MalformedMatrix`] when no table is present, plus any
    /// table validation error.
    pub fn build_matrix(&self) -> Result<DistanceMatrix> {
        let table = self
            .distances
            .as_ref()
            .ok_or_else(|| DispatchError::MalformedMatrix {
                reason: "configuration has no distance table".to_string(),
            })?;
        DistanceMatrix::from_lower_triangular(table.locations.clone(), table.rows.clone())
    }
}
