//! Dispatch solution and violation types.

use serde::{Deserialize, Serialize};

use super::{Deadline, PackageId, Route, VehicleId};

/// A type of rule broken by a finished dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ViolationType {
    /// Delivered after a real deadline.
    DeadlineMissed {
        /// Late package.
        package_id: PackageId,
        /// Actual delivery time.
        delivered_at: f64,
        /// The deadline it missed.
        deadline: Deadline,
    },
    /// Never delivered.
    Undelivered {
        /// Package still at the hub or on a vehicle.
        package_id: PackageId,
    },
    /// Members of one group rode different vehicles.
    GroupSplit {
        /// Affected group.
        group_id: u32,
        /// Vehicles that carried members.
        vehicles: Vec<VehicleId>,
    },
    /// Another delivery happened between two members of a group.
    GroupInterleaved {
        /// Affected group.
        group_id: u32,
        /// Package delivered in between.
        intruder: PackageId,
    },
    /// A restricted package rode the wrong vehicle.
    RequiredVehicleMismatch {
        /// Restricted package.
        package_id: PackageId,
        /// Vehicle it was restricted to.
        required: VehicleId,
        /// Vehicle that actually carried it.
        actual: VehicleId,
    },
}

/// A rule violation found in a dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// The type of violation.
    pub kind: ViolationType,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationType) -> Self {
        Self { kind }
    }
}

/// The outcome of dispatching a whole fleet.
///
/// Holds one route per vehicle, the packages left undelivered, and the
/// vehicles whose scheduler stalled.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::{Route, Solution};
///
/// let mut sol = Solution::new();
/// sol.add_route(Route::new(1, 8.0));
/// assert_eq!(sol.num_routes(), 1);
/// assert!(sol.is_complete());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Solution {
    routes: Vec<Route>,
    undelivered: Vec<PackageId>,
    stalled: Vec<VehicleId>,
}

impl Solution {
    /// Creates an empty solution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route.
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// Marks a package as undelivered.
    pub fn add_undelivered(&mut self, package_id: PackageId) {
        self.undelivered.push(package_id);
    }

    /// Marks a vehicle as stalled.
    pub fn add_stalled(&mut self, vehicle_id: VehicleId) {
        self.stalled.push(vehicle_id);
    }

    /// Routes in fleet order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Route driven by a vehicle.
    pub fn route_for(&self, vehicle_id: VehicleId) -> Option<&Route> {
        self.routes.iter().find(|r| r.vehicle_id() == vehicle_id)
    }

    /// Number of routes.
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Packages left undelivered.
    pub fn undelivered(&self) -> &[PackageId] {
        &self.undelivered
    }

    /// Vehicles that ended stalled.
    pub fn stalled(&self) -> &[VehicleId] {
        &self.stalled
    }

    /// Returns `true` if every package was delivered.
    pub fn is_complete(&self) -> bool {
        self.undelivered.is_empty() && self.stalled.is_empty()
    }

    /// Total distance across all routes.
    pub fn total_distance(&self) -> f64 {
        self.routes.iter().map(Route::total_distance).sum()
    }

    /// Number of deliveries across all routes.
    pub fn num_delivered(&self) -> usize {
        self.routes.iter().map(Route::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Location, Stop};

    #[test]
    fn test_solution_empty() {
        let sol = Solution::new();
        assert_eq!(sol.num_routes(), 0);
        assert_eq!(sol.num_delivered(), 0);
        assert_eq!(sol.total_distance(), 0.0);
        assert!(sol.is_complete());
    }

    #[test]
    fn test_solution_with_routes() {
        let mut sol = Solution::new();
        let mut r1 = Route::new(1, 8.0);
        r1.push_stop(Stop {
            package_id: 1,
            location: Location::new("a"),
            leg_distance: 50.0,
            arrival_time: 9.0,
            odometer_after: 50.0,
        });
        let mut r2 = Route::new(2, 8.0);
        r2.set_total_distance(80.0);
        sol.add_route(r1);
        sol.add_route(r2);
        sol.add_undelivered(4);
        sol.add_stalled(2);

        assert_eq!(sol.num_routes(), 2);
        assert_eq!(sol.num_delivered(), 1);
        assert!((sol.total_distance() - 130.0).abs() < 1e-10);
        assert!(!sol.is_complete());
        assert_eq!(sol.route_for(2).map(Route::vehicle_id), Some(2));
        assert!(sol.route_for(3).is_none());
    }

    #[test]
    fn test_violation_types() {
        let v = Violation::new(ViolationType::GroupInterleaved {
            group_id: 1,
            intruder: 9,
        });
        assert_eq!(
            v.kind,
            ViolationType::GroupInterleaved {
                group_id: 1,
                intruder: 9
            }
        );
    }
}
