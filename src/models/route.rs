//! Route and stop types.

use serde::{Deserialize, Serialize};

use super::{Location, PackageId, VehicleId};

/// A single package delivery within a route.
///
/// Records where and when the package was dropped off and the vehicle's
/// odometer at that moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Package delivered at this stop.
    pub package_id: PackageId,
    /// Where it was delivered.
    pub location: Location,
    /// Distance of the leg that reached this stop.
    pub leg_distance: f64,
    /// Vehicle clock on arrival (the delivery time).
    pub arrival_time: f64,
    /// Odometer reading after the leg.
    pub odometer_after: f64,
}

/// The ordered deliveries made by one vehicle.
///
/// Distance and finish time include any legs without a delivery, such as
/// a trip back to the hub.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::{Location, Route, Stop};
///
/// let mut route = Route::new(1, 8.0);
/// route.push_stop(Stop {
///     package_id: 4,
///     location: Location::new("380 W 2880 S"),
///     leg_distance: 3.5,
///     arrival_time: 8.2,
///     odometer_after: 3.5,
/// });
/// assert_eq!(route.len(), 1);
/// assert_eq!(route.package_ids(), vec![4]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    vehicle_id: VehicleId,
    departure: f64,
    finish: f64,
    stops: Vec<Stop>,
    total_distance: f64,
}

impl Route {
    /// Creates an empty route for a vehicle leaving at `departure`.
    pub fn new(vehicle_id: VehicleId, departure: f64) -> Self {
        Self {
            vehicle_id,
            departure,
            finish: departure,
            stops: Vec::new(),
            total_distance: 0.0,
        }
    }

    /// Appends a delivery.
    pub fn push_stop(&mut self, stop: Stop) {
        self.finish = self.finish.max(stop.arrival_time);
        self.total_distance = self.total_distance.max(stop.odometer_after);
        self.stops.push(stop);
    }

    /// Appends all stops of another run of the same vehicle.
    pub fn extend(&mut self, other: Route) {
        for stop in other.stops {
            self.push_stop(stop);
        }
        self.finish = self.finish.max(other.finish);
        self.total_distance = self.total_distance.max(other.total_distance);
    }

    /// Vehicle that drove this route.
    pub fn vehicle_id(&self) -> VehicleId {
        self.vehicle_id
    }

    /// Time the vehicle left the hub.
    pub fn departure(&self) -> f64 {
        self.departure
    }

    /// Vehicle clock when the route ended.
    pub fn finish(&self) -> f64 {
        self.finish
    }

    /// Deliveries in order.
    pub fn stops(&self) -> &[Stop] {
        &self.stops
    }

    /// Number of deliveries.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Returns `true` if nothing was delivered.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Delivered package ids in delivery order.
    pub fn package_ids(&self) -> Vec<PackageId> {
        self.stops.iter().map(|s| s.package_id).collect()
    }

    /// Total distance driven (vehicle odometer at the end).
    pub fn total_distance(&self) -> f64 {
        self.total_distance
    }

    /// Sets the finish time.
    pub fn set_finish(&mut self, time: f64) {
        self.finish = time;
    }

    /// Sets the total distance.
    pub fn set_total_distance(&mut self, d: f64) {
        self.total_distance = d;
    }
}
