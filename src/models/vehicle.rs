//! Delivery vehicle with capacity, clock, and odometer.

use std::collections::BTreeSet;

use super::{Location, PackageId};
use crate::error::{DispatchError, Result};

/// Vehicle identifier.
pub type VehicleId = usize;

/// Default number of packages a vehicle carries.
pub const DEFAULT_CAPACITY: usize = 16;

/// Default average speed in distance units per hour.
pub const DEFAULT_SPEED: f64 = 18.0;

/// A capacity-bounded vehicle that starts at the hub.
///
/// The load holds the packages assigned to the vehicle and not yet delivered.
/// Clock and odometer only move forward.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::{Location, Vehicle};
///
/// let mut v = Vehicle::new(1, 2, Location::new("hub")).with_departure(8.0);
/// v.load_package(10).unwrap();
/// v.load_package(11).unwrap();
/// assert!(v.is_full());
/// assert!(v.load_package(12).is_err());
///
/// v.travel_to(Location::new("stop"), 9.0);
/// assert_eq!(v.odometer(), 9.0);
/// assert_eq!(v.clock(), 8.5);
/// ```
#[derive(Debug, Clone)]
pub struct Vehicle {
    id: VehicleId,
    capacity: usize,
    speed: f64,
    hub: Location,
    location: Location,
    departure: f64,
    dispatched_at: f64,
    clock: f64,
    odometer: f64,
    load: BTreeSet<PackageId>,
}

impl Vehicle {
    /// Creates a vehicle at the hub.
    ///
    /// Default: speed 18, departure at time 0.
    pub fn new(id: VehicleId, capacity: usize, hub: Location) -> Self {
        Self {
            id,
            capacity,
            speed: DEFAULT_SPEED,
            location: hub.clone(),
            hub,
            departure: 0.0,
            dispatched_at: 0.0,
            clock: 0.0,
            odometer: 0.0,
            load: BTreeSet::new(),
        }
    }

    /// Sets the average speed.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Sets the earliest departure time and starts the clock there.
    pub fn with_departure(mut self, time: f64) -> Self {
        self.departure = time;
        self.dispatched_at = time;
        self.clock = time;
        self
    }

    /// Vehicle ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// Maximum number of packages carried at once.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Average speed in distance units per hour.
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Hub the vehicle departs from.
    pub fn hub(&self) -> &Location {
        &self.hub
    }

    /// Current location.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Returns `true` while the vehicle is parked at its hub.
    pub fn is_at_hub(&self) -> bool {
        self.location == self.hub
    }

    /// Earliest time the vehicle may leave the hub.
    pub fn departure(&self) -> f64 {
        self.departure
    }

    /// Time the vehicle last left the hub.
    pub fn dispatched_at(&self) -> f64 {
        self.dispatched_at
    }

    /// Current simulated time.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Cumulative distance traveled.
    pub fn odometer(&self) -> f64 {
        self.odometer
    }

    /// Packages assigned and not yet delivered, in ascending id order.
    pub fn load(&self) -> &BTreeSet<PackageId> {
        &self.load
    }

    /// Number of packages currently carried.
    pub fn load_size(&self) -> usize {
        self.load.len()
    }

    /// Free slots left.
    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.load.len())
    }

    /// Returns `true` if no more packages fit.
    pub fn is_full(&self) -> bool {
        self.load.len() >= self.capacity
    }

    /// Returns `true` if the package is in the load.
    pub fn has_package(&self, package_id: PackageId) -> bool {
        self.load.contains(&package_id)
    }

    /// Adds a package to the load.
    ///
    /// Fails with [`DispatchError::CapacityExceeded`] when full; loading a
    /// package already on board is a no-op.
    pub fn load_package(&mut self, package_id: PackageId) -> Result<()> {
        if self.load.contains(&package_id) {
            return Ok(());
        }
        if self.is_full() {
            return Err(DispatchError::CapacityExceeded {
                vehicle_id: self.id,
                capacity: self.capacity,
            });
        }
        self.load.insert(package_id);
        Ok(())
    }

    /// Removes a package from the load, returning whether it was present.
    pub fn unload(&mut self, package_id: PackageId) -> bool {
        self.load.remove(&package_id)
    }

    /// Holds the vehicle at the hub until `time` (e.g. until a driver is free).
    ///
    /// The departure never moves earlier than the configured one.
    pub fn depart_at(&mut self, time: f64) {
        self.departure = self.departure.max(time);
        self.clock = self.clock.max(self.departure);
        self.dispatched_at = self.clock;
    }

    /// Moves to `location` over `distance`, returning the elapsed time.
    pub fn travel_to(&mut self, location: Location, distance: f64) -> f64 {
        let leaving_hub = self.is_at_hub();
        let elapsed = distance / self.speed;
        if leaving_hub && location != self.hub {
            self.dispatched_at = self.clock;
        }
        self.odometer += distance;
        self.clock += elapsed;
        self.location = location;
        elapsed
    }

    /// Idles until `time`; the clock never runs backwards.
    pub fn wait_until(&mut self, time: f64) {
        self.clock = self.clock.max(time);
    }
}
