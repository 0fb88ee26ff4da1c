//! Constraint-aware package-to-vehicle assignment.
//!
//! # Algorithm
//!
//! Packages are placed in four passes, most constrained first:
//!
//! 1. **Groups** — each delivery-together group goes whole onto the first
//!    vehicle with room for every member (preferring one that departs after
//!    the group is released). Groups are never split: members already on a
//!    vehicle pull the rest of their group onto it.
//! 2. **Restricted** — packages bound to one vehicle go there or fail.
//! 3. **Delayed** — packages with a release time prefer a vehicle that
//!    departs at or after it, falling back to any vehicle with room.
//! 4. **Unconstrained** — fill vehicles in fleet order, spilling over.
//!
//! The plan is built on scratch capacity counters and committed to the
//! vehicles and the registry only when every package has a place.
//!
//! # Complexity
//!
//! O(n·m) where n = packages and m = vehicles.

use std::collections::BTreeMap;

use log::{debug, info};

use super::groups::collect_groups;
use crate::error::{Constraint, DispatchError, Result};
use crate::models::{PackageId, PackageRecord, PackageRegistry, PackageStatus, Vehicle, VehicleId};

/// Package ids placed on each vehicle by one assignment pass.
///
/// # Examples
///
/// ```
/// use u_dispatch::assignment::assign_packages;
/// use u_dispatch::models::{Location, PackageRecord, PackageRegistry, Vehicle};
///
/// let hub = Location::new("hub");
/// let mut vehicles = vec![
///     Vehicle::new(1, 2, hub.clone()),
///     Vehicle::new(2, 2, hub.clone()),
/// ];
/// let mut registry = PackageRegistry::from_records(
///     (1..=3).map(|id| PackageRecord::new(id, Location::new("a"))),
/// ).unwrap();
///
/// let assignment = assign_packages(&mut vehicles, &mut registry).unwrap();
/// assert_eq!(assignment.packages_for(1), &[1, 2]);
/// assert_eq!(assignment.packages_for(2), &[3]);
/// assert_eq!(registry.owner_of(3), Some(2));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignment {
    by_vehicle: BTreeMap<VehicleId, Vec<PackageId>>,
}

impl Assignment {
    /// Packages placed on a vehicle, in placement order.
    pub fn packages_for(&self, vehicle_id: VehicleId) -> &[PackageId] {
        self.by_vehicle
            .get(&vehicle_id)
            .map_or(&[], Vec::as_slice)
    }

    /// Vehicle a package was placed on.
    pub fn vehicle_of(&self, package_id: PackageId) -> Option<VehicleId> {
        self.by_vehicle
            .iter()
            .find(|(_, ids)| ids.contains(&package_id))
            .map(|(&v, _)| v)
    }

    /// Total number of packages placed.
    pub fn len(&self) -> usize {
        self.by_vehicle.values().map(Vec::len).sum()
    }

    /// Returns `true` if nothing was placed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Scratch placement state; nothing here touches the real vehicles.
struct Plan<'v> {
    vehicles: &'v [Vehicle],
    remaining: Vec<usize>,
    picks: Vec<Vec<PackageId>>,
}

impl<'v> Plan<'v> {
    fn new(vehicles: &'v [Vehicle]) -> Self {
        Self {
            vehicles,
            remaining: vehicles.iter().map(Vehicle::remaining_capacity).collect(),
            picks: vec![Vec::new(); vehicles.len()],
        }
    }

    fn index_of(&self, vehicle_id: VehicleId) -> Result<usize> {
        self.vehicles
            .iter()
            .position(|v| v.id() == vehicle_id)
            .ok_or(DispatchError::UnknownVehicle { vehicle_id })
    }

    fn place(&mut self, idx: usize, package_id: PackageId) -> Result<()> {
        if self.remaining[idx] == 0 {
            return Err(DispatchError::CapacityExceeded {
                vehicle_id: self.vehicles[idx].id(),
                capacity: self.vehicles[idx].capacity(),
            });
        }
        self.remaining[idx] -= 1;
        self.picks[idx].push(package_id);
        Ok(())
    }

    /// Vehicle indices in fleet order, those departing at or after
    /// `release` first.
    fn release_order(&self, release: Option<f64>) -> Vec<usize> {
        let (mut preferred, fallback): (Vec<usize>, Vec<usize>) = (0..self.vehicles.len())
            .partition(|&i| release.is_none_or(|t| self.vehicles[i].departure() >= t));
        preferred.extend(fallback);
        preferred
    }

    /// Tries each vehicle in `order`, moving on when one is full.
    fn place_first_fit(&mut self, order: &[usize], package_id: PackageId) -> Result<usize> {
        for &idx in order {
            match self.place(idx, package_id) {
                Ok(()) => return Ok(idx),
                Err(DispatchError::CapacityExceeded { vehicle_id, .. }) => {
                    debug!("package {package_id}: vehicle {vehicle_id} full, trying next");
                }
                Err(e) => return Err(e),
            }
        }
        Err(DispatchError::AssignmentInfeasible {
            package_id,
            constraint: Constraint::Capacity,
        })
    }
}

/// Assigns every undelivered, unowned package to a vehicle.
///
/// `vehicles` order is the tie-break preference. Packages already held by a
/// vehicle keep their place, and the unplaced members of their group join
/// them there. On success each vehicle's load and the
/// registry's ownership are updated; on failure neither is touched.
/// Package status is left at the hub until a scheduler claims it.
///
/// # Errors
///
/// - [`DispatchError::AssignmentInfeasible`] naming the first package that
///   cannot be placed and the constraint it broke.
/// - [`DispatchError::UnknownVehicle`] when a package requires a vehicle that
///   is not in `vehicles`.
/// - [`DispatchError::InvalidFleet`] when two vehicles share an id.
///
/// A group whose members are already held by two different vehicles, or
/// by a vehicle missing from `vehicles`, is reported as infeasible.
pub fn assign_packages(
    vehicles: &mut [Vehicle],
    registry: &mut PackageRegistry,
) -> Result<Assignment> {
    for (i, v) in vehicles.iter().enumerate() {
        if vehicles[..i].iter().any(|w| w.id() == v.id()) {
            return Err(DispatchError::InvalidFleet {
                reason: format!("vehicle id {} appears more than once", v.id()),
            });
        }
    }

    let open: Vec<&PackageRecord> = registry
        .iter()
        .filter(|r| r.status() != PackageStatus::Delivered)
        .collect();
    let pending: Vec<&PackageRecord> = open
        .iter()
        .copied()
        .filter(|r| registry.owner_of(r.id()).is_none())
        .collect();

    let mut plan = Plan::new(vehicles);

    // Pass 1: groups, whole or not at all. A member already held by a
    // vehicle pins the rest of its group to that vehicle.
    for group in collect_groups(open.iter().copied()) {
        let first = group.members[0];
        let group_id = group.group_id;
        let infeasible = || DispatchError::AssignmentInfeasible {
            package_id: first,
            constraint: Constraint::Group { group_id },
        };
        let conflicting = || DispatchError::AssignmentInfeasible {
            package_id: first,
            constraint: Constraint::ConflictingRestriction { group_id },
        };

        let unplaced: Vec<PackageId> = group
            .members
            .iter()
            .copied()
            .filter(|&id| registry.owner_of(id).is_none())
            .collect();
        if unplaced.is_empty() {
            continue;
        }
        if group.required_vehicles.len() > 1 {
            return Err(conflicting());
        }
        let mut holders: Vec<VehicleId> = group
            .members
            .iter()
            .filter_map(|&id| registry.owner_of(id))
            .collect();
        holders.sort_unstable();
        holders.dedup();
        if holders.len() > 1 {
            return Err(infeasible());
        }

        let pinned = match (holders.first(), group.required_vehicles.first()) {
            (Some(&holder), Some(&required)) if holder != required => return Err(conflicting()),
            (Some(&holder), _) => Some(plan.index_of(holder).map_err(|_| infeasible())?),
            (None, Some(&required)) => Some(plan.index_of(required)?),
            (None, None) => None,
        };
        let target = plan
            .release_order(group.release_time)
            .into_iter()
            .filter(|&i| pinned.is_none_or(|p| p == i))
            .find(|&i| plan.remaining[i] >= unplaced.len())
            .ok_or_else(infeasible)?;
        for &id in &unplaced {
            plan.place(target, id)?;
        }
        debug!(
            "group {} ({} of {} packages) -> vehicle {}",
            group_id,
            unplaced.len(),
            group.len(),
            vehicles[target].id()
        );
    }

    let loose: Vec<&PackageRecord> = pending
        .iter()
        .copied()
        .filter(|r| r.group_id().is_none())
        .collect();

    // Pass 2: vehicle restrictions are never redirected.
    for record in loose.iter().filter(|r| r.required_vehicle().is_some()) {
        let Some(vehicle_id) = record.required_vehicle() else {
            continue;
        };
        let idx = plan.index_of(vehicle_id)?;
        plan.place(idx, record.id())
            .map_err(|_| DispatchError::AssignmentInfeasible {
                package_id: record.id(),
                constraint: Constraint::RequiredVehicle { vehicle_id },
            })?;
    }

    // Pass 3: delayed packages prefer a vehicle that leaves after release.
    for record in loose
        .iter()
        .filter(|r| r.required_vehicle().is_none() && r.release_time().is_some())
    {
        let order = plan.release_order(record.release_time());
        plan.place_first_fit(&order, record.id())?;
    }

    // Pass 4: everything else fills the fleet in order.
    let fleet_order: Vec<usize> = (0..vehicles.len()).collect();
    for record in loose
        .iter()
        .filter(|r| r.required_vehicle().is_none() && r.release_time().is_none())
    {
        plan.place_first_fit(&fleet_order, record.id())?;
    }

    let picks = plan.picks;

    // Commit.
    let mut assignment = Assignment::default();
    for (vehicle, ids) in vehicles.iter_mut().zip(picks) {
        for &id in &ids {
            vehicle.load_package(id)?;
            registry.claim(id, vehicle.id())?;
        }
        info!(
            "vehicle {}: {} packages assigned ({} of {} slots used)",
            vehicle.id(),
            ids.len(),
            vehicle.load_size(),
            vehicle.capacity()
        );
        assignment.by_vehicle.insert(vehicle.id(), ids);
    }
    Ok(assignment)
}
