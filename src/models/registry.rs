//! Package registry with single-owner tracking.

use std::collections::{BTreeMap, HashMap};

use super::{PackageId, PackageRecord, PackageStatus, VehicleId};
use crate::error::{DispatchError, Result};

/// Keyed store of package records shared by the assigner and schedulers.
///
/// Iteration is in ascending id order. Besides the records, the registry
/// remembers which vehicle currently holds each package, so a package can
/// never sit in two loads at once.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::{Location, PackageRecord, PackageRegistry};
///
/// let mut registry = PackageRegistry::from_records(vec![
///     PackageRecord::new(1, Location::new("a")),
///     PackageRecord::new(2, Location::new("b")),
/// ]).unwrap();
///
/// registry.claim(1, 7).unwrap();
/// assert_eq!(registry.owner_of(1), Some(7));
/// assert!(registry.claim(1, 8).is_err());
/// assert_eq!(registry.all_ids(), vec![1, 2]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PackageRegistry {
    records: BTreeMap<PackageId, PackageRecord>,
    owners: HashMap<PackageId, VehicleId>,
}

impl PackageRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry, rejecting id 0 and duplicate ids.
    pub fn from_records(records: impl IntoIterator<Item = PackageRecord>) -> Result<Self> {
        let mut registry = Self::new();
        for record in records {
            registry.insert(record)?;
        }
        Ok(registry)
    }

    /// Adds a record.
    pub fn insert(&mut self, record: PackageRecord) -> Result<()> {
        let package_id = record.id();
        if package_id == 0 {
            return Err(DispatchError::InvalidPackageId);
        }
        if self.records.contains_key(&package_id) {
            return Err(DispatchError::DuplicatePackage { package_id });
        }
        self.records.insert(package_id, record);
        Ok(())
    }

    /// Looks up a record.
    pub fn get(&self, package_id: PackageId) -> Result<&PackageRecord> {
        self.records
            .get(&package_id)
            .ok_or(DispatchError::PackageNotFound { package_id })
    }

    fn get_mut(&mut self, package_id: PackageId) -> Result<&mut PackageRecord> {
        self.records
            .get_mut(&package_id)
            .ok_or(DispatchError::PackageNotFound { package_id })
    }

    /// Returns `true` if a record with this id exists.
    pub fn contains(&self, package_id: PackageId) -> bool {
        self.records.contains_key(&package_id)
    }

    /// All package ids in ascending order.
    pub fn all_ids(&self) -> Vec<PackageId> {
        self.records.keys().copied().collect()
    }

    /// Iterates records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &PackageRecord> {
        self.records.values()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the registry holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Vehicle currently holding the package, if any.
    pub fn owner_of(&self, package_id: PackageId) -> Option<VehicleId> {
        self.owners.get(&package_id).copied()
    }

    /// Records `vehicle_id` as the sole holder of a package.
    ///
    /// Claiming a package the same vehicle already holds succeeds; claiming
    /// one held elsewhere fails with [`DispatchError::AlreadyClaimed`].
    pub fn claim(&mut self, package_id: PackageId, vehicle_id: VehicleId) -> Result<()> {
        let record = self.get(package_id)?;
        if record.status() == PackageStatus::Delivered {
            return Err(DispatchError::InvalidTransition {
                package_id,
                from: PackageStatus::Delivered,
                to: PackageStatus::EnRoute,
            });
        }
        match self.owners.get(&package_id) {
            Some(&owner) if owner != vehicle_id => {
                Err(DispatchError::AlreadyClaimed { package_id, owner })
            }
            _ => {
                self.owners.insert(package_id, vehicle_id);
                Ok(())
            }
        }
    }

    /// Drops ownership of a package, returning the previous owner.
    pub fn release(&mut self, package_id: PackageId) -> Option<VehicleId> {
        self.owners.remove(&package_id)
    }

    /// Moves a package onto `vehicle_id`, stamping its load time.
    pub fn mark_en_route(
        &mut self,
        package_id: PackageId,
        vehicle_id: VehicleId,
        time: f64,
    ) -> Result<()> {
        self.claim(package_id, vehicle_id)?;
        self.get_mut(package_id)?.mark_en_route(vehicle_id, time)
    }

    /// Marks a package delivered by `vehicle_id` at `time` and releases its
    /// owner.
    ///
    /// Only the vehicle holding the package may deliver it; any other
    /// vehicle gets [`DispatchError::AlreadyClaimed`] and nothing changes.
    pub fn mark_delivered(
        &mut self,
        package_id: PackageId,
        vehicle_id: VehicleId,
        time: f64,
    ) -> Result<()> {
        let holder = self.owner_of(package_id).or(self.get(package_id)?.vehicle_id());
        if let Some(owner) = holder.filter(|&owner| owner != vehicle_id) {
            return Err(DispatchError::AlreadyClaimed { package_id, owner });
        }
        self.get_mut(package_id)?.mark_delivered(time)?;
        self.release(package_id);
        Ok(())
    }

    /// Status of every package as of `time`, in ascending id order.
    pub fn snapshot(&self, time: f64) -> Vec<(PackageId, PackageStatus)> {
        self.records
            .values()
            .map(|r| (r.id(), r.status_at(time)))
            .collect()
    }

    /// Packages delivered after their deadline.
    pub fn late_packages(&self) -> Vec<PackageId> {
        self.records
            .values()
            .filter(|r| r.is_late())
            .map(PackageRecord::id)
            .collect()
    }

    /// Packages not yet delivered.
    pub fn undelivered(&self) -> Vec<PackageId> {
        self.records
            .values()
            .filter(|r| r.status() != PackageStatus::Delivered)
            .map(PackageRecord::id)
            .collect()
    }

    /// Total weight of all packages.
    pub fn total_weight(&self) -> f64 {
        self.records.values().map(PackageRecord::weight).sum()
    }
}
