//! Delivery-together group derivation.

use std::collections::BTreeMap;

use crate::models::{PackageId, PackageRecord, VehicleId};

/// Packages that must ride one vehicle and be delivered back to back.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// Shared group id.
    pub group_id: u32,
    /// Member package ids in ascending order.
    pub members: Vec<PackageId>,
    /// Vehicles demanded by any member (more than one is infeasible).
    pub required_vehicles: Vec<VehicleId>,
    /// Latest release time among the members.
    pub release_time: Option<f64>,
}

impl Group {
    /// Number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the group has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Collects groups from package records, keyed and ordered by group id.
///
/// A member's vehicle restriction and release time bind the whole group.
pub fn collect_groups<'a>(records: impl IntoIterator<Item = &'a PackageRecord>) -> Vec<Group> {
    let mut groups: BTreeMap<u32, Group> = BTreeMap::new();
    for record in records {
        let Some(group_id) = record.group_id() else {
            continue;
        };
        let group = groups.entry(group_id).or_insert_with(|| Group {
            group_id,
            members: Vec::new(),
            required_vehicles: Vec::new(),
            release_time: None,
        });
        group.members.push(record.id());
        if let Some(v) = record.required_vehicle() {
            if !group.required_vehicles.contains(&v) {
                group.required_vehicles.push(v);
            }
        }
        if let Some(t) = record.release_time() {
            group.release_time = Some(group.release_time.map_or(t, |r: f64| r.max(t)));
        }
    }
    groups
        .into_values()
        .map(|mut g| {
            g.members.sort_unstable();
            g.required_vehicles.sort_unstable();
            g
        })
        .collect()
}
