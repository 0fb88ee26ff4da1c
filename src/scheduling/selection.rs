//! Next-package selection: group continuation, deadline tier, nearest neighbor.

use std::collections::BTreeMap;

use crate::distance::DistanceOracle;
use crate::error::Result;
use crate::models::{Deadline, PackageId, PackageRecord, PackageRegistry, Vehicle};

/// Why a package was picked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionReason {
    /// Next member of a group already being delivered.
    GroupContinuation,
    /// Carries the earliest real deadline among eligible packages.
    Deadline,
    /// Nearest eligible package; nobody had a real deadline.
    Nearest,
}

/// The package chosen for the next delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection {
    /// Package to deliver.
    pub package_id: PackageId,
    /// Group the package belongs to, if any.
    pub group_id: Option<u32>,
    /// Distance from the vehicle's current location.
    pub distance: f64,
    /// Rule that picked it.
    pub reason: SelectionReason,
}

/// Picks the next package for `vehicle`, or `None` if nothing is eligible.
///
/// With `active_group` set, the nearest remaining member of that group is
/// returned. Otherwise the candidates are the eligible packages in the load,
/// where a group member only counts once every member still in the load is
/// eligible. If any candidate has a real deadline, only the candidates
/// sharing the earliest deadline are considered; the nearest of them wins,
/// ties going to the lower package id.
pub fn select_next<O: DistanceOracle + ?Sized>(
    vehicle: &Vehicle,
    registry: &PackageRegistry,
    oracle: &O,
    active_group: Option<u32>,
) -> Result<Option<Selection>> {
    let clock = vehicle.clock();
    let load = vehicle
        .load()
        .iter()
        .map(|&id| registry.get(id))
        .collect::<Result<Vec<&PackageRecord>>>()?;

    if let Some(group_id) = active_group {
        let members = load
            .iter()
            .copied()
            .filter(|r| r.group_id() == Some(group_id) && r.is_eligible(clock));
        if let Some((record, distance)) = nearest(vehicle, members, oracle)? {
            return Ok(Some(Selection {
                package_id: record.id(),
                group_id: Some(group_id),
                distance,
                reason: SelectionReason::GroupContinuation,
            }));
        }
    }

    let mut group_ready: BTreeMap<u32, bool> = BTreeMap::new();
    for record in &load {
        if let Some(g) = record.group_id() {
            let ready = group_ready.entry(g).or_insert(true);
            *ready = *ready && record.is_eligible(clock);
        }
    }

    let candidates: Vec<&PackageRecord> = load
        .iter()
        .copied()
        .filter(|r| r.is_eligible(clock))
        .filter(|r| r.group_id().is_none_or(|g| group_ready.get(&g) == Some(&true)))
        .collect();

    let earliest = candidates
        .iter()
        .map(|r| r.deadline())
        .fold(Deadline::EndOfDay, |acc, d| if d < acc { d } else { acc });

    let (tier, reason): (Vec<&PackageRecord>, SelectionReason) = if earliest.is_urgent() {
        let cutoff = earliest.as_time();
        (
            candidates
                .into_iter()
                .filter(|r| r.deadline().as_time() == cutoff)
                .collect(),
            SelectionReason::Deadline,
        )
    } else {
        (candidates, SelectionReason::Nearest)
    };

    Ok(nearest(vehicle, tier.into_iter(), oracle)?.map(|(record, distance)| Selection {
        package_id: record.id(),
        group_id: record.group_id(),
        distance,
        reason,
    }))
}

/// Nearest record to the vehicle; the first one wins ties.
fn nearest<'r, O: DistanceOracle + ?Sized>(
    vehicle: &Vehicle,
    records: impl Iterator<Item = &'r PackageRecord>,
    oracle: &O,
) -> Result<Option<(&'r PackageRecord, f64)>> {
    let mut best: Option<(&PackageRecord, f64)> = None;
    for record in records {
        let d = oracle.distance(vehicle.location(), record.destination())?;
        if best.is_none_or(|(_, best_d)| d < best_d) {
            best = Some((record, d));
        }
    }
    Ok(best)
}
