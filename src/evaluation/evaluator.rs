//! Dispatch auditor that re-checks finished routes against package rules.

use std::collections::{BTreeMap, BTreeSet};

use crate::models::{
    PackageId, PackageRegistry, PackageStatus, Route, Solution, VehicleId, Violation,
    ViolationType,
};

/// Audits routes against the registry: deadlines, vehicle restrictions,
/// group atomicity and leftover packages.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::{Deadline, Location, PackageRecord, PackageRegistry, Route, Stop};
/// use u_dispatch::evaluation::DispatchEvaluator;
///
/// let registry = PackageRegistry::from_records(vec![
///     PackageRecord::new(1, Location::new("a")).with_deadline(Deadline::By(9.0)),
/// ]).unwrap();
/// let mut route = Route::new(1, 8.0);
/// route.push_stop(Stop {
///     package_id: 1,
///     location: Location::new("a"),
///     leg_distance: 36.0,
///     arrival_time: 10.0,
///     odometer_after: 36.0,
/// });
///
/// let violations = DispatchEvaluator::new(&registry).evaluate_route(&route);
/// assert_eq!(violations.len(), 1);
/// ```
pub struct DispatchEvaluator<'a> {
    registry: &'a PackageRegistry,
}

impl<'a> DispatchEvaluator<'a> {
    /// Creates an evaluator over the final registry state.
    pub fn new(registry: &'a PackageRegistry) -> Self {
        Self { registry }
    }

    /// Checks a single route: missed deadlines, wrong vehicles and
    /// deliveries wedged between members of a group.
    pub fn evaluate_route(&self, route: &Route) -> Vec<Violation> {
        let mut violations = Vec::new();
        let mut positions: BTreeMap<u32, Vec<usize>> = BTreeMap::new();

        for (pos, stop) in route.stops().iter().enumerate() {
            let Ok(record) = self.registry.get(stop.package_id) else {
                continue;
            };
            let deadline = record.deadline();
            if deadline.is_missed_at(stop.arrival_time) {
                violations.push(Violation::new(ViolationType::DeadlineMissed {
                    package_id: stop.package_id,
                    delivered_at: stop.arrival_time,
                    deadline,
                }));
            }
            if let Some(required) = record.required_vehicle() {
                if required != route.vehicle_id() {
                    violations.push(Violation::new(ViolationType::RequiredVehicleMismatch {
                        package_id: stop.package_id,
                        required,
                        actual: route.vehicle_id(),
                    }));
                }
            }
            if let Some(g) = record.group_id() {
                positions.entry(g).or_default().push(pos);
            }
        }

        let stops = route.stops();
        for (group_id, pos) in positions {
            let (Some(&first), Some(&last)) = (pos.first(), pos.last()) else {
                continue;
            };
            let intruder = stops[first..=last].iter().find(|s| {
                self.registry
                    .get(s.package_id)
                    .map_or(true, |r| r.group_id() != Some(group_id))
            });
            if let Some(stop) = intruder {
                violations.push(Violation::new(ViolationType::GroupInterleaved {
                    group_id,
                    intruder: stop.package_id,
                }));
            }
        }

        violations
    }

    /// Evaluates a whole dispatch, returning total distance and every
    /// violation found.
    ///
    /// On top of the per-route checks this reports groups split across
    /// vehicles and packages that never reached the delivered state.
    pub fn evaluate_solution(&self, solution: &Solution) -> (f64, Vec<Violation>) {
        let mut all_violations = Vec::new();
        let mut carriers: BTreeMap<u32, BTreeSet<VehicleId>> = BTreeMap::new();

        for route in solution.routes() {
            all_violations.append(&mut self.evaluate_route(route));
            for stop in route.stops() {
                if let Some(g) = self
                    .registry
                    .get(stop.package_id)
                    .ok()
                    .and_then(|r| r.group_id())
                {
                    carriers.entry(g).or_default().insert(route.vehicle_id());
                }
            }
        }

        for (group_id, vehicles) in carriers {
            if vehicles.len() > 1 {
                all_violations.push(Violation::new(ViolationType::GroupSplit {
                    group_id,
                    vehicles: vehicles.into_iter().collect(),
                }));
            }
        }

        let undelivered: Vec<PackageId> = self
            .registry
            .iter()
            .filter(|r| r.status() != PackageStatus::Delivered)
            .map(|r| r.id())
            .collect();
        for package_id in undelivered {
            all_violations.push(Violation::new(ViolationType::Undelivered { package_id }));
        }

        (solution.total_distance(), all_violations)
    }
}
