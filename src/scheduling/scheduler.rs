//! Per-vehicle greedy delivery loop.
//!
//! # Algorithm
//!
//! Repeats select → travel → deliver until the load is empty:
//!
//! 1. Pick the next package with [`select_next`]: finish the group in
//!    progress first, then the earliest real deadline, then the nearest
//!    package. Distances are always measured from where the vehicle is now.
//! 2. Drive there, advancing clock by `distance / speed` and the odometer
//!    by `distance`.
//! 3. Mark the package delivered at the new clock and drop it from the load.
//!
//! If packages remain but none is eligible the loop stops with
//! [`RunOutcome::Stalled`] so a caller can wait for the next release time
//! and run again.
//!
//! # Complexity
//!
//! O(n²) oracle lookups where n = packages in the load.

use log::{debug, info, warn};

use super::selection::{select_next, Selection};
use crate::distance::DistanceOracle;
use crate::error::{DispatchError, Result};
use crate::models::{
    format_time, PackageId, PackageRecord, PackageRegistry, PackageStatus, Route, Stop, Vehicle,
    VehicleId,
};

/// How a scheduler invocation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Every package in the load was delivered.
    Completed,
    /// Packages remain but none can be delivered at the current clock.
    Stalled {
        /// Undelivered package ids, ascending.
        remaining: Vec<PackageId>,
        /// Vehicle clock at the stall.
        clock: f64,
        /// Earliest future release among the remaining packages.
        next_release: Option<f64>,
    },
}

/// Result of one scheduler invocation.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Vehicle that ran.
    pub vehicle_id: VehicleId,
    /// Deliveries made in this invocation.
    pub route: Route,
    /// Completion or stall.
    pub outcome: RunOutcome,
}

impl RunReport {
    /// Returns `true` if the load was emptied.
    pub fn is_completed(&self) -> bool {
        self.outcome == RunOutcome::Completed
    }

    /// Returns `true` if the run stopped with packages left.
    pub fn is_stalled(&self) -> bool {
        matches!(self.outcome, RunOutcome::Stalled { .. })
    }
}

/// Delivers one vehicle's load in deadline-first, nearest-neighbor order.
///
/// # Examples
///
/// ```
/// use u_dispatch::distance::DistanceMatrix;
/// use u_dispatch::models::{Deadline, Location, PackageRecord, PackageRegistry, Vehicle};
/// use u_dispatch::scheduling::RouteScheduler;
///
/// let hub = Location::new("hub");
/// let x = Location::new("x");
/// let y = Location::new("y");
/// let dm = DistanceMatrix::from_lower_triangular(
///     vec![hub.clone(), x.clone(), y.clone()],
///     vec![vec![0.0], vec![3.0, 0.0], vec![10.0, 7.0, 0.0]],
/// ).unwrap();
///
/// let mut registry = PackageRegistry::from_records(vec![
///     PackageRecord::new(1, x).with_deadline(Deadline::By(9.0)),
///     PackageRecord::new(2, y),
/// ]).unwrap();
/// let mut vehicle = Vehicle::new(1, 2, hub).with_speed(10.0).with_departure(8.0);
/// vehicle.load_package(1).unwrap();
/// vehicle.load_package(2).unwrap();
///
/// let report = RouteScheduler::new(&dm).run(&mut vehicle, &mut registry).unwrap();
/// assert!(report.is_completed());
/// assert_eq!(report.route.package_ids(), vec![1, 2]);
/// assert!((vehicle.odometer() - 10.0).abs() < 1e-10);
/// ```
#[derive(Debug)]
pub struct RouteScheduler<'o, O: ?Sized> {
    oracle: &'o O,
    return_to_hub: bool,
}

impl<'o, O: DistanceOracle + ?Sized> RouteScheduler<'o, O> {
    /// Creates a scheduler over the given distance oracle.
    pub fn new(oracle: &'o O) -> Self {
        Self {
            oracle,
            return_to_hub: false,
        }
    }

    /// Drive back to the hub once the load is empty.
    pub fn with_return_to_hub(mut self, return_to_hub: bool) -> Self {
        self.return_to_hub = return_to_hub;
        self
    }

    /// Delivers the vehicle's load until it is empty or nothing is eligible.
    ///
    /// # Errors
    ///
    /// Oracle failures ([`LocationNotFound`](crate::error::DispatchError::LocationNotFound))
    /// and registry inconsistencies (missing records, a package owned by
    /// another vehicle) abort the run; state up to that point is kept.
    pub fn run(&self, vehicle: &mut Vehicle, registry: &mut PackageRegistry) -> Result<RunReport> {
        drop_delivered(vehicle, registry);

        let mut route = Route::new(vehicle.id(), vehicle.clock());
        let mut active_group: Option<u32> = None;

        while !vehicle.load().is_empty() {
            let Some(selection) = select_next(vehicle, registry, self.oracle, active_group)? else {
                return Ok(self.stalled(vehicle, registry, route));
            };
            debug!(
                "vehicle {} at {}: package {} ({:?}, {:.1})",
                vehicle.id(),
                format_time(vehicle.clock()),
                selection.package_id,
                selection.reason,
                selection.distance
            );
            let stop = self.deliver(vehicle, registry, &selection)?;
            route.push_stop(stop);

            active_group = selection.group_id.filter(|&g| {
                vehicle.load().iter().any(|&id| {
                    registry
                        .get(id)
                        .is_ok_and(|r| r.group_id() == Some(g))
                })
            });
        }

        if self.return_to_hub && !vehicle.is_at_hub() {
            let hub = vehicle.hub().clone();
            let d = self.oracle.distance(vehicle.location(), &hub)?;
            vehicle.travel_to(hub, d);
        }

        route.set_finish(vehicle.clock());
        route.set_total_distance(vehicle.odometer());
        info!(
            "vehicle {} done at {}: {} deliveries, {:.1} total distance",
            vehicle.id(),
            format_time(vehicle.clock()),
            route.len(),
            vehicle.odometer()
        );
        Ok(RunReport {
            vehicle_id: vehicle.id(),
            route,
            outcome: RunOutcome::Completed,
        })
    }

    fn deliver(
        &self,
        vehicle: &mut Vehicle,
        registry: &mut PackageRegistry,
        selection: &Selection,
    ) -> Result<Stop> {
        let id = selection.package_id;
        let record = registry.get(id)?;
        let destination = record.destination().clone();
        if let Some(owner) = record.vehicle_id().filter(|&v| v != vehicle.id()) {
            return Err(DispatchError::AlreadyClaimed {
                package_id: id,
                owner,
            });
        }
        // Ownership is settled before the vehicle moves.
        registry.claim(id, vehicle.id())?;

        vehicle.travel_to(destination.clone(), selection.distance);

        let record = registry.get(id)?;
        if record.status() == PackageStatus::AtHub {
            let loaded = load_time(record, vehicle);
            registry.mark_en_route(id, vehicle.id(), loaded)?;
        }
        registry.mark_delivered(id, vehicle.id(), vehicle.clock())?;
        vehicle.unload(id);

        let record = registry.get(id)?;
        if record.is_late() {
            warn!(
                "package {id} delivered at {} after its {} deadline",
                format_time(vehicle.clock()),
                record.deadline()
            );
        }

        Ok(Stop {
            package_id: id,
            location: destination,
            leg_distance: selection.distance,
            arrival_time: vehicle.clock(),
            odometer_after: vehicle.odometer(),
        })
    }

    fn stalled(&self, vehicle: &Vehicle, registry: &PackageRegistry, mut route: Route) -> RunReport {
        let clock = vehicle.clock();
        let remaining: Vec<PackageId> = vehicle.load().iter().copied().collect();
        let next_release = remaining
            .iter()
            .filter_map(|&id| registry.get(id).ok().and_then(PackageRecord::release_time))
            .filter(|&t| t > clock)
            .min_by(f64::total_cmp);
        warn!(
            "vehicle {} stalled at {} with {} packages; next release {}",
            vehicle.id(),
            format_time(clock),
            remaining.len(),
            next_release.map_or_else(|| "none".to_string(), format_time)
        );
        route.set_finish(clock);
        route.set_total_distance(vehicle.odometer());
        RunReport {
            vehicle_id: vehicle.id(),
            route,
            outcome: RunOutcome::Stalled {
                remaining,
                clock,
                next_release,
            },
        }
    }
}

/// Removes packages that are already delivered from the load.
fn drop_delivered(vehicle: &mut Vehicle, registry: &PackageRegistry) {
    let delivered: Vec<PackageId> = vehicle
        .load()
        .iter()
        .copied()
        .filter(|&id| {
            registry
                .get(id)
                .is_ok_and(|r| r.status() == PackageStatus::Delivered)
        })
        .collect();
    for id in delivered {
        warn!("vehicle {}: package {id} already delivered, dropping", vehicle.id());
        vehicle.unload(id);
    }
}

/// Time a package counts as having left the hub.
///
/// Packages on board from the start left with the vehicle's departure. A
/// package that only reached the hub later left no earlier than its arrival
/// and the vehicle's latest trip out.
fn load_time(record: &PackageRecord, vehicle: &Vehicle) -> f64 {
    match record.delayed_until() {
        Some(t) if t > vehicle.departure() => vehicle.dispatched_at().max(t),
        _ => vehicle.departure(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distance::DistanceMatrix;
    use crate::models::{AddressCorrection, Deadline, Location};

    /// hub, x (3), y (10), z (1), w (6).
    fn oracle() -> DistanceMatrix {
        let names = ["hub", "x", "y", "z", "w"];
        DistanceMatrix::from_lower_triangular(
            names.iter().map(|n| Location::new(*n)).collect(),
            vec![
                vec![0.0],
                vec![3.0, 0.0],
                vec![10.0, 7.0, 0.0],
                vec![1.0, 2.0, 9.0, 0.0],
                vec![6.0, 3.0, 4.0, 5.0, 0.0],
            ],
        )
        .expect("valid")
    }

    fn setup(capacity: usize, records: Vec<PackageRecord>) -> (Vehicle, PackageRegistry) {
        let mut vehicle = Vehicle::new(1, capacity, Location::new("hub"))
            .with_speed(10.0)
            .with_departure(8.0);
        let mut registry = PackageRegistry::from_records(records).expect("valid");
        for id in registry.all_ids() {
            vehicle.load_package(id).expect("room");
            registry.claim(id, 1).expect("unowned");
        }
        (vehicle, registry)
    }

    fn at(id: PackageId, loc: &str) -> PackageRecord {
        PackageRecord::new(id, Location::new(loc))
    }

    #[test]
    fn test_urgent_first_then_rest() {
        let dm = oracle();
        let (mut v, mut reg) = setup(2, vec![
            at(1, "x").with_deadline(Deadline::By(9.0)),
            at(2, "y"),
        ]);
        let report = RouteScheduler::new(&dm).run(&mut v, &mut reg).expect("ok");
        assert_eq!(report.route.package_ids(), vec![1, 2]);
        let first = &report.route.stops()[0];
        assert!((first.odometer_after - 3.0).abs() < 1e-10);
        assert!((first.arrival_time - 8.3).abs() < 1e-10);
        assert!((v.odometer() - 10.0).abs() < 1e-10);
        assert!((v.clock() - 9.0).abs() < 1e-10);
    }

    #[test]
    fn test_statuses_and_timestamps() {
        let dm = oracle();
        let (mut v, mut reg) = setup(2, vec![at(1, "z"), at(2, "x")]);
        RouteScheduler::new(&dm).run(&mut v, &mut reg).expect("ok");
        for id in [1, 2] {
            let r = reg.get(id).expect("exists");
            assert_eq!(r.status(), PackageStatus::Delivered);
            assert_eq!(r.load_time(), Some(8.0));
            assert_eq!(r.vehicle_id(), Some(1));
            assert_eq!(reg.owner_of(id), None);
        }
        let d1 = reg.get(1).expect("exists").delivery_time().expect("delivered");
        assert!((d1 - 8.1).abs() < 1e-10);
        assert!(v.load().is_empty());
    }

    #[test]
    fn test_group_delivered_back_to_back() {
        let dm = oracle();
        // z is nearest; group {y, w} carries the deadline.
        let (mut v, mut reg) = setup(3, vec![
            at(1, "y").with_group(1).with_deadline(Deadline::By(10.0)),
            at(2, "w").with_group(1),
            at(3, "z"),
        ]);
        let report = RouteScheduler::new(&dm).run(&mut v, &mut reg).expect("ok");
        assert_eq!(report.route.package_ids(), vec![1, 2, 3]);
    }

    #[test]
    fn test_group_not_interleaved_after_nearest_pick() {
        let dm = oracle();
        // x is nearest and in the group; w is the other member; z is closer to x than w.
        let (mut v, mut reg) = setup(3, vec![
            at(1, "x").with_group(2),
            at(2, "w").with_group(2),
            at(3, "z"),
        ]);
        let report = RouteScheduler::new(&dm).run(&mut v, &mut reg).expect("ok");
        assert_eq!(report.route.package_ids(), vec![3, 1, 2]);
        let ids = report.route.package_ids();
        let p1 = ids.iter().position(|&i| i == 1).expect("delivered");
        let p2 = ids.iter().position(|&i| i == 2).expect("delivered");
        assert_eq!(p1.abs_diff(p2), 1);
    }

    #[test]
    fn test_stall_reports_remaining() {
        let dm = oracle();
        let (mut v, mut reg) = setup(2, vec![at(1, "z"), at(2, "x").with_delay(9.05)]);
        let report = RouteScheduler::new(&dm).run(&mut v, &mut reg).expect("ok");
        assert!(report.is_stalled());
        assert_eq!(report.route.package_ids(), vec![1]);
        match report.outcome {
            RunOutcome::Stalled {
                remaining,
                next_release,
                ..
            } => {
                assert_eq!(remaining, vec![2]);
                assert_eq!(next_release, Some(9.05));
            }
            RunOutcome::Completed => panic!("expected stall"),
        }
        assert_eq!(reg.get(2).expect("exists").status(), PackageStatus::AtHub);
    }

    #[test]
    fn test_rerun_after_release_completes() {
        let dm = oracle();
        let (mut v, mut reg) = setup(2, vec![at(1, "z"), at(2, "x").with_delay(9.05)]);
        let scheduler = RouteScheduler::new(&dm);
        assert!(scheduler.run(&mut v, &mut reg).expect("ok").is_stalled());
        v.wait_until(9.05);
        let report = scheduler.run(&mut v, &mut reg).expect("ok");
        assert!(report.is_completed());
        let r = reg.get(2).expect("exists");
        assert!(r.load_time().expect("loaded") >= 9.05);
        assert!(r.delivery_time().expect("delivered") >= 9.05);
    }

    #[test]
    fn test_address_correction_delivers_to_new_location() {
        let dm = oracle();
        let fix = AddressCorrection::new(7.5, Location::new("w")).expect("valid");
        let (mut v, mut reg) = setup(1, vec![at(9, "y").with_address_correction(fix)]);
        let report = RouteScheduler::new(&dm).run(&mut v, &mut reg).expect("ok");
        assert_eq!(report.route.stops()[0].location, Location::new("w"));
        assert!((v.odometer() - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_return_to_hub() {
        let dm = oracle();
        let (mut v, mut reg) = setup(1, vec![at(1, "x")]);
        let report = RouteScheduler::new(&dm)
            .with_return_to_hub(true)
            .run(&mut v, &mut reg)
            .expect("ok");
        assert!(v.is_at_hub());
        assert!((v.odometer() - 6.0).abs() < 1e-10);
        assert!((report.route.total_distance() - 6.0).abs() < 1e-10);
        assert!((report.route.finish() - 8.6).abs() < 1e-10);
    }

    #[test]
    fn test_unknown_location_aborts() {
        let dm = oracle();
        let (mut v, mut reg) = setup(1, vec![at(1, "nowhere")]);
        let err = RouteScheduler::new(&dm).run(&mut v, &mut reg).unwrap_err();
        assert!(matches!(err, DispatchError::LocationNotFound { .. }));
        assert_eq!(v.odometer(), 0.0);
    }

    #[test]
    fn test_foreign_owner_rejected() {
        let dm = oracle();
        let mut reg = PackageRegistry::from_records(vec![at(1, "x")]).expect("valid");
        reg.claim(1, 2).expect("unowned");
        let mut v = Vehicle::new(1, 1, Location::new("hub")).with_departure(8.0);
        v.load_package(1).expect("room");
        let err = RouteScheduler::new(&dm).run(&mut v, &mut reg).unwrap_err();
        assert!(matches!(err, DispatchError::AlreadyClaimed { owner: 2, .. }));
        assert_eq!(v.odometer(), 0.0);
        assert_eq!(v.clock(), 8.0);
        assert!(v.is_at_hub());
        assert_eq!(reg.get(1).expect("exists").status(), PackageStatus::AtHub);
    }

    #[test]
    fn test_package_carried_by_other_vehicle_not_delivered() {
        let dm = oracle();
        let mut reg = PackageRegistry::from_records(vec![at(1, "x")]).expect("valid");
        reg.mark_en_route(1, 2, 8.0).expect("at hub");
        let mut v = Vehicle::new(1, 1, Location::new("hub")).with_departure(8.0);
        v.load_package(1).expect("room");

        let err = RouteScheduler::new(&dm).run(&mut v, &mut reg).unwrap_err();

        assert!(matches!(
            err,
            DispatchError::AlreadyClaimed {
                package_id: 1,
                owner: 2
            }
        ));
        assert_eq!(v.odometer(), 0.0);
        assert!(v.is_at_hub());
        let record = reg.get(1).expect("exists");
        assert_eq!(record.status(), PackageStatus::EnRoute);
        assert_eq!(record.vehicle_id(), Some(2));
        assert_eq!(reg.owner_of(1), Some(2));
    }

    #[test]
    fn test_empty_load_completes_immediately() {
        let dm = oracle();
        let mut reg = PackageRegistry::new();
        let mut v = Vehicle::new(1, 4, Location::new("hub")).with_departure(8.0);
        let report = RouteScheduler::new(&dm).run(&mut v, &mut reg).expect("ok");
        assert!(report.is_completed());
        assert!(report.route.is_empty());
        assert_eq!(v.clock(), 8.0);
    }
}
