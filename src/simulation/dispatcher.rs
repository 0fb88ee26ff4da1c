//! Sequential fleet dispatcher.
//!
//! Runs each vehicle's scheduler in fleet order. A vehicle needs a driver
//! to leave the hub; with fewer drivers than vehicles a truck waits for the
//! driver that frees up first. Stalls are either reported or resolved by
//! waiting for the next package release.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::assignment::assign_packages;
use crate::distance::DistanceOracle;
use crate::error::{DispatchError, Result};
use crate::models::{format_time, PackageRegistry, Route, Solution, Vehicle};
use crate::scheduling::{RouteScheduler, RunOutcome, RunReport};

/// What to do when a vehicle's scheduler stalls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StallPolicy {
    /// Leave the vehicle stalled and report its packages as undelivered.
    Report,
    /// Idle until the next release and resume; a package still on its way
    /// to the hub is picked up there first.
    #[default]
    WaitForRelease,
}

/// Fleet-level dispatch options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchOptions {
    /// Number of drivers; `None` gives every vehicle its own.
    pub drivers: Option<usize>,
    /// Drive back to the hub after the last delivery.
    pub return_to_hub: bool,
    /// Stall handling.
    pub stall_policy: StallPolicy,
}

impl DispatchOptions {
    /// Creates default options: one driver per vehicle, no return trip,
    /// wait on stalls.
    pub fn new() -> Self {
        Self::default()
    }

    /// Limits the number of drivers.
    pub fn with_drivers(mut self, drivers: usize) -> Self {
        self.drivers = Some(drivers);
        self
    }

    /// Sets whether vehicles return to the hub when done.
    pub fn with_return_to_hub(mut self, return_to_hub: bool) -> Self {
        self.return_to_hub = return_to_hub;
        self
    }

    /// Sets the stall policy.
    pub fn with_stall_policy(mut self, policy: StallPolicy) -> Self {
        self.stall_policy = policy;
        self
    }
}

/// Assigns every pending package and then runs the fleet.
///
/// # Errors
///
/// Any assignment error aborts before a vehicle moves. Scheduler errors
/// abort the run with the state reached so far.
///
/// # Examples
///
/// ```
/// use u_dispatch::distance::DistanceMatrix;
/// use u_dispatch::models::{Location, PackageRecord, PackageRegistry, Vehicle};
/// use u_dispatch::simulation::{dispatch, DispatchOptions};
///
/// let hub = Location::new("hub");
/// let a = Location::new("a");
/// let dm = DistanceMatrix::from_lower_triangular(
///     vec![hub.clone(), a.clone()],
///     vec![vec![0.0], vec![9.0, 0.0]],
/// ).unwrap();
/// let mut registry = PackageRegistry::from_records(vec![PackageRecord::new(1, a)]).unwrap();
/// let mut fleet = vec![Vehicle::new(1, 16, hub).with_departure(8.0)];
///
/// let solution = dispatch(&mut fleet, &mut registry, &dm, &DispatchOptions::new()).unwrap();
/// assert!(solution.is_complete());
/// assert!((fleet[0].clock() - 8.5).abs() < 1e-10);
/// ```
pub fn dispatch<O: DistanceOracle + ?Sized>(
    vehicles: &mut [Vehicle],
    registry: &mut PackageRegistry,
    oracle: &O,
    options: &DispatchOptions,
) -> Result<Solution> {
    assign_packages(vehicles, registry)?;
    run_fleet(vehicles, registry, oracle, options)
}

/// Runs the scheduler for every loaded vehicle in fleet order.
///
/// Each vehicle takes the driver that frees up earliest and leaves at the
/// later of its own departure and that driver's return. Vehicles with an
/// empty load get an empty route and do not take a driver.
///
/// # Errors
///
/// [`DispatchError::InvalidFleet`] when `drivers` is zero; scheduler errors
/// are propagated unchanged.
pub fn run_fleet<O: DistanceOracle + ?Sized>(
    vehicles: &mut [Vehicle],
    registry: &mut PackageRegistry,
    oracle: &O,
    options: &DispatchOptions,
) -> Result<Solution> {
    let drivers = options.drivers.unwrap_or(vehicles.len());
    if drivers == 0 && !vehicles.is_empty() {
        return Err(DispatchError::InvalidFleet {
            reason: "at least one driver is required".to_string(),
        });
    }

    let scheduler = RouteScheduler::new(oracle).with_return_to_hub(options.return_to_hub);
    let mut free_at = vec![0.0_f64; drivers];
    let mut solution = Solution::new();

    for vehicle in vehicles.iter_mut() {
        if vehicle.load().is_empty() {
            solution.add_route(Route::new(vehicle.id(), vehicle.departure()));
            continue;
        }

        let Some((slot, &ready)) = free_at
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.total_cmp(b.1))
        else {
            continue;
        };
        vehicle.depart_at(ready);
        info!(
            "vehicle {} departs at {} with {} packages",
            vehicle.id(),
            format_time(vehicle.departure()),
            vehicle.load_size()
        );

        let mut report = scheduler.run(vehicle, registry)?;
        let mut route = report.route.clone();
        while let RunOutcome::Stalled { next_release, .. } = &report.outcome {
            let next_release = match (options.stall_policy, *next_release) {
                (StallPolicy::WaitForRelease, Some(t)) => t,
                _ => {
                    warn!("vehicle {} left stalled", vehicle.id());
                    solution.add_stalled(vehicle.id());
                    break;
                }
            };
            pick_up_at_hub(vehicle, registry, oracle, &report)?;
            vehicle.wait_until(next_release);
            report = scheduler.run(vehicle, registry)?;
            route.extend(report.route.clone());
        }

        free_at[slot] = vehicle.clock();
        solution.add_route(route);
    }

    for id in registry.undelivered() {
        solution.add_undelivered(id);
    }
    info!(
        "dispatch finished: {} delivered, {} undelivered, {:.1} total distance",
        solution.num_delivered(),
        solution.undelivered().len(),
        solution.total_distance()
    );
    Ok(solution)
}

/// Drives back to the hub if a stalled package has not reached it yet.
fn pick_up_at_hub<O: DistanceOracle + ?Sized>(
    vehicle: &mut Vehicle,
    registry: &PackageRegistry,
    oracle: &O,
    report: &RunReport,
) -> Result<()> {
    let RunOutcome::Stalled { remaining, .. } = &report.outcome else {
        return Ok(());
    };
    if vehicle.is_at_hub() {
        return Ok(());
    }
    let mut waiting = false;
    for &id in remaining {
        if registry.get(id)?.is_delayed_at(vehicle.clock()) {
            waiting = true;
            break;
        }
    }
    if waiting {
        let hub = vehicle.hub().clone();
        let d = oracle.distance(vehicle.location(), &hub)?;
        vehicle.travel_to(hub, d);
    }
    Ok(())
}
