//! Property-based tests for assignment and scheduling.
//!
//! # Invariants tested
//!
//! - **Capacity:** no load ever exceeds its vehicle's capacity.
//! - **Single ownership:** each package is assigned to and delivered by
//!   exactly one vehicle.
//! - **Group atomicity:** group members ride one vehicle and are delivered
//!   back to back.
//! - **Delay gating:** no package leaves the hub before it arrives there.
//! - **Termination:** the fleet delivers every package exactly once.
//! - **Monotonic progress:** clock and odometer never run backwards.
//! - **Deadline priority:** without groups or delays, deliveries follow
//!   deadline order.
//! - **Selection tiers:** with groups and delays at any clock, a fresh pick
//!   is an eligible, group-ready package from the earliest deadline tier.

use std::collections::HashSet;

use proptest::prelude::*;
use u_dispatch::assignment::assign_packages;
use u_dispatch::distance::DistanceMatrix;
use u_dispatch::evaluation::DispatchEvaluator;
use u_dispatch::models::{
    Deadline, Location, PackageRecord, PackageRegistry, PackageStatus, Vehicle, ViolationType,
};
use u_dispatch::scheduling::{select_next, SelectionReason};
use u_dispatch::simulation::{dispatch, DispatchOptions};

/// (location index, deadline, delayed until, group)
type PackageSpec = (usize, Option<f64>, Option<f64>, Option<u32>);

#[derive(Debug, Clone)]
struct Scenario {
    size: usize,
    rows: Vec<Vec<f64>>,
    packages: Vec<PackageSpec>,
}

impl Scenario {
    fn location(i: usize) -> Location {
        if i == 0 {
            Location::new("hub")
        } else {
            Location::new(format!("l{i}"))
        }
    }

    fn matrix(&self) -> DistanceMatrix {
        let mut rows = self.rows.clone();
        for (i, row) in rows.iter_mut().enumerate() {
            row[i] = 0.0;
        }
        let locations = (0..self.size).map(Self::location).collect();
        DistanceMatrix::from_lower_triangular(locations, rows).expect("generated table is valid")
    }

    fn registry(&self) -> PackageRegistry {
        let records = self
            .packages
            .iter()
            .enumerate()
            .map(|(i, &(loc, deadline, delay, group))| {
                let mut r = PackageRecord::new(i + 1, Self::location(loc));
                if let Some(t) = deadline {
                    r = r.with_deadline(Deadline::By(t));
                }
                if let Some(t) = delay {
                    r = r.with_delay(t);
                }
                if let Some(g) = group {
                    r = r.with_group(g);
                }
                r
            });
        PackageRegistry::from_records(records).expect("generated ids are unique")
    }

    fn fleet() -> Vec<Vehicle> {
        (1..=2)
            .map(|id| {
                Vehicle::new(id, 16, Location::new("hub"))
                    .with_speed(18.0)
                    .with_departure(8.0)
            })
            .collect()
    }
}

fn scenario_strategy(groups: bool, delays: bool) -> impl Strategy<Value = Scenario> {
    (2_usize..8).prop_flat_map(move |size| {
        let rows: Vec<_> = (0..size)
            .map(|i| prop::collection::vec(0.1_f64..20.0, i + 1))
            .collect();
        let group = if groups {
            prop::option::weighted(0.4, 1_u32..4).boxed()
        } else {
            Just(None).boxed()
        };
        let delay = if delays {
            prop::option::weighted(0.3, 8.0_f64..11.0).boxed()
        } else {
            Just(None).boxed()
        };
        let package = (1..size, prop::option::of(8.5_f64..17.0), delay, group);
        (Just(size), rows, prop::collection::vec(package, 1..=16)).prop_map(
            |(size, rows, packages)| Scenario {
                size,
                rows,
                packages,
            },
        )
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: assignment respects capacity and places each package once.
    #[test]
    fn assignment_respects_capacity_and_ownership(s in scenario_strategy(true, true)) {
        let mut fleet = Scenario::fleet();
        let mut registry = s.registry();
        let assignment = assign_packages(&mut fleet, &mut registry).expect("fits the fleet");

        let mut seen = HashSet::new();
        for v in &fleet {
            prop_assert!(v.load_size() <= v.capacity());
            for &id in v.load() {
                prop_assert!(seen.insert(id), "package {} in two loads", id);
                prop_assert_eq!(registry.owner_of(id), Some(v.id()));
            }
        }
        prop_assert_eq!(seen.len(), s.packages.len());
        prop_assert_eq!(assignment.len(), s.packages.len());
    }

    /// Property: every package is delivered exactly once and the audit finds
    /// nothing but missed deadlines.
    #[test]
    fn dispatch_delivers_everything_once(s in scenario_strategy(true, true)) {
        let dm = s.matrix();
        let mut fleet = Scenario::fleet();
        let mut registry = s.registry();
        let solution = dispatch(&mut fleet, &mut registry, &dm, &DispatchOptions::new())
            .expect("dispatch succeeds");

        prop_assert!(solution.is_complete());
        prop_assert_eq!(solution.num_delivered(), s.packages.len());
        let mut delivered = HashSet::new();
        for route in solution.routes() {
            for id in route.package_ids() {
                prop_assert!(delivered.insert(id), "package {} delivered twice", id);
            }
        }
        prop_assert!(registry.iter().all(|r| r.status() == PackageStatus::Delivered));

        let (_, violations) = DispatchEvaluator::new(&registry).evaluate_solution(&solution);
        for v in &violations {
            prop_assert!(
                matches!(v.kind, ViolationType::DeadlineMissed { .. }),
                "unexpected violation {:?}",
                v.kind
            );
        }
    }

    /// Property: a delayed package is never loaded or delivered before it
    /// reaches the hub.
    #[test]
    fn delayed_packages_wait_for_release(s in scenario_strategy(true, true)) {
        let dm = s.matrix();
        let mut fleet = Scenario::fleet();
        let mut registry = s.registry();
        dispatch(&mut fleet, &mut registry, &dm, &DispatchOptions::new())
            .expect("dispatch succeeds");

        for r in registry.iter() {
            let loaded = r.load_time().expect("loaded");
            let delivered = r.delivery_time().expect("delivered");
            if let Some(t) = r.delayed_until() {
                prop_assert!(loaded >= t, "package {} loaded at {} before {}", r.id(), loaded, t);
            }
            prop_assert!(delivered >= loaded);
            if let Some(t) = r.release_time() {
                prop_assert!(delivered >= t);
            }
        }
    }

    /// Property: arrival times and odometer readings never decrease.
    #[test]
    fn clock_and_odometer_are_monotonic(s in scenario_strategy(true, true)) {
        let dm = s.matrix();
        let mut fleet = Scenario::fleet();
        let mut registry = s.registry();
        let solution = dispatch(&mut fleet, &mut registry, &dm, &DispatchOptions::new())
            .expect("dispatch succeeds");

        for route in solution.routes() {
            let mut clock = route.departure();
            let mut odometer = 0.0;
            for stop in route.stops() {
                prop_assert!(stop.arrival_time >= clock);
                prop_assert!(stop.odometer_after >= odometer);
                clock = stop.arrival_time;
                odometer = stop.odometer_after;
            }
            prop_assert!(route.finish() >= clock);
            prop_assert!(route.total_distance() >= odometer);
        }
    }

    /// Property: with every package eligible and no groups, deliveries are
    /// in deadline order and end-of-day packages come last.
    #[test]
    fn deliveries_follow_deadline_order(s in scenario_strategy(false, false)) {
        let dm = s.matrix();
        let mut fleet = Scenario::fleet();
        let mut registry = s.registry();
        let solution = dispatch(&mut fleet, &mut registry, &dm, &DispatchOptions::new())
            .expect("dispatch succeeds");

        for route in solution.routes() {
            let deadlines: Vec<f64> = route
                .package_ids()
                .into_iter()
                .map(|id| registry.get(id).expect("exists").deadline().as_time())
                .collect();
            prop_assert!(
                deadlines.windows(2).all(|w| w[0] <= w[1]),
                "deadlines out of order: {:?}",
                deadlines
            );
        }
    }

    /// Property: outside a group in progress, an end-of-day package is only
    /// picked when no eligible, group-ready package has a real deadline.
    #[test]
    fn selection_prefers_real_deadlines(
        s in scenario_strategy(true, true),
        clock in 8.0_f64..11.5,
    ) {
        let dm = s.matrix();
        let registry = s.registry();
        let mut vehicle = Vehicle::new(1, 16, Location::new("hub")).with_departure(clock);
        for id in registry.all_ids() {
            vehicle.load_package(id).expect("room");
        }

        let records: Vec<&PackageRecord> = registry.iter().collect();
        let group_ready = |g: u32| {
            records
                .iter()
                .filter(|r| r.group_id() == Some(g))
                .all(|r| r.is_eligible(clock))
        };
        let candidates: Vec<&PackageRecord> = records
            .iter()
            .copied()
            .filter(|r| r.is_eligible(clock) && r.group_id().is_none_or(|g| group_ready(g)))
            .collect();

        let picked = select_next(&vehicle, &registry, &dm, None).expect("known locations");
        let Some(selection) = picked else {
            prop_assert!(candidates.is_empty(), "nothing picked among {} candidates", candidates.len());
            return Ok(());
        };
        prop_assert_ne!(selection.reason, SelectionReason::GroupContinuation);
        let record = registry.get(selection.package_id).expect("exists");
        prop_assert!(candidates.iter().any(|r| r.id() == record.id()));

        let earliest = candidates
            .iter()
            .map(|r| r.deadline().as_time())
            .fold(f64::INFINITY, f64::min);
        prop_assert_eq!(record.deadline().as_time(), earliest);
        if !record.deadline().is_urgent() {
            prop_assert!(
                candidates.iter().all(|r| !r.deadline().is_urgent()),
                "end-of-day package {} picked over a real deadline",
                record.id()
            );
            prop_assert_eq!(selection.reason, SelectionReason::Nearest);
        }
    }
}
