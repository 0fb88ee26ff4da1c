//! Package records, constraints, and lifecycle status.

use serde::{Deserialize, Serialize};

use super::{Deadline, Location, VehicleId};
use crate::error::{DispatchError, Result};

/// Unique positive package identifier.
pub type PackageId = usize;

/// Lifecycle status of a package.
///
/// Packages move strictly `AtHub → EnRoute → Delivered`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PackageStatus {
    /// Waiting at the hub.
    #[default]
    AtHub,
    /// On a vehicle that has left the hub.
    EnRoute,
    /// Delivered; terminal.
    Delivered,
}

impl std::fmt::Display for PackageStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::AtHub => "at hub",
            Self::EnRoute => "en route",
            Self::Delivered => "delivered",
        })
    }
}

/// A pending fix for a package recorded with the wrong address.
///
/// Until `available_at` the true destination is unknown and the package
/// cannot be delivered; afterwards it goes to `location`.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::{AddressCorrection, Location, time_of_day};
///
/// let fix = AddressCorrection::new(time_of_day(10, 20), Location::new("410 S State St")).unwrap();
/// assert_eq!(fix.location().as_str(), "410 S State St");
/// assert!(AddressCorrection::new(f64::NAN, Location::new("x")).is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressCorrection {
    available_at: f64,
    location: Location,
}

impl AddressCorrection {
    /// Creates a correction that takes effect at `available_at`.
    ///
    /// Returns `None` if the time is not finite.
    pub fn new(available_at: f64, location: Location) -> Option<Self> {
        if !available_at.is_finite() {
            return None;
        }
        Some(Self {
            available_at,
            location,
        })
    }

    /// Time at which the corrected address becomes known.
    pub fn available_at(&self) -> f64 {
        self.available_at
    }

    /// Corrected destination.
    pub fn location(&self) -> &Location {
        &self.location
    }
}

/// A package to deliver, with its constraints and delivery state.
///
/// Constraints are plain optional fields resolved during ingestion. Status
/// and timestamps change only through the
/// [`PackageRegistry`](super::PackageRegistry).
///
/// # Examples
///
/// ```
/// use u_dispatch::models::{Deadline, Location, PackageRecord, PackageStatus, time_of_day};
///
/// let p = PackageRecord::new(6, Location::new("3060 Lester St"))
///     .with_deadline(Deadline::By(time_of_day(10, 30)))
///     .with_delay(time_of_day(9, 5));
///
/// assert_eq!(p.status(), PackageStatus::AtHub);
/// assert!(!p.is_eligible(time_of_day(8, 0)));
/// assert!(p.is_eligible(time_of_day(9, 5)));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageRecord {
    id: PackageId,
    location: Location,
    #[serde(default)]
    weight: f64,
    #[serde(default)]
    city: String,
    #[serde(default)]
    zip_code: String,
    #[serde(default)]
    deadline: Deadline,
    #[serde(default)]
    delayed_until: Option<f64>,
    #[serde(default)]
    group_id: Option<u32>,
    #[serde(default)]
    required_vehicle: Option<VehicleId>,
    #[serde(default)]
    address_correction: Option<AddressCorrection>,
    #[serde(default)]
    status: PackageStatus,
    #[serde(default)]
    vehicle_id: Option<VehicleId>,
    #[serde(default)]
    load_time: Option<f64>,
    #[serde(default)]
    delivery_time: Option<f64>,
}

impl PackageRecord {
    /// Creates an unconstrained package at the hub with an end-of-day deadline.
    pub fn new(id: PackageId, location: Location) -> Self {
        Self {
            id,
            location,
            weight: 0.0,
            city: String::new(),
            zip_code: String::new(),
            deadline: Deadline::EndOfDay,
            delayed_until: None,
            group_id: None,
            required_vehicle: None,
            address_correction: None,
            status: PackageStatus::AtHub,
            vehicle_id: None,
            load_time: None,
            delivery_time: None,
        }
    }

    /// Sets the package weight.
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    /// Sets the destination city.
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = city.into();
        self
    }

    /// Sets the destination zip code.
    pub fn with_zip_code(mut self, zip_code: impl Into<String>) -> Self {
        self.zip_code = zip_code.into();
        self
    }

    /// Sets the delivery deadline.
    pub fn with_deadline(mut self, deadline: Deadline) -> Self {
        self.deadline = deadline;
        self
    }

    /// Marks the package as not at the hub before `time`.
    pub fn with_delay(mut self, time: f64) -> Self {
        self.delayed_until = Some(time);
        self
    }

    /// Puts the package in a delivery-together group.
    pub fn with_group(mut self, group_id: u32) -> Self {
        self.group_id = Some(group_id);
        self
    }

    /// Restricts the package to one vehicle.
    pub fn with_required_vehicle(mut self, vehicle_id: VehicleId) -> Self {
        self.required_vehicle = Some(vehicle_id);
        self
    }

    /// Attaches a pending address correction.
    pub fn with_address_correction(mut self, correction: AddressCorrection) -> Self {
        self.address_correction = Some(correction);
        self
    }

    /// Package ID.
    pub fn id(&self) -> PackageId {
        self.id
    }

    /// Address as recorded at ingestion.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Where the package is actually delivered: the corrected address when
    /// one is pending, otherwise the recorded address.
    pub fn destination(&self) -> &Location {
        self.address_correction
            .as_ref()
            .map_or(&self.location, AddressCorrection::location)
    }

    /// Package weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Destination city.
    pub fn city(&self) -> &str {
        &self.city
    }

    /// Destination zip code.
    pub fn zip_code(&self) -> &str {
        &self.zip_code
    }

    /// Delivery deadline.
    pub fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// Time before which the package is not at the hub, if any.
    pub fn delayed_until(&self) -> Option<f64> {
        self.delayed_until
    }

    /// Delivery-together group, if any.
    pub fn group_id(&self) -> Option<u32> {
        self.group_id
    }

    /// Vehicle the package is restricted to, if any.
    pub fn required_vehicle(&self) -> Option<VehicleId> {
        self.required_vehicle
    }

    /// Pending address correction, if any.
    pub fn address_correction(&self) -> Option<&AddressCorrection> {
        self.address_correction.as_ref()
    }

    /// Current lifecycle status.
    pub fn status(&self) -> PackageStatus {
        self.status
    }

    /// Vehicle that carried (or is carrying) the package.
    pub fn vehicle_id(&self) -> Option<VehicleId> {
        self.vehicle_id
    }

    /// Time the package left the hub.
    pub fn load_time(&self) -> Option<f64> {
        self.load_time
    }

    /// Time the package was delivered.
    pub fn delivery_time(&self) -> Option<f64> {
        self.delivery_time
    }

    /// Latest of the delay and address-correction gates.
    pub fn release_time(&self) -> Option<f64> {
        let correction = self.address_correction.as_ref().map(|c| c.available_at);
        match (self.delayed_until, correction) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    /// Returns `true` if the package has not yet reached the hub at `time`.
    pub fn is_delayed_at(&self, time: f64) -> bool {
        self.delayed_until.is_some_and(|t| t > time)
    }

    /// Returns `true` if the package can be delivered at `time`.
    pub fn is_eligible(&self, time: f64) -> bool {
        self.status != PackageStatus::Delivered
            && self.release_time().is_none_or(|t| t <= time)
    }

    /// Returns `true` if the package was delivered after a real deadline.
    pub fn is_late(&self) -> bool {
        self.delivery_time
            .is_some_and(|t| self.deadline.is_missed_at(t))
    }

    /// Status as it would have been reported at `time`, derived from the
    /// recorded load and delivery timestamps.
    pub fn status_at(&self, time: f64) -> PackageStatus {
        let loaded = self.load_time.unwrap_or(f64::INFINITY);
        let delivered = self.delivery_time.unwrap_or(f64::INFINITY);
        if time < loaded {
            PackageStatus::AtHub
        } else if time < delivered {
            PackageStatus::EnRoute
        } else {
            PackageStatus::Delivered
        }
    }

    pub(crate) fn mark_en_route(&mut self, vehicle_id: VehicleId, time: f64) -> Result<()> {
        if self.status != PackageStatus::AtHub {
            return Err(self.invalid_transition(PackageStatus::EnRoute));
        }
        self.status = PackageStatus::EnRoute;
        self.vehicle_id = Some(vehicle_id);
        self.load_time = Some(time);
        Ok(())
    }

    pub(crate) fn mark_delivered(&mut self, time: f64) -> Result<()> {
        if self.status != PackageStatus::EnRoute {
            return Err(self.invalid_transition(PackageStatus::Delivered));
        }
        self.status = PackageStatus::Delivered;
        self.delivery_time = Some(time);
        Ok(())
    }

    fn invalid_transition(&self, to: PackageStatus) -> DispatchError {
        DispatchError::InvalidTransition {
            package_id: self.id,
            from: self.status,
            to,
        }
    }
}
