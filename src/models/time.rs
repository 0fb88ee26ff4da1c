//! Simulated time-of-day values and package deadlines.
//!
//! Time is measured in hours since midnight as `f64`, so travel time is
//! simply `distance / speed` with speed in distance units per hour.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Converts an hour and minute into simulated time (hours since midnight).
///
/// # Examples
///
/// ```
/// use u_dispatch::models::time_of_day;
///
/// assert_eq!(time_of_day(8, 0), 8.0);
/// assert_eq!(time_of_day(10, 30), 10.5);
/// ```
pub fn time_of_day(hour: u32, minute: u32) -> f64 {
    f64::from(hour) + f64::from(minute) / 60.0
}

/// Renders simulated time as `HH:MM`, rounding to the nearest minute.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::{format_time, time_of_day};
///
/// assert_eq!(format_time(time_of_day(9, 5)), "09:05");
/// assert_eq!(format_time(13.75), "13:45");
/// ```
pub fn format_time(time: f64) -> String {
    if !time.is_finite() {
        return "--:--".to_string();
    }
    let minutes = (time * 60.0).round().max(0.0) as u64;
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

/// Latest acceptable delivery time for a package.
///
/// `EndOfDay` is the "no hard deadline" sentinel and orders after every
/// real deadline. Equality and ordering both compare [`as_time`](Self::as_time),
/// so `By(f64::INFINITY)` is equal to `EndOfDay`.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::{Deadline, time_of_day};
///
/// let urgent = Deadline::By(time_of_day(10, 30));
/// assert!(urgent.is_urgent());
/// assert!(urgent < Deadline::EndOfDay);
/// assert!(Deadline::By(9.0) < urgent);
/// ```
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub enum Deadline {
    /// Must be delivered no later than this time.
    By(f64),
    /// No hard deadline.
    #[default]
    EndOfDay,
}

impl Deadline {
    /// Returns `true` for a real (non-sentinel) deadline.
    pub fn is_urgent(&self) -> bool {
        matches!(self, Self::By(_))
    }

    /// Deadline as a time value; `EndOfDay` maps to positive infinity.
    pub fn as_time(&self) -> f64 {
        match self {
            Self::By(t) => *t,
            Self::EndOfDay => f64::INFINITY,
        }
    }

    /// Returns `true` if delivering at `time` misses this deadline.
    pub fn is_missed_at(&self, time: f64) -> bool {
        match self {
            Self::By(t) => time > *t,
            Self::EndOfDay => false,
        }
    }
}

impl PartialEq for Deadline {
    fn eq(&self, other: &Self) -> bool {
        self.as_time().total_cmp(&other.as_time()) == Ordering::Equal
    }
}

impl PartialOrd for Deadline {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.as_time().total_cmp(&other.as_time()))
    }
}

impl std::fmt::Display for Deadline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::By(t) => f.write_str(&format_time(*t)),
            Self::EndOfDay => f.write_str("EOD"),
        }
    }
}
