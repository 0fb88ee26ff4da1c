//! Distance lookup between delivery locations.
//!
//! [`DistanceOracle`] is the seam the dispatch core consumes;
//! [`DistanceMatrix`] is the in-memory implementation.

mod matrix;

pub use matrix::DistanceMatrix;

use crate::error::Result;
use crate::models::Location;

/// Resolves travel distance between two locations.
///
/// Implementations must be symmetric and must report an unknown location
/// as [`DispatchError::LocationNotFound`](crate::error::DispatchError::LocationNotFound)
/// rather than returning a default distance.
pub trait DistanceOracle {
    /// Non-negative distance between `from` and `to`.
    fn distance(&self, from: &Location, to: &Location) -> Result<f64>;
}

impl<T: DistanceOracle + ?Sized> DistanceOracle for &T {
    fn distance(&self, from: &Location, to: &Location) -> Result<f64> {
        (**self).distance(from, to)
    }
}
