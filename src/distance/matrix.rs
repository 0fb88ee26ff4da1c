//! Symmetric distance matrix keyed by location.

use std::collections::HashMap;

use super::DistanceOracle;
use crate::error::{DispatchError, Result};
use crate::models::Location;

/// A symmetric distance matrix stored in packed lower-triangular form.
///
/// Lookups accept either argument order. Unknown locations fail with
/// [`DispatchError::LocationNotFound`] instead of defaulting to zero.
///
/// # Examples
///
/// ```
/// use u_dispatch::distance::{DistanceMatrix, DistanceOracle};
/// use u_dispatch::models::Location;
///
/// let hub = Location::new("hub");
/// let a = Location::new("a");
/// let b = Location::new("b");
/// let dm = DistanceMatrix::from_lower_triangular(
///     vec![hub.clone(), a.clone(), b.clone()],
///     vec![vec![0.0], vec![7.2, 0.0], vec![3.8, 7.1, 0.0]],
/// ).unwrap();
///
/// assert_eq!(dm.distance(&a, &b).unwrap(), 7.1);
/// assert_eq!(dm.distance(&b, &a).unwrap(), 7.1);
/// assert!(dm.distance(&hub, &Location::new("nowhere")).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    locations: Vec<Location>,
    index: HashMap<Location, usize>,
    data: Vec<f64>,
}

/// Packed offset of the unordered pair `(i, j)`.
fn packed(i: usize, j: usize) -> usize {
    let (row, col) = if i >= j { (i, j) } else { (j, i) };
    row * (row + 1) / 2 + col
}

impl DistanceMatrix {
    /// Creates a matrix over the given locations, initialized to zero.
    pub fn new(locations: Vec<Location>) -> Result<Self> {
        let mut index = HashMap::with_capacity(locations.len());
        for (i, location) in locations.iter().enumerate() {
            if index.insert(location.clone(), i).is_some() {
                return Err(DispatchError::DuplicateLocation {
                    location: location.clone(),
                });
            }
        }
        let n = locations.len();
        Ok(Self {
            locations,
            index,
            data: vec![0.0; n * (n + 1) / 2],
        })
    }

    /// Builds a matrix from lower-triangular rows.
    ///
    /// Row `i` must hold at least `i + 1` entries: the distances from
    /// location `i` to locations `0..=i`. Entries past the diagonal are
    /// ignored, which is how exported distance tables usually look.
    pub fn from_lower_triangular(locations: Vec<Location>, rows: Vec<Vec<f64>>) -> Result<Self> {
        if rows.len() != locations.len() {
            return Err(DispatchError::MalformedMatrix {
                reason: format!(
                    "{} rows for {} locations",
                    rows.len(),
                    locations.len()
                ),
            });
        }
        let mut dm = Self::new(locations)?;
        for (i, row) in rows.iter().enumerate() {
            if row.len() < i + 1 {
                return Err(DispatchError::MalformedMatrix {
                    reason: format!("row {i} has {} entries, expected {}", row.len(), i + 1),
                });
            }
            for (j, &d) in row.iter().take(i + 1).enumerate() {
                dm.set_by_index(i, j, d)?;
            }
        }
        Ok(dm)
    }

    /// Returns the distance between two location indices.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        assert!(from < self.size() && to < self.size(), "index out of bounds");
        self.data[packed(from, to)]
    }

    /// Sets the distance between two location indices (both directions).
    ///
    /// # Errors
    ///
    /// [`DispatchError::MalformedMatrix`] for an index outside the table and
    /// [`DispatchError::InvalidDistance`] for a negative or non-finite value.
    pub fn set_by_index(&mut self, from: usize, to: usize, distance: f64) -> Result<()> {
        let size = self.size();
        if from >= size || to >= size {
            return Err(DispatchError::MalformedMatrix {
                reason: format!("index ({from}, {to}) outside a {size}-location table"),
            });
        }
        if !distance.is_finite() || distance < 0.0 {
            return Err(DispatchError::InvalidDistance {
                from: self.locations[from].clone(),
                to: self.locations[to].clone(),
                value: distance,
            });
        }
        self.data[packed(from, to)] = distance;
        Ok(())
    }

    /// Sets the distance between two locations (both directions).
    pub fn set(&mut self, from: &Location, to: &Location, distance: f64) -> Result<()> {
        let i = self.resolve(from)?;
        let j = self.resolve(to)?;
        self.set_by_index(i, j, distance)
    }

    /// Index of a location, if present.
    pub fn index_of(&self, location: &Location) -> Option<usize> {
        self.index.get(location).copied()
    }

    fn resolve(&self, location: &Location) -> Result<usize> {
        self.index_of(location)
            .ok_or_else(|| DispatchError::LocationNotFound {
                location: location.clone(),
            })
    }

    /// Locations in index order.
    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Number of locations in this matrix.
    pub fn size(&self) -> usize {
        self.locations.len()
    }

    /// Returns the nearest of `candidates` to `from`.
    ///
    /// Ties keep the earlier candidate. Returns `Ok(None)` if `candidates`
    /// is empty.
    pub fn nearest<'c>(
        &self,
        from: &Location,
        candidates: &'c [Location],
    ) -> Result<Option<&'c Location>> {
        let mut best: Option<(&Location, f64)> = None;
        for candidate in candidates {
            let d = self.distance(from, candidate)?;
            if best.is_none_or(|(_, best_d)| d < best_d) {
                best = Some((candidate, d));
            }
        }
        Ok(best.map(|(location, _)| location))
    }
}

impl DistanceOracle for DistanceMatrix {
    fn distance(&self, from: &Location, to: &Location) -> Result<f64> {
        let i = self.resolve(from)?;
        let j = self.resolve(to)?;
        Ok(self.data[packed(i, j)])
    }
}
