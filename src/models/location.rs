//! Opaque delivery location identifier.

use serde::{Deserialize, Serialize};

/// A canonical address that the distance oracle can resolve.
///
/// The dispatch core only compares and hashes locations; normalizing raw
/// address strings into this form happens during ingestion.
///
/// # Examples
///
/// ```
/// use u_dispatch::models::Location;
///
/// let hub = Location::new("4001 South 700 East");
/// assert_eq!(hub.as_str(), "4001 South 700 East");
/// assert_eq!(hub, Location::from("4001 South 700 East"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Location(String);

impl Location {
    /// Creates a location from its canonical address.
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The canonical address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Location {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

impl From<String> for Location {
    fn from(address: String) -> Self {
        Self(address)
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
