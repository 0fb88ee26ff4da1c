//! Package-to-vehicle assignment ahead of dispatch.
//!
//! - [`assign_packages`] — four-pass constraint-aware placement, all or nothing
//! - [`collect_groups`] — derives delivery-together groups from records

mod assigner;
mod groups;

pub use assigner::{assign_packages, Assignment};
pub use groups::{collect_groups, Group};
