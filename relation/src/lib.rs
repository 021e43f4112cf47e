//! The requires side of the `hacluster` relation
//!
//! A principal charm declares the virtual IPs, services and DNS records it
//! wants kept highly available; this crate records them in unit-local state,
//! pushes them to the hacluster subordinate when they change, and tracks
//! whether the subordinate reports the cluster as formed

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(clippy::needless_pass_by_value)]

pub mod error;
pub mod hacluster;
pub mod hook_tools;
pub mod lifecycle;
pub mod store;

pub use error::RelationError;
pub use hacluster::HaClusterRequires;
pub use lifecycle::{ConnectionState, RelationEvent};
pub use store::{RelationData, RelationStore};

/// A type alias for the result type of relation operations
pub type Result<T> = std::result::Result<T, RelationError>;
