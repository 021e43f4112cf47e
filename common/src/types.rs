//! Defines common types that many crates can depend on
pub mod resources;

pub use resources::{DnsEntry, ManagedService, Resource, ResourceKind, VirtualIp};

/// The multicast port corosync uses when the principal does not pick one
pub const DEFAULT_MCASTPORT: u16 = 4440;

/// A type alias for the flat key-value payloads exchanged over a relation
///
/// A `BTreeMap` keeps the keys sorted so that two payloads with the same
/// logical content serialize identically
pub type RelationPayload = std::collections::BTreeMap<String, String>;
