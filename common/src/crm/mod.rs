//! The resource registry handed to the hacluster subordinate
//!
//! The registry accumulates typed resources keyed by their canonical key,
//! named groups of resource keys, and pending deletions. All collections are
//! ordered so that two registries with the same logical content serialize to
//! byte-identical payloads regardless of the order in which they were built

use std::collections::{BTreeMap, BTreeSet};

use itertools::Itertools;
use tracing::debug;

use crate::types::resources::{Resource, ResourceKind};

pub mod render;
pub mod wire;

pub use render::CrmConfig;

/// A named, ordered set of resource keys managed together
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Group {
    /// The name of the group
    pub name: String,
    /// The sorted keys of the member resources
    pub members: Vec<String>,
}

impl Group {
    /// Constructor, sorts and deduplicates the members
    pub fn new<I, S>(name: &str, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members = members.into_iter().map(Into::<String>::into).sorted().dedup().collect();
        Self { name: name.to_string(), members }
    }
}

/// Recompute the group collecting `service`'s resources of the given kind
///
/// The group is rebuilt from scratch out of the registry's current contents,
/// so repeated calls over the same registry always agree. Returns `None` for
/// kinds that are not grouped or when the service has no such resources
pub fn regroup(crm: &Crm, kind: ResourceKind, service: &str) -> Option<Group> {
    let name = kind.group_name(service)?;
    let members = crm
        .resources
        .iter()
        .filter(|(_, res)| res.kind() == kind && res.service() == service)
        .map(|(key, _)| key.clone())
        .collect_vec();

    if members.is_empty() {
        return None;
    }

    Some(Group::new(&name, members))
}

/// The resource registry
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Crm {
    /// The live resources, keyed by canonical key
    pub(crate) resources: BTreeMap<String, Resource>,
    /// The groups, keyed by name, members sorted
    pub(crate) groups: BTreeMap<String, Vec<String>>,
    /// Keys of resources the cluster should tear down
    pub(crate) deletions: BTreeSet<String>,
}

impl Crm {
    /// Constructor
    pub fn new() -> Self {
        Self::default()
    }

    // -----------
    // | Getters |
    // -----------

    /// Whether the registry holds no resources, groups, or deletions
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && self.groups.is_empty() && self.deletions.is_empty()
    }

    /// Get the resource with the given key
    pub fn get(&self, key: &str) -> Option<&Resource> {
        self.resources.get(key)
    }

    /// Whether a live resource with the given key exists
    pub fn contains(&self, key: &str) -> bool {
        self.resources.contains_key(key)
    }

    /// The live resources, ordered by key
    pub fn resources(&self) -> impl Iterator<Item = (&String, &Resource)> {
        self.resources.iter()
    }

    /// The members of the given group
    pub fn group_members(&self, name: &str) -> Option<&[String]> {
        self.groups.get(name).map(Vec::as_slice)
    }

    /// The groups, ordered by name
    pub fn groups(&self) -> impl Iterator<Item = (&String, &Vec<String>)> {
        self.groups.iter()
    }

    /// The pending deletions, ordered by key
    pub fn deletions(&self) -> impl Iterator<Item = &String> {
        self.deletions.iter()
    }

    // -----------
    // | Setters |
    // -----------

    /// Insert or overwrite a resource by its canonical key
    ///
    /// Re-adding a resource cancels any pending deletion of it. Adding a
    /// grouped kind (virtual IPs, DNS entries) recomputes its service's group
    pub fn add(&mut self, resource: impl Into<Resource>) {
        let resource = resource.into();
        let key = resource.key();
        let (kind, service) = (resource.kind(), resource.service().to_string());

        self.deletions.remove(&key);
        if let Some(clone) = resource.clone_key() {
            self.deletions.remove(&clone);
        }
        self.resources.insert(key, resource);

        if let Some(group) = regroup(self, kind, &service) {
            debug!(group = %group.name, members = ?group.members, "regrouped resources");
            self.set_group(group);
        }
    }

    /// Record that the resource with the given key should be torn down
    ///
    /// The resource need not be known to the registry. A known resource is
    /// dropped from the live set and from every group, groups left empty are
    /// dropped, and the clone of a cloned service is torn down with it
    pub fn add_delete(&mut self, key: &str) {
        if let Some(resource) = self.resources.remove(key) {
            if let Some(clone) = resource.clone_key() {
                self.deletions.insert(clone);
            }
        }

        for members in self.groups.values_mut() {
            members.retain(|member| member != key);
        }
        self.groups.retain(|_, members| !members.is_empty());

        self.deletions.insert(key.to_string());
    }

    /// Create or overwrite a group with the given members
    pub fn group<I, S>(&mut self, name: &str, members: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_group(Group::new(name, members));
    }

    /// Create or overwrite a group
    pub fn set_group(&mut self, group: Group) {
        self.groups.insert(group.name, group.members);
    }
}
