//! The adapter through which a principal charm talks to the hacluster
//! subordinate
//!
//! Every registry operation is a read-modify-write of the registry stored in
//! local relation settings; nothing is published until the principal calls
//! `bind_resources` (or `manage_resources`), and then only if the rendered
//! configuration differs from what was last published

use common::{
    Crm,
    types::resources::{DnsEntry, ManagedService, Resource, VirtualIp, dns_key, service_key, vip_key},
};
use serde_json::Value;
use state::{ChangeGate, KvError};
use tracing::{debug, info, instrument, warn};
use util::err_str;

use crate::{
    Result,
    lifecycle::{ConnectionState, RelationEvent, first_clustered, transition},
    store::{RelationData, RelationStore, is_empty_value},
};

// -------------
// | Constants |
// -------------

pub use common::types::DEFAULT_MCASTPORT;

/// The change-detection topic of the corosync binding settings
const BIND_ON_TOPIC: &str = "hacluster-bind_on";
/// The change-detection topic of the resource configuration
const MANAGE_RESOURCES_TOPIC: &str = "hacluster-manage_resources";

/// The local setting holding the resource registry
const RESOURCES_KEY: &str = "resources";
/// The local setting holding the connection state
const CONNECTION_STATE_KEY: &str = "connection_state";
/// The remote setting signalling that the cluster has formed
const CLUSTERED_KEY: &str = "clustered";
/// The setting naming the interface corosync binds to
const BIND_IFACE_KEY: &str = "corosync_bindiface";
/// The setting naming the multicast port corosync uses
const MCASTPORT_KEY: &str = "corosync_mcastport";

// -----------
// | Adapter |
// -----------

/// The requires side of the hacluster relation
pub struct HaClusterRequires<R: RelationStore> {
    /// The relation data store
    relation: R,
    /// The change-detection gate guarding relation writes
    gate: ChangeGate,
}

impl<R: RelationStore> HaClusterRequires<R> {
    /// Constructor, loads the change-detection gate from unit-local state
    pub fn new(relation: R) -> Result<Self> {
        let gate = ChangeGate::load(relation.local())?;
        Ok(Self { relation, gate })
    }

    /// The underlying relation store
    pub fn relation(&self) -> &R {
        &self.relation
    }

    /// The underlying relation store, mutably
    pub fn relation_mut(&mut self) -> &mut R {
        &mut self.relation
    }

    /// Consume the adapter, returning the relation store
    pub fn into_relation(self) -> R {
        self.relation
    }

    /// Persist the gate and all local settings written so far
    fn commit(&mut self) -> Result<()> {
        self.gate.store(self.relation.local_mut())?;
        self.relation.commit()
    }

    /// Write settings both locally and to the remote units
    fn publish(&mut self, data: &RelationData) -> Result<()> {
        self.relation.set_local(data);
        self.relation.set_remote(data)
    }

    /// Publish settings unless they match the ones last published under
    /// `topic`
    ///
    /// The gate is left untouched while no relation is established, so the
    /// settings are sent once the subordinate joins
    fn publish_if_changed(&mut self, topic: &str, data: &RelationData) -> Result<()> {
        if self.relation.relation_ids()?.is_empty() {
            debug!(topic, "relation not established, deferring publish");
            return Ok(());
        }

        if self.gate.has_changed(topic, data)? {
            self.publish(data)?;
        } else {
            debug!(topic, "settings unchanged, skipping publish");
        }
        Ok(())
    }

    // -------------
    // | Lifecycle |
    // -------------

    /// The current connection state
    pub fn state(&self) -> Result<ConnectionState> {
        match self.relation.get_local(CONNECTION_STATE_KEY) {
            Some(value) => Ok(serde_json::from_value(value).map_err(err_str!(KvError::Serde))?),
            None => Ok(ConnectionState::Disconnected),
        }
    }

    /// Handle a relation lifecycle event, returning the new state
    #[instrument(name = "handle_relation_event", skip_all, err, fields(%event))]
    pub fn handle_event(&mut self, event: RelationEvent) -> Result<ConnectionState> {
        let prev = self.state()?;
        let clustered = match event {
            RelationEvent::Changed => self.is_clustered()?,
            _ => false,
        };

        let next = transition(prev, event, clustered);
        if next != prev {
            info!(from = %prev, to = %next, "hacluster relation state changed");
        }

        // A relation that is joined again must be sent everything afresh
        if matches!(event, RelationEvent::Departed | RelationEvent::Broken) {
            self.gate.reset(BIND_ON_TOPIC);
            self.gate.reset(MANAGE_RESOURCES_TOPIC);
        }

        let encoded = serde_json::to_value(next).map_err(err_str!(KvError::Serde))?;
        let mut data = RelationData::new();
        data.insert(CONNECTION_STATE_KEY.to_string(), encoded);
        self.relation.set_local(&data);
        self.commit()?;

        Ok(next)
    }

    /// Whether the subordinate reports the cluster as formed
    ///
    /// Missing or empty remote values read as not clustered
    pub fn is_clustered(&self) -> Result<bool> {
        let values = self.relation.get_remote_all(CLUSTERED_KEY)?;
        if values.len() > 1 {
            warn!(?values, "multiple hacluster units published `clustered`, using the first");
        }

        Ok(first_clustered(&values))
    }

    // -----------------------
    // | Publishing Settings |
    // -----------------------

    /// Tell the subordinate which interface and multicast port corosync
    /// should use
    ///
    /// Settings that are absent are left untouched; nothing is written if the
    /// settings match the ones last published
    pub fn bind_on(&mut self, iface: Option<&str>, mcastport: Option<u16>) -> Result<()> {
        let mut data = RelationData::new();
        if let Some(iface) = iface.filter(|iface| !iface.is_empty()) {
            data.insert(BIND_IFACE_KEY.to_string(), Value::String(iface.to_string()));
        }
        if let Some(port) = mcastport.filter(|port| *port != 0) {
            data.insert(MCASTPORT_KEY.to_string(), Value::String(port.to_string()));
        }

        if data.is_empty() {
            return Ok(());
        }

        self.publish_if_changed(BIND_ON_TOPIC, &data)?;
        self.commit()
    }

    /// Ask the subordinate to manage the resources in `crm`
    ///
    /// Every configuration section is sent, empty ones as empty values so the
    /// subordinate drops what it held for them. Nothing is written if the
    /// rendered configuration matches the one last published
    pub fn manage_resources(&mut self, crm: &Crm) -> Result<()> {
        let data: RelationData = crm
            .render()
            .to_relation_data()?
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();

        if data.values().all(is_empty_value) {
            return Ok(());
        }

        self.publish_if_changed(MANAGE_RESOURCES_TOPIC, &data)?;
        self.commit()
    }

    /// Publish the corosync binding and every resource recorded so far
    ///
    /// The multicast port defaults to `DEFAULT_MCASTPORT`
    #[instrument(name = "bind_resources", skip_all, err)]
    pub fn bind_resources(&mut self, iface: Option<&str>, mcastport: Option<u16>) -> Result<()> {
        self.bind_on(iface, Some(mcastport.unwrap_or(DEFAULT_MCASTPORT)))?;

        let crm = self.resources()?;
        if !crm.is_empty() {
            self.manage_resources(&crm)?;
        }

        Ok(())
    }

    // ---------------------
    // | Resource Registry |
    // ---------------------

    /// The registry recorded in local settings
    pub fn resources(&self) -> Result<Crm> {
        match self.relation.get_local(RESOURCES_KEY) {
            Some(value) if !value.is_null() => Ok(Crm::from_json(&value)?),
            _ => Ok(Crm::new()),
        }
    }

    /// Apply `update` to the recorded registry and record the result
    fn update_resources<F>(&mut self, update: F) -> Result<()>
    where
        F: FnOnce(&mut Crm),
    {
        let mut crm = self.resources()?;
        update(&mut crm);

        let mut data = RelationData::new();
        data.insert(RESOURCES_KEY.to_string(), crm.to_json()?);
        self.relation.set_local(&data);
        self.commit()
    }

    /// Record a resource
    fn add_resource(&mut self, resource: Resource) -> Result<()> {
        info!(key = %resource.key(), kind = %resource.kind(), "recording hacluster resource");
        self.update_resources(|crm| crm.add(resource))
    }

    /// Record that the resource with the given key should be torn down
    pub fn delete_resource(&mut self, key: &str) -> Result<()> {
        info!(key, "recording hacluster resource deletion");
        self.update_resources(|crm| crm.add_delete(key))
    }

    /// Record a virtual IP for the service `name`
    pub fn add_vip(
        &mut self,
        name: &str,
        vip: &str,
        iface: Option<&str>,
        netmask: Option<&str>,
    ) -> Result<()> {
        let vip = VirtualIp::new(name, vip, iface, netmask)?;
        self.add_resource(Resource::VirtualIp(vip))
    }

    /// Tear down a virtual IP of the service `name`
    pub fn remove_vip(&mut self, name: &str, vip: &str, iface: Option<&str>) -> Result<()> {
        self.delete_resource(&vip_key(name, vip, iface))
    }

    /// Record an init script managed daemon for the service `name`
    pub fn add_init_service(&mut self, name: &str, service: &str, clone: bool) -> Result<()> {
        self.add_resource(Resource::InitService(ManagedService::new(name, service, clone)))
    }

    /// Tear down an init script managed daemon of the service `name`
    pub fn remove_init_service(&mut self, name: &str, service: &str) -> Result<()> {
        self.delete_resource(&service_key(name, service))
    }

    /// Record a systemd managed daemon for the service `name`
    pub fn add_systemd_service(&mut self, name: &str, service: &str, clone: bool) -> Result<()> {
        self.add_resource(Resource::SystemdService(ManagedService::new(name, service, clone)))
    }

    /// Tear down a systemd managed daemon of the service `name`
    pub fn remove_systemd_service(&mut self, name: &str, service: &str) -> Result<()> {
        self.delete_resource(&service_key(name, service))
    }

    /// Record a DNS record for the given endpoint of the service `name`
    pub fn add_dnsha(&mut self, name: &str, ip: &str, fqdn: &str, endpoint_type: &str) -> Result<()> {
        self.add_resource(Resource::DnsEntry(DnsEntry::new(name, ip, fqdn, endpoint_type)))
    }

    /// Tear down the DNS record for the given endpoint of the service `name`
    pub fn remove_dnsha(&mut self, name: &str, endpoint_type: &str) -> Result<()> {
        self.delete_resource(&dns_key(name, endpoint_type))
    }
}
