//! Projection of the registry into the Pacemaker configuration consumed by
//! the hacluster subordinate
//!
//! The subordinate reads one relation key per configuration section, each
//! holding a JSON document, e.g. `json_resources` maps resource keys to their
//! agents and `json_groups` maps group names to space separated members

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::{
    error::CrmError,
    types::{RelationPayload, resources::Resource},
};

use super::Crm;

/// The prefix of every relation key carrying a configuration section
pub const SECTION_KEY_PREFIX: &str = "json_";

/// The Pacemaker configuration for a set of resources
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CrmConfig {
    /// Primitive keys mapped to their resource agents
    pub resources: BTreeMap<String, String>,
    /// Primitive keys mapped to their params, op and meta specification
    pub resource_params: BTreeMap<String, String>,
    /// Group names mapped to their space separated members
    pub groups: BTreeMap<String, String>,
    /// Clone keys mapped to the primitive they clone
    pub clones: BTreeMap<String, String>,
    /// Daemons managed through their init scripts
    pub init_services: BTreeSet<String>,
    /// Daemons managed through systemd
    pub systemd_services: BTreeSet<String>,
    /// Resources the cluster should tear down
    pub delete_resources: BTreeSet<String>,
}

impl Crm {
    /// Render the registry as a Pacemaker configuration
    pub fn render(&self) -> CrmConfig {
        let mut config = CrmConfig::default();
        for (key, resource) in self.resources.iter() {
            config.resources.insert(key.clone(), resource.agent());
            config.resource_params.insert(key.clone(), resource.primitive_spec());

            if let Some(clone) = resource.clone_key() {
                config.clones.insert(clone, key.clone());
            }

            match resource {
                Resource::InitService(svc) => {
                    config.init_services.insert(svc.name.clone());
                },
                Resource::SystemdService(svc) => {
                    config.systemd_services.insert(svc.name.clone());
                },
                Resource::VirtualIp(_) | Resource::DnsEntry(_) => {},
            }
        }

        for (name, members) in self.groups.iter() {
            config.groups.insert(name.clone(), members.join(" "));
        }
        config.delete_resources = self.deletions.clone();

        config
    }
}

impl CrmConfig {
    /// Encode the configuration as relation data, one `json_<section>` key
    /// per section
    ///
    /// Relation settings are merged on the remote side, so an empty section
    /// is sent as an empty value to clear what was published for it before
    pub fn to_relation_data(&self) -> Result<RelationPayload, CrmError> {
        let mut payload = RelationPayload::new();
        insert_section(&mut payload, "resources", &self.resources)?;
        insert_section(&mut payload, "resource_params", &self.resource_params)?;
        insert_section(&mut payload, "groups", &self.groups)?;
        insert_section(&mut payload, "clones", &self.clones)?;
        insert_section(&mut payload, "init_services", &self.init_services)?;
        insert_section(&mut payload, "systemd_services", &self.systemd_services)?;
        insert_section(&mut payload, "delete_resources", &self.delete_resources)?;

        Ok(payload)
    }
}

/// A configuration section that may be empty
trait Section: Serialize {
    /// Whether the section holds no entries
    fn is_empty_section(&self) -> bool;
}

impl<V: Serialize> Section for BTreeMap<String, V> {
    fn is_empty_section(&self) -> bool {
        self.is_empty()
    }
}

impl Section for BTreeSet<String> {
    fn is_empty_section(&self) -> bool {
        self.is_empty()
    }
}

/// Insert a section into the payload, as an empty value when it has no entries
fn insert_section<S: Section>(
    payload: &mut RelationPayload,
    name: &str,
    section: &S,
) -> Result<(), CrmError> {
    let key = format!("{SECTION_KEY_PREFIX}{name}");
    let encoded = if section.is_empty_section() {
        String::new()
    } else {
        serde_json::to_string(section).map_err(|e| CrmError::encode(&key, e))?
    };
    payload.insert(key, encoded);
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::types::resources::{DnsEntry, ManagedService, Resource, VirtualIp};

    use super::*;

    /// Tests rendering a registry holding every kind of resource
    #[test]
    fn test_render() {
        let mut crm = Crm::new();
        crm.add(VirtualIp::new("nova", "10.0.0.6", Some("eth0"), None).unwrap());
        crm.add(Resource::InitService(ManagedService::new("nova", "haproxy", true)));
        crm.add(Resource::SystemdService(ManagedService::new("nova", "memcached", false)));
        crm.add(DnsEntry::new("nova", "10.0.0.6", "nova.example.com", "public"));
        crm.add_delete("res_nova_old_vip");

        let config = crm.render();
        assert_eq!(config.resources["res_nova_eth0_vip"], "ocf:heartbeat:IPaddr2");
        assert_eq!(config.resources["res_nova_haproxy"], "lsb:haproxy");
        assert_eq!(config.resources["res_nova_memcached"], "systemd:memcached");
        assert_eq!(config.resources["res_nova_public_hostname"], "ocf:maas:dns");
        assert_eq!(config.clones["cl_res_nova_haproxy"], "res_nova_haproxy");
        assert_eq!(config.clones.len(), 1);
        assert_eq!(config.groups["grp_nova_vips"], "res_nova_eth0_vip");
        assert_eq!(config.groups["grp_nova_hostnames"], "res_nova_public_hostname");
        assert!(config.init_services.contains("haproxy"));
        assert!(config.systemd_services.contains("memcached"));
        assert!(config.delete_resources.contains("res_nova_old_vip"));
    }

    /// Tests that every section is emitted, empty ones as empty values
    #[test]
    fn test_relation_data() {
        let mut crm = Crm::new();
        crm.add(Resource::InitService(ManagedService::new("nova", "haproxy", false)));

        let data = crm.render().to_relation_data().unwrap();
        let keys: Vec<_> = data.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                "json_clones",
                "json_delete_resources",
                "json_groups",
                "json_init_services",
                "json_resource_params",
                "json_resources",
                "json_systemd_services",
            ]
        );
        assert_eq!(data["json_resources"], r#"{"res_nova_haproxy":"lsb:haproxy"}"#);
        assert_eq!(data["json_init_services"], r#"["haproxy"]"#);
        assert_eq!(data["json_groups"], "");
        assert_eq!(data["json_clones"], "");
    }

    /// Tests that an empty registry renders only empty sections
    #[test]
    fn test_empty_relation_data() {
        let data = Crm::new().render().to_relation_data().unwrap();
        assert_eq!(data.len(), 7);
        assert!(data.values().all(String::is_empty));
    }
}
