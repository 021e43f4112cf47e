//! The transmissible form of the registry
//!
//! A registry serializes to a flat mapping of string keys to JSON encoded
//! values, one entry per resource, group, and pending deletion:
//!
//! - `resource/<key>` holds the resource, tagged with its `kind`
//! - `group/<name>` holds the sorted list of member keys
//! - `delete/<key>` holds `true`
//!
//! The mapping is sorted, so equal registries encode identically

use serde_json::Value;

use crate::{
    error::CrmError,
    types::{
        RelationPayload,
        resources::{Resource, ResourceKind},
    },
};

use super::{Crm, Group};

/// The key prefix of resource entries
const RESOURCE_PREFIX: &str = "resource/";
/// The key prefix of group entries
const GROUP_PREFIX: &str = "group/";
/// The key prefix of deletion entries
const DELETE_PREFIX: &str = "delete/";
/// The field of a resource entry holding its kind
const KIND_FIELD: &str = "kind";

impl Crm {
    /// Encode the registry into its wire form
    pub fn to_wire(&self) -> Result<RelationPayload, CrmError> {
        let mut payload = RelationPayload::new();
        for (key, resource) in self.resources.iter() {
            let wire_key = format!("{RESOURCE_PREFIX}{key}");
            let encoded =
                serde_json::to_string(resource).map_err(|e| CrmError::encode(&wire_key, e))?;
            payload.insert(wire_key, encoded);
        }

        for (name, members) in self.groups.iter() {
            let wire_key = format!("{GROUP_PREFIX}{name}");
            let encoded =
                serde_json::to_string(members).map_err(|e| CrmError::encode(&wire_key, e))?;
            payload.insert(wire_key, encoded);
        }

        for key in self.deletions.iter() {
            payload.insert(format!("{DELETE_PREFIX}{key}"), Value::Bool(true).to_string());
        }

        Ok(payload)
    }

    /// Reconstruct a registry from its wire form
    ///
    /// Fails on the first malformed entry, no partially decoded registry is
    /// ever returned
    pub fn from_wire(payload: &RelationPayload) -> Result<Self, CrmError> {
        let mut crm = Crm::new();
        for (wire_key, encoded) in payload.iter() {
            let value: Value =
                serde_json::from_str(encoded).map_err(|e| CrmError::decode(wire_key, e))?;

            if let Some(key) = wire_key.strip_prefix(RESOURCE_PREFIX) {
                let resource = decode_resource(wire_key, value)?;
                if resource.key() != key {
                    let reason = format!("entry describes resource {}", resource.key());
                    return Err(CrmError::decode(wire_key, reason));
                }

                crm.resources.insert(key.to_string(), resource);
            } else if let Some(name) = wire_key.strip_prefix(GROUP_PREFIX) {
                let members: Vec<String> =
                    serde_json::from_value(value).map_err(|e| CrmError::decode(wire_key, e))?;
                crm.set_group(Group::new(name, members));
            } else if let Some(key) = wire_key.strip_prefix(DELETE_PREFIX) {
                if value != Value::Bool(true) {
                    return Err(CrmError::decode(wire_key, "deletion entries must hold `true`"));
                }
                crm.deletions.insert(key.to_string());
            } else {
                return Err(CrmError::decode(wire_key, "unrecognized entry"));
            }
        }

        Ok(crm)
    }

    /// Encode the registry as a JSON object, the form in which it is stored
    /// in local relation data
    pub fn to_json(&self) -> Result<Value, CrmError> {
        let payload = self.to_wire()?;
        let object = payload.into_iter().map(|(k, v)| (k, Value::String(v))).collect();
        Ok(Value::Object(object))
    }

    /// Decode a registry stored as a JSON object
    pub fn from_json(value: &Value) -> Result<Self, CrmError> {
        let object = value.as_object().ok_or_else(|| CrmError::decode("", "expected an object"))?;

        let mut payload = RelationPayload::new();
        for (key, entry) in object.iter() {
            let encoded = entry.as_str().ok_or_else(|| CrmError::decode(key, "expected a string"))?;
            payload.insert(key.clone(), encoded.to_string());
        }

        Self::from_wire(&payload)
    }
}

/// Decode a single resource entry, checking its kind before its shape
fn decode_resource(wire_key: &str, value: Value) -> Result<Resource, CrmError> {
    let kind = value
        .get(KIND_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| CrmError::decode(wire_key, "missing resource kind"))?;
    kind.parse::<ResourceKind>()?;

    let resource: Resource =
        serde_json::from_value(value).map_err(|e| CrmError::decode(wire_key, e))?;
    resource.validate()?;

    Ok(resource)
}

#[cfg(test)]
mod test {
    use crate::types::resources::{DnsEntry, ManagedService, Resource, VirtualIp};

    use super::*;

    /// Build a registry holding one resource of each kind, a deletion, and
    /// the derived groups
    fn mock_crm() -> Crm {
        let mut crm = Crm::new();
        crm.add(VirtualIp::new("neutron", "10.0.0.5", Some("eth0"), Some("24")).unwrap());
        crm.add(VirtualIp::new("neutron", "fd00::5", None, None).unwrap());
        crm.add(Resource::InitService(ManagedService::new("neutron", "haproxy", true)));
        crm.add(Resource::SystemdService(ManagedService::new("neutron", "neutron-server", false)));
        crm.add(DnsEntry::new("neutron", "10.0.0.5", "neutron.example.com", "public"));
        crm.add_delete("res_neutron_old_vip");
        crm
    }

    /// Tests that decoding an encoded registry yields the same registry
    #[test]
    fn test_round_trip() {
        let crm = mock_crm();
        let decoded = Crm::from_wire(&crm.to_wire().unwrap()).unwrap();
        assert_eq!(crm, decoded);

        let decoded = Crm::from_json(&crm.to_json().unwrap()).unwrap();
        assert_eq!(crm, decoded);
    }

    /// Tests that the encoding does not depend on the order of insertion
    #[test]
    fn test_encoding_deterministic() {
        let a = VirtualIp::new("nova", "10.0.0.6", None, None).unwrap();
        let b = VirtualIp::new("nova", "10.0.0.7", Some("eth1"), None).unwrap();
        let dns = DnsEntry::new("nova", "10.0.0.6", "nova.example.com", "admin");

        let mut first = Crm::new();
        first.add(a.clone());
        first.add(dns.clone());
        first.add(b.clone());

        let mut second = Crm::new();
        second.add(b);
        second.add(a);
        second.add(dns);

        let first_json = serde_json::to_string(&first.to_wire().unwrap()).unwrap();
        let second_json = serde_json::to_string(&second.to_wire().unwrap()).unwrap();
        assert_eq!(first_json, second_json);
    }

    /// Tests the shape of the wire entries
    #[test]
    fn test_wire_entries() {
        let mut crm = Crm::new();
        crm.add(Resource::InitService(ManagedService::new("nova", "haproxy", false)));
        crm.add_delete("res_nova_old");

        let wire = crm.to_wire().unwrap();
        assert_eq!(wire.len(), 2);
        assert_eq!(
            wire["resource/res_nova_haproxy"],
            r#"{"kind":"init_service","service":"nova","name":"haproxy","clone":false}"#
        );
        assert_eq!(wire["delete/res_nova_old"], "true");
    }

    /// Tests that malformed JSON is rejected
    #[test]
    fn test_decode_malformed_json() {
        let mut wire = mock_crm().to_wire().unwrap();
        wire.insert("group/grp_neutron_vips".to_string(), "[\"res_a\"".to_string());

        let err = Crm::from_wire(&wire).unwrap_err();
        assert!(matches!(err, CrmError::Decode { key, .. } if key == "group/grp_neutron_vips"));
    }

    /// Tests that an unknown resource kind is rejected explicitly
    #[test]
    fn test_decode_unknown_kind() {
        let mut wire = RelationPayload::new();
        wire.insert(
            "resource/res_nova_fence".to_string(),
            r#"{"kind":"stonith","service":"nova"}"#.to_string(),
        );

        let err = Crm::from_wire(&wire).unwrap_err();
        assert_eq!(err, CrmError::UnrecognizedResourceKind("stonith".to_string()));
    }

    /// Tests that an entry whose key disagrees with its contents is rejected
    #[test]
    fn test_decode_key_mismatch() {
        let mut wire = RelationPayload::new();
        wire.insert(
            "resource/res_nova_other".to_string(),
            r#"{"kind":"init_service","service":"nova","name":"haproxy","clone":true}"#.to_string(),
        );

        assert!(matches!(Crm::from_wire(&wire), Err(CrmError::Decode { .. })));
    }

    /// Tests that a deletion entry holding anything but `true` is rejected
    #[test]
    fn test_decode_deletion_value() {
        let mut wire = RelationPayload::new();
        wire.insert("delete/res_nova_haproxy".to_string(), "false".to_string());

        let err = Crm::from_wire(&wire).unwrap_err();
        assert!(matches!(err, CrmError::Decode { key, .. } if key == "delete/res_nova_haproxy"));
    }

    /// Tests that an unrecognized entry class is rejected
    #[test]
    fn test_decode_unknown_entry() {
        let mut wire = RelationPayload::new();
        wire.insert("colocation/foo".to_string(), "true".to_string());
        assert!(matches!(Crm::from_wire(&wire), Err(CrmError::Decode { .. })));
    }
}
