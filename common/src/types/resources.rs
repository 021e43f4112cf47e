//! Typed cluster resources and their projection into Pacemaker terms
//!
//! Every resource maps onto exactly one Pacemaker primitive, identified by a
//! canonical key of the form `res_<service>_<disambiguator>[_<suffix>]`. The
//! key is what both sides of the relation use to refer to the resource, so its
//! derivation must stay stable across releases

use std::{
    fmt::{self, Display},
    net::IpAddr,
    str::FromStr,
};

use serde::{Deserialize, Serialize};
use util::digest::short_sha1;

use crate::error::CrmError;

// -------------
// | Constants |
// -------------

/// The prefix of every resource key
pub const RESOURCE_KEY_PREFIX: &str = "res";
/// The prefix of every clone key
pub const CLONE_KEY_PREFIX: &str = "cl";

/// The resource agent managing an IPv4 virtual IP
const IPV4_AGENT: &str = "ocf:heartbeat:IPaddr2";
/// The resource agent managing an IPv6 virtual IP
const IPV6_AGENT: &str = "ocf:heartbeat:IPv6addr";
/// The resource agent managing a DNS record
const DNS_AGENT: &str = "ocf:maas:dns";
/// The monitor operation attached to virtual IPs
const VIP_MONITOR_OP: &str = r#"monitor timeout="20s" interval="10s" depth="0""#;
/// The monitor operation attached to init and systemd services
const SERVICE_MONITOR_OP: &str = r#"monitor interval="5s""#;
/// The meta attributes attached to init and systemd services
const SERVICE_META: &str = r#"migration-threshold="INFINITY" failure-timeout="5s""#;

// ---------------
// | Key Helpers |
// ---------------

/// Pacemaker ids may not contain dashes
fn sanitize(name: &str) -> String {
    name.replace('-', "_")
}

/// The key of a virtual IP resource
///
/// Falls back to a short digest of the address when no interface is given
pub fn vip_key(service: &str, address: &str, interface: Option<&str>) -> String {
    let disambiguator = match interface.filter(|iface| !iface.is_empty()) {
        Some(iface) => iface.to_string(),
        None => short_sha1(address),
    };

    format!("{RESOURCE_KEY_PREFIX}_{service}_{disambiguator}_vip")
}

/// The key of an init or systemd managed service
pub fn service_key(service: &str, name: &str) -> String {
    format!("{RESOURCE_KEY_PREFIX}_{}_{}", sanitize(service), sanitize(name))
}

/// The key of a DNS entry
pub fn dns_key(service: &str, endpoint_type: &str) -> String {
    format!("{RESOURCE_KEY_PREFIX}_{}_{endpoint_type}_hostname", sanitize(service))
}

/// The key of the clone wrapping the given resource
pub fn clone_key(resource_key: &str) -> String {
    format!("{CLONE_KEY_PREFIX}_{resource_key}")
}

// -----------------
// | Resource Kind |
// -----------------

/// The discriminant of a resource, embedded in its serialized form
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A virtual IP address
    VirtualIp,
    /// A service managed through its LSB init script
    InitService,
    /// A service managed through systemd
    SystemdService,
    /// A DNS record pointing at the service
    DnsEntry,
}

impl ResourceKind {
    /// All known resource kinds
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::VirtualIp,
        ResourceKind::InitService,
        ResourceKind::SystemdService,
        ResourceKind::DnsEntry,
    ];

    /// The wire name of the kind
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::VirtualIp => "virtual_ip",
            ResourceKind::InitService => "init_service",
            ResourceKind::SystemdService => "systemd_service",
            ResourceKind::DnsEntry => "dns_entry",
        }
    }

    /// The name of the group that collects a service's resources of this
    /// kind, or `None` if resources of this kind are not grouped
    pub fn group_name(&self, service: &str) -> Option<String> {
        match self {
            ResourceKind::VirtualIp => Some(format!("grp_{service}_vips")),
            ResourceKind::DnsEntry => Some(format!("grp_{service}_hostnames")),
            ResourceKind::InitService | ResourceKind::SystemdService => None,
        }
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = CrmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| CrmError::unrecognized_kind(s))
    }
}

// -------------
// | Resources |
// -------------

/// A virtual IP the cluster fails over between units
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualIp {
    /// The principal service the address belongs to
    pub service: String,
    /// The address itself, kept verbatim as the key derivation hashes it
    pub address: String,
    /// The network interface to bind the address to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,
    /// The netmask of the address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub netmask: Option<String>,
}

impl VirtualIp {
    /// Constructor, rejects addresses that are not IPv4 or IPv6 addresses
    pub fn new(
        service: &str,
        address: &str,
        interface: Option<&str>,
        netmask: Option<&str>,
    ) -> Result<Self, CrmError> {
        let vip = Self {
            service: service.to_string(),
            address: address.to_string(),
            interface: interface.filter(|s| !s.is_empty()).map(str::to_string),
            netmask: netmask.filter(|s| !s.is_empty()).map(str::to_string),
        };
        vip.ip()?;

        Ok(vip)
    }

    /// Parse the address
    pub fn ip(&self) -> Result<IpAddr, CrmError> {
        self.address.parse().map_err(|_| CrmError::InvalidAddress(self.address.clone()))
    }

    /// The canonical key of the resource
    pub fn key(&self) -> String {
        vip_key(&self.service, &self.address, self.interface.as_deref())
    }

    /// The resource agent managing the address
    fn agent(&self) -> &'static str {
        match self.ip() {
            Ok(IpAddr::V6(_)) => IPV6_AGENT,
            _ => IPV4_AGENT,
        }
    }

    /// The agent parameters of the address
    fn params(&self) -> String {
        let mut params = match self.ip() {
            Ok(IpAddr::V6(_)) => format!("ipv6addr={}", self.address),
            _ => format!("ip={}", self.address),
        };

        if let Some(netmask) = &self.netmask {
            params.push_str(&format!(" cidr_netmask={netmask}"));
        }
        if let Some(iface) = &self.interface {
            params.push_str(&format!(" nic={iface}"));
        }

        params
    }
}

/// A daemon the cluster starts, stops and monitors on behalf of a service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagedService {
    /// The principal service the daemon belongs to
    pub service: String,
    /// The name the init system knows the daemon by
    pub name: String,
    /// Whether the daemon runs on every unit rather than on a single one
    pub clone: bool,
}

impl ManagedService {
    /// Constructor
    pub fn new(service: &str, name: &str, clone: bool) -> Self {
        Self { service: service.to_string(), name: name.to_string(), clone }
    }

    /// The canonical key of the resource
    pub fn key(&self) -> String {
        service_key(&self.service, &self.name)
    }
}

/// A DNS record the cluster keeps pointed at the active unit
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsEntry {
    /// The principal service the record belongs to
    pub service: String,
    /// The address the record resolves to
    pub address: String,
    /// The fully qualified name of the record
    pub fqdn: String,
    /// The endpoint the record serves, e.g. public, internal, admin
    pub endpoint_type: String,
}

impl DnsEntry {
    /// Constructor
    pub fn new(service: &str, address: &str, fqdn: &str, endpoint_type: &str) -> Self {
        Self {
            service: service.to_string(),
            address: address.to_string(),
            fqdn: fqdn.to_string(),
            endpoint_type: endpoint_type.to_string(),
        }
    }

    /// The canonical key of the resource
    pub fn key(&self) -> String {
        dns_key(&self.service, &self.endpoint_type)
    }
}

/// A cluster manageable resource
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resource {
    /// A virtual IP
    VirtualIp(VirtualIp),
    /// An LSB init service
    InitService(ManagedService),
    /// A systemd unit
    SystemdService(ManagedService),
    /// A DNS record
    DnsEntry(DnsEntry),
}

impl Resource {
    /// The kind of the resource
    pub fn kind(&self) -> ResourceKind {
        match self {
            Resource::VirtualIp(_) => ResourceKind::VirtualIp,
            Resource::InitService(_) => ResourceKind::InitService,
            Resource::SystemdService(_) => ResourceKind::SystemdService,
            Resource::DnsEntry(_) => ResourceKind::DnsEntry,
        }
    }

    /// The canonical key of the resource
    pub fn key(&self) -> String {
        match self {
            Resource::VirtualIp(vip) => vip.key(),
            Resource::InitService(svc) | Resource::SystemdService(svc) => svc.key(),
            Resource::DnsEntry(dns) => dns.key(),
        }
    }

    /// The principal service the resource belongs to
    pub fn service(&self) -> &str {
        match self {
            Resource::VirtualIp(vip) => &vip.service,
            Resource::InitService(svc) | Resource::SystemdService(svc) => &svc.service,
            Resource::DnsEntry(dns) => &dns.service,
        }
    }

    /// Check invariants that the type system does not enforce
    pub fn validate(&self) -> Result<(), CrmError> {
        match self {
            Resource::VirtualIp(vip) => vip.ip().map(|_| ()),
            _ => Ok(()),
        }
    }

    /// The Pacemaker resource agent managing the resource
    pub fn agent(&self) -> String {
        match self {
            Resource::VirtualIp(vip) => vip.agent().to_string(),
            Resource::InitService(svc) => format!("lsb:{}", svc.name),
            Resource::SystemdService(svc) => format!("systemd:{}", svc.name),
            Resource::DnsEntry(_) => DNS_AGENT.to_string(),
        }
    }

    /// The primitive specification following the agent, in crm shell syntax
    pub fn primitive_spec(&self) -> String {
        match self {
            Resource::VirtualIp(vip) => format!("params {} op {VIP_MONITOR_OP}", vip.params()),
            Resource::InitService(_) | Resource::SystemdService(_) => {
                format!("op {SERVICE_MONITOR_OP} meta {SERVICE_META}")
            },
            Resource::DnsEntry(dns) => {
                format!(r#"params fqdn="{}" ip_address="{}""#, dns.fqdn, dns.address)
            },
        }
    }

    /// The key of the clone wrapping this resource, if it is cloned
    pub fn clone_key(&self) -> Option<String> {
        match self {
            Resource::InitService(svc) | Resource::SystemdService(svc) if svc.clone => {
                Some(clone_key(&svc.key()))
            },
            _ => None,
        }
    }
}

impl From<VirtualIp> for Resource {
    fn from(vip: VirtualIp) -> Self {
        Resource::VirtualIp(vip)
    }
}

impl From<DnsEntry> for Resource {
    fn from(dns: DnsEntry) -> Self {
        Resource::DnsEntry(dns)
    }
}
