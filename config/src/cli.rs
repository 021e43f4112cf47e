//! The hook runner CLI and config definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use common::types::DEFAULT_MCASTPORT;
use util::logging::LevelFilter;

// -------
// | CLI |
// -------

/// Defines the hook runner command line interface
#[derive(Debug, Parser)]
#[command(author, about, long_about = None, args_override_self = true)]
#[rustfmt::skip]
pub struct Cli {
    // ---------------
    // | Config File |
    // ---------------
    /// A TOML config file to read options from
    #[clap(long, value_parser)]
    pub config_file: Option<String>,

    // ---------------------
    // | Relation Settings |
    // ---------------------

    /// The name of the relation endpoint the hacluster subordinate is related on
    #[clap(long, value_parser, default_value = "ha", env = "HACLUSTER_RELATION")]
    pub relation_name: String,
    /// The path of the unit-local state file
    #[clap(long, value_parser, default_value = ".hacluster-state.json", env = "HACLUSTER_STATE_PATH")]
    pub state_path: PathBuf,
    /// The network interface corosync binds to
    #[clap(long, value_parser, env = "HACLUSTER_BINDIFACE")]
    pub bind_iface: Option<String>,
    /// The multicast port corosync uses for cluster traffic
    #[clap(long, value_parser, default_value_t = DEFAULT_MCASTPORT, env = "HACLUSTER_MCASTPORT")]
    pub mcastport: u16,

    // -----------
    // | Logging |
    // -----------

    /// The log level, overridden by `RUST_LOG` directives
    #[clap(long, value_parser, default_value = "info", env = "HACLUSTER_LOG_LEVEL")]
    pub log_level: String,
    /// Emit logs as newline delimited JSON
    #[clap(long, value_parser, default_value = "false")]
    pub json_logs: bool,

    /// The operation to run
    #[command(subcommand)]
    pub command: Command,
}

/// The operations the hook runner performs
#[derive(Clone, Debug, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Handle a relation lifecycle hook, e.g. `ha-relation-changed`
    Hook {
        /// The name of the hook, read from the environment when omitted
        #[clap(env = "JUJU_HOOK_NAME")]
        hook_name: String,
    },
    /// Record a virtual IP
    AddVip {
        /// The service the address belongs to
        name: String,
        /// The address
        vip: String,
        /// The interface to bind the address to
        #[clap(long)]
        iface: Option<String>,
        /// The netmask of the address
        #[clap(long)]
        netmask: Option<String>,
    },
    /// Tear down a virtual IP
    RemoveVip {
        /// The service the address belongs to
        name: String,
        /// The address
        vip: String,
        /// The interface the address was bound to
        #[clap(long)]
        iface: Option<String>,
    },
    /// Record a daemon managed through its init script
    AddInitService {
        /// The service the daemon belongs to
        name: String,
        /// The name of the init script
        service: String,
        /// Run the daemon on a single unit rather than on every unit
        #[clap(long)]
        no_clone: bool,
    },
    /// Tear down a daemon managed through its init script
    RemoveInitService {
        /// The service the daemon belongs to
        name: String,
        /// The name of the init script
        service: String,
    },
    /// Record a daemon managed through systemd
    AddSystemdService {
        /// The service the daemon belongs to
        name: String,
        /// The name of the systemd unit
        service: String,
        /// Run the daemon on a single unit rather than on every unit
        #[clap(long)]
        no_clone: bool,
    },
    /// Tear down a daemon managed through systemd
    RemoveSystemdService {
        /// The service the daemon belongs to
        name: String,
        /// The name of the systemd unit
        service: String,
    },
    /// Record a DNS record
    AddDnsha {
        /// The service the record belongs to
        name: String,
        /// The address the record resolves to
        ip: String,
        /// The fully qualified name of the record
        fqdn: String,
        /// The endpoint the record serves
        endpoint_type: String,
    },
    /// Tear down a DNS record
    RemoveDnsha {
        /// The service the record belongs to
        name: String,
        /// The endpoint the record serves
        endpoint_type: String,
    },
    /// Publish the corosync binding and every recorded resource
    BindResources,
    /// Exit successfully iff the subordinate reports the cluster as formed
    IsClustered,
}

// ----------
// | Config |
// ----------

/// The validated runner configuration
#[derive(Clone, Debug)]
pub struct AdapterConfig {
    /// The name of the relation endpoint
    pub relation_name: String,
    /// The path of the unit-local state file
    pub state_path: PathBuf,
    /// The network interface corosync binds to
    pub bind_iface: Option<String>,
    /// The multicast port corosync uses
    pub mcastport: u16,
    /// The log level
    pub log_level: LevelFilter,
    /// Whether logs are emitted as JSON
    pub json_logs: bool,
    /// The operation to run
    pub command: Command,
}
