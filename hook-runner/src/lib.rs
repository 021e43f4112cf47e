//! Dispatches a hook runner command to the hacluster relation adapter

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(unsafe_code)]

use config::{AdapterConfig, Command};
use relation::{HaClusterRequires, RelationEvent, RelationStore, Result};
use tracing::info;

/// The result of running a command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// The command completed
    Done,
    /// The answer to an `is-clustered` query
    Clustered(bool),
}

impl Outcome {
    /// The process exit code for the outcome
    pub fn exit_code(&self) -> i32 {
        match self {
            Outcome::Done | Outcome::Clustered(true) => 0,
            Outcome::Clustered(false) => 1,
        }
    }
}

/// Run the configured command against the adapter
pub fn run_command<R: RelationStore>(
    adapter: &mut HaClusterRequires<R>,
    config: &AdapterConfig,
) -> Result<Outcome> {
    match &config.command {
        Command::Hook { hook_name } => {
            let event = RelationEvent::from_hook_name(&config.relation_name, hook_name)?;
            let state = adapter.handle_event(event)?;
            info!(hook = %hook_name, %state, "handled relation hook");
        },
        Command::AddVip { name, vip, iface, netmask } => {
            adapter.add_vip(name, vip, iface.as_deref(), netmask.as_deref())?
        },
        Command::RemoveVip { name, vip, iface } => adapter.remove_vip(name, vip, iface.as_deref())?,
        Command::AddInitService { name, service, no_clone } => {
            adapter.add_init_service(name, service, !no_clone)?
        },
        Command::RemoveInitService { name, service } => adapter.remove_init_service(name, service)?,
        Command::AddSystemdService { name, service, no_clone } => {
            adapter.add_systemd_service(name, service, !no_clone)?
        },
        Command::RemoveSystemdService { name, service } => {
            adapter.remove_systemd_service(name, service)?
        },
        Command::AddDnsha { name, ip, fqdn, endpoint_type } => {
            adapter.add_dnsha(name, ip, fqdn, endpoint_type)?
        },
        Command::RemoveDnsha { name, endpoint_type } => adapter.remove_dnsha(name, endpoint_type)?,
        Command::BindResources => {
            adapter.bind_resources(config.bind_iface.as_deref(), Some(config.mcastport))?
        },
        Command::IsClustered => return Ok(Outcome::Clustered(adapter.is_clustered()?)),
    }

    Ok(Outcome::Done)
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use eyre::Result;
    use relation::{ConnectionState, hacluster::DEFAULT_MCASTPORT};
    use serde_json::json;
    use test_helpers::{assert_eq_result, assert_true_result, mocks::MockRelation};
    use util::logging::LevelFilter;

    use super::*;

    /// The relation id of the mock relation
    const RELATION_ID: &str = "ha:1";
    /// The subordinate unit of the mock relation
    const HACLUSTER_UNIT: &str = "hacluster/0";

    /// Build a config running the given command
    fn config(command: Command) -> AdapterConfig {
        AdapterConfig {
            relation_name: "ha".to_string(),
            state_path: PathBuf::from(".hacluster-state.json"),
            bind_iface: Some("eth0".to_string()),
            mcastport: DEFAULT_MCASTPORT,
            log_level: LevelFilter::INFO,
            json_logs: false,
            command,
        }
    }

    /// Build an adapter over a relation with a single subordinate unit
    fn mock_adapter() -> HaClusterRequires<MockRelation> {
        let relation = MockRelation::new("ha").with_unit(RELATION_ID, HACLUSTER_UNIT);
        HaClusterRequires::new(relation).unwrap()
    }

    /// Tests that hook commands drive the relation lifecycle
    #[test]
    fn test_hook_command() -> Result<()> {
        let mut adapter = mock_adapter();
        let joined = config(Command::Hook { hook_name: "ha-relation-joined".to_string() });
        assert_eq_result!(run_command(&mut adapter, &joined)?, Outcome::Done)?;
        assert_eq_result!(adapter.state()?, ConnectionState::Connected)?;

        // Hooks of other relations are rejected
        let other = config(Command::Hook { hook_name: "db-relation-joined".to_string() });
        assert_true_result!(run_command(&mut adapter, &other).is_err())
    }

    /// Tests recording resources and publishing them
    #[test]
    fn test_bind_resources_command() -> Result<()> {
        let mut adapter = mock_adapter();
        let add = config(Command::AddInitService {
            name: "nova".to_string(),
            service: "nova-api".to_string(),
            no_clone: false,
        });
        run_command(&mut adapter, &add)?;
        assert_true_result!(adapter.relation().published().is_empty())?;

        run_command(&mut adapter, &config(Command::BindResources))?;
        let payload = adapter.relation().last_published().cloned().unwrap_or_default();
        assert_true_result!(payload.contains_key("json_resources"))?;
        assert_true_result!(payload.contains_key("json_clones"))?;

        let bind = &adapter.relation().published()[0];
        assert_eq_result!(bind.get("corosync_bindiface"), Some(&json!("eth0")))?;
        assert_eq_result!(bind.get("corosync_mcastport"), Some(&json!("4440")))
    }

    /// Tests the exit codes of the clustered query
    #[test]
    fn test_is_clustered_command() -> Result<()> {
        let mut adapter = mock_adapter();
        let query = config(Command::IsClustered);
        let outcome = run_command(&mut adapter, &query)?;
        assert_eq_result!(outcome, Outcome::Clustered(false))?;
        assert_eq_result!(outcome.exit_code(), 1)?;

        adapter.relation_mut().set_remote_setting(RELATION_ID, HACLUSTER_UNIT, "clustered", json!("yes"));
        let outcome = run_command(&mut adapter, &query)?;
        assert_eq_result!(outcome.exit_code(), 0)
    }
}
