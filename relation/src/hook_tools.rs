//! A relation store backed by the Juju hook tools
//!
//! Remote settings are read and written by invoking `relation-ids`,
//! `relation-list`, `relation-get` and `relation-set`, which are on the
//! `PATH` of every hook. Local settings live in a unit-local store

use std::process::Command;

use serde_json::Value;
use state::UnitKv;
use tracing::{debug, info};

use crate::{
    RelationError, Result,
    store::{RelationData, RelationStore},
};

/// Runs hook tools, abstracted so the store can be exercised without a Juju
/// agent
pub trait HookTools {
    /// Run `tool` with `args`, returning its standard output
    fn run(&self, tool: &str, args: &[String]) -> Result<String>;
}

/// Runs hook tools as child processes
#[derive(Clone, Copy, Debug, Default)]
pub struct ProcessHookTools;

impl HookTools for ProcessHookTools {
    fn run(&self, tool: &str, args: &[String]) -> Result<String> {
        debug!(tool, ?args, "running hook tool");
        let output = Command::new(tool)
            .args(args)
            .output()
            .map_err(|e| RelationError::HookTool(format!("{tool}: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RelationError::HookTool(format!(
                "{tool} exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Render a relation value as a `relation-set` argument value
fn setting_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Parse the JSON output of a hook tool
fn parse_output(tool: &str, output: &str) -> Result<Value> {
    if output.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(output)
        .map_err(|e| RelationError::Parse(format!("unexpected {tool} output: {e}")))
}

/// Parse the JSON list output of `relation-ids` and `relation-list`
fn parse_list(tool: &str, output: &str) -> Result<Vec<String>> {
    match parse_output(tool, output)? {
        Value::Null => Ok(Vec::new()),
        value => serde_json::from_value(value)
            .map_err(|e| RelationError::Parse(format!("unexpected {tool} output: {e}"))),
    }
}

/// A relation store backed by the hook tools
#[derive(Debug)]
pub struct HookToolStore<K: UnitKv, T: HookTools = ProcessHookTools> {
    /// The name of the relation endpoint
    relation_name: String,
    /// The unit-local store holding local settings
    kv: K,
    /// The hook tool runner
    tools: T,
}

impl<K: UnitKv> HookToolStore<K> {
    /// Create a store that invokes the hook tools as child processes
    pub fn new(relation_name: &str, kv: K) -> Self {
        Self::with_tools(relation_name, kv, ProcessHookTools)
    }
}

impl<K: UnitKv, T: HookTools> HookToolStore<K, T> {
    /// Create a store that invokes the hook tools through `tools`
    pub fn with_tools(relation_name: &str, kv: K, tools: T) -> Self {
        Self { relation_name: relation_name.to_string(), kv, tools }
    }

    /// The hook tool runner
    pub fn tools(&self) -> &T {
        &self.tools
    }
}

impl<K: UnitKv, T: HookTools> RelationStore for HookToolStore<K, T> {
    type Kv = K;

    fn relation_name(&self) -> &str {
        &self.relation_name
    }

    fn local(&self) -> &K {
        &self.kv
    }

    fn local_mut(&mut self) -> &mut K {
        &mut self.kv
    }

    fn set_remote(&mut self, data: &RelationData) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        let settings =
            data.iter().map(|(key, value)| format!("{key}={}", setting_value(value))).collect::<Vec<_>>();
        for relation_id in self.relation_ids()? {
            let mut args = vec!["-r".to_string(), relation_id.clone()];
            args.extend(settings.iter().cloned());

            self.tools.run("relation-set", &args)?;
            info!(relation_id, keys = ?data.keys().collect::<Vec<_>>(), "published relation settings");
        }

        Ok(())
    }

    fn get_remote(&self, key: &str, unit: &str, relation_id: &str) -> Result<Option<Value>> {
        let args = ["--format=json", "-r", relation_id, key, unit].map(str::to_string);
        let output = self.tools.run("relation-get", &args)?;

        match parse_output("relation-get", &output)? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    fn relation_ids(&self) -> Result<Vec<String>> {
        let args = ["--format=json".to_string(), self.relation_name.clone()];
        let output = self.tools.run("relation-ids", &args)?;
        parse_list("relation-ids", &output)
    }

    fn related_units(&self, relation_id: &str) -> Result<Vec<String>> {
        let args = ["--format=json", "-r", relation_id].map(str::to_string);
        let output = self.tools.run("relation-list", &args)?;
        parse_list("relation-list", &output)
    }
}

#[cfg(test)]
mod test {
    use std::{cell::RefCell, collections::HashMap};

    use serde_json::json;
    use state::MemoryKv;

    use super::*;

    /// Hook tools answering from canned output and recording invocations
    #[derive(Default)]
    struct FakeHookTools {
        /// Tool name and joined args mapped to the output to return
        outputs: HashMap<String, String>,
        /// The invocations seen so far
        calls: RefCell<Vec<(String, Vec<String>)>>,
    }

    impl FakeHookTools {
        /// Register the output of an invocation
        fn respond(mut self, tool: &str, args: &[&str], output: &str) -> Self {
            self.outputs.insert(format!("{tool} {}", args.join(" ")), output.to_string());
            self
        }
    }

    impl HookTools for FakeHookTools {
        fn run(&self, tool: &str, args: &[String]) -> Result<String> {
            self.calls.borrow_mut().push((tool.to_string(), args.to_vec()));
            let key = format!("{tool} {}", args.join(" "));
            Ok(self.outputs.get(&key).cloned().unwrap_or_default())
        }
    }

    /// Build a store over a fake relation `ha:3` with one subordinate unit
    fn mock_store() -> HookToolStore<MemoryKv, FakeHookTools> {
        let tools = FakeHookTools::default()
            .respond("relation-ids", &["--format=json", "ha"], r#"["ha:3"]"#)
            .respond("relation-list", &["--format=json", "-r", "ha:3"], r#"["hacluster/0"]"#)
            .respond(
                "relation-get",
                &["--format=json", "-r", "ha:3", "clustered", "hacluster/0"],
                "\"yes\"\n",
            );
        HookToolStore::with_tools("ha", MemoryKv::new(), tools)
    }

    /// Tests reading remote settings through the hook tools
    #[test]
    fn test_get_remote_all() {
        let store = mock_store();
        assert_eq!(store.relation_ids().unwrap(), vec!["ha:3"]);
        assert_eq!(store.related_units("ha:3").unwrap(), vec!["hacluster/0"]);
        assert_eq!(store.get_remote_all("clustered").unwrap(), vec![json!("yes")]);

        // Unset keys read back as empty output
        assert!(store.get_remote("missing", "hacluster/0", "ha:3").unwrap().is_none());
        assert!(store.get_remote_all("missing").unwrap().is_empty());
    }

    /// Tests that publishing settings invokes `relation-set` per relation id
    #[test]
    fn test_set_remote() {
        let mut store = mock_store();
        let mut data = RelationData::new();
        data.insert("corosync_bindiface".to_string(), json!("eth0"));
        data.insert("corosync_mcastport".to_string(), json!(4440));
        store.set_remote(&data).unwrap();

        let calls = store.tools().calls.borrow();
        let (tool, args) = calls.last().unwrap();
        assert_eq!(tool, "relation-set");
        assert_eq!(args, &["-r", "ha:3", "corosync_bindiface=eth0", "corosync_mcastport=4440"]);
    }

    /// Tests that no relation ids means nothing is published
    #[test]
    fn test_set_remote_unrelated() {
        let mut store = HookToolStore::with_tools("ha", MemoryKv::new(), FakeHookTools::default());
        let mut data = RelationData::new();
        data.insert("clustered".to_string(), json!(true));
        store.set_remote(&data).unwrap();

        let calls = store.tools().calls.borrow();
        assert!(calls.iter().all(|(tool, _)| tool != "relation-set"));
    }

    /// Tests that local settings are namespaced by relation name
    #[test]
    fn test_local_settings() {
        let mut store = mock_store();
        let mut data = RelationData::new();
        data.insert("resources".to_string(), json!({}));
        store.set_local(&data);

        assert_eq!(store.get_local("resources"), Some(json!({})));
        assert_eq!(store.local().get("relation.ha.resources"), Some(&json!({})));
    }

    /// Tests that garbage tool output is reported
    #[test]
    fn test_unparseable_output() {
        let tools = FakeHookTools::default().respond("relation-ids", &["--format=json", "ha"], "ha:3");
        let store = HookToolStore::with_tools("ha", MemoryKv::new(), tools);
        assert!(matches!(store.relation_ids(), Err(RelationError::Parse(_))));
    }
}
