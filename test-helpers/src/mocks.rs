//! An in-memory relation for exercising the adapter without a Juju agent

use std::collections::BTreeMap;

use relation::{RelationData, RelationStore, Result, store::is_empty_value};
use serde_json::Value;
use state::MemoryKv;

/// Settings published by each remote unit, keyed by unit name
type UnitSettings = BTreeMap<String, RelationData>;

/// An in-memory relation with scripted remote units
#[derive(Clone, Debug, Default)]
pub struct MockRelation {
    /// The name of the relation endpoint
    name: String,
    /// Local settings
    local: MemoryKv,
    /// Remote units and their settings, keyed by relation id
    remote: BTreeMap<String, UnitSettings>,
    /// Every payload delivered to at least one relation id, in order
    published: Vec<RelationData>,
    /// The settings the remote side holds per relation id, with every
    /// delivered payload merged in
    delivered: BTreeMap<String, RelationData>,
    /// The number of times local settings were committed
    commits: usize,
}

impl MockRelation {
    /// Create a relation with no remote units
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), ..Default::default() }
    }

    /// Add a remote unit on the given relation id
    pub fn with_unit(mut self, relation_id: &str, unit: &str) -> Self {
        self.add_unit(relation_id, unit);
        self
    }

    /// Add a remote unit on the given relation id, establishing the relation
    /// if needed
    pub fn add_unit(&mut self, relation_id: &str, unit: &str) {
        self.remote.entry(relation_id.to_string()).or_default().entry(unit.to_string()).or_default();
    }

    /// Remove a relation id together with the settings delivered to it
    pub fn remove_relation(&mut self, relation_id: &str) {
        self.remote.remove(relation_id);
        self.delivered.remove(relation_id);
    }

    /// Set a setting published by a remote unit, adding the unit if needed
    pub fn set_remote_setting(&mut self, relation_id: &str, unit: &str, key: &str, value: Value) {
        self.remote
            .entry(relation_id.to_string())
            .or_default()
            .entry(unit.to_string())
            .or_default()
            .insert(key.to_string(), value);
    }

    /// Remove every remote unit, as after the relation is broken
    pub fn clear_units(&mut self) {
        self.remote.clear();
        self.delivered.clear();
    }

    /// The settings the remote side holds on the given relation id
    pub fn remote_view(&self, relation_id: &str) -> Option<&RelationData> {
        self.delivered.get(relation_id)
    }

    /// Every payload published so far
    pub fn published(&self) -> &[RelationData] {
        &self.published
    }

    /// The most recently published payload
    pub fn last_published(&self) -> Option<&RelationData> {
        self.published.last()
    }

    /// The number of commits of local settings
    pub fn commits(&self) -> usize {
        self.commits
    }
}

impl RelationStore for MockRelation {
    type Kv = MemoryKv;

    fn relation_name(&self) -> &str {
        &self.name
    }

    fn local(&self) -> &MemoryKv {
        &self.local
    }

    fn local_mut(&mut self) -> &mut MemoryKv {
        &mut self.local
    }

    fn set_remote(&mut self, data: &RelationData) -> Result<()> {
        let relation_ids = self.relation_ids()?;
        if relation_ids.is_empty() {
            return Ok(());
        }

        // Settings are merged, and an empty value unsets the key
        for relation_id in relation_ids {
            let view = self.delivered.entry(relation_id).or_default();
            for (key, value) in data.iter() {
                if is_empty_value(value) {
                    view.remove(key);
                } else {
                    view.insert(key.clone(), value.clone());
                }
            }
        }

        self.published.push(data.clone());
        Ok(())
    }

    fn get_remote(&self, key: &str, unit: &str, relation_id: &str) -> Result<Option<Value>> {
        Ok(self.remote.get(relation_id).and_then(|units| units.get(unit)).and_then(|s| s.get(key)).cloned())
    }

    fn relation_ids(&self) -> Result<Vec<String>> {
        Ok(self.remote.keys().cloned().collect())
    }

    fn related_units(&self, relation_id: &str) -> Result<Vec<String>> {
        Ok(self.remote.get(relation_id).map(|units| units.keys().cloned().collect()).unwrap_or_default())
    }

    fn commit(&mut self) -> Result<()> {
        self.commits += 1;
        Ok(())
    }
}
