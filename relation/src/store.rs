//! The relation data store
//!
//! A relation exposes two kinds of data: settings local to this unit, which
//! persist across hook invocations, and settings published by or to the
//! remote units on each relation id. The hacluster relation is globally
//! scoped, so local settings are shared across all relation ids

use std::collections::BTreeMap;

use serde_json::Value;
use state::UnitKv;

use crate::Result;

/// A mapping of relation settings
pub type RelationData = BTreeMap<String, Value>;

/// Whether a relation value carries no information
///
/// Relation settings that were never set read back as null or as the empty
/// string depending on the tooling
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Access to the data of one named relation
pub trait RelationStore {
    /// The unit-local store backing local settings
    type Kv: UnitKv;

    /// The name of the relation endpoint, e.g. `ha`
    fn relation_name(&self) -> &str;
    /// The unit-local store
    fn local(&self) -> &Self::Kv;
    /// The unit-local store, mutably
    fn local_mut(&mut self) -> &mut Self::Kv;

    /// Publish settings to every relation id of this relation
    fn set_remote(&mut self, data: &RelationData) -> Result<()>;
    /// Read a setting published by `unit` on `relation_id`
    fn get_remote(&self, key: &str, unit: &str, relation_id: &str) -> Result<Option<Value>>;
    /// The ids of the established relations
    fn relation_ids(&self) -> Result<Vec<String>>;
    /// The remote units on the given relation id
    fn related_units(&self, relation_id: &str) -> Result<Vec<String>>;

    /// The key under which a local setting is stored in the unit-local store
    fn local_key(&self, key: &str) -> String {
        format!("relation.{}.{key}", self.relation_name())
    }

    /// Store settings locally
    fn set_local(&mut self, data: &RelationData) {
        for (key, value) in data.iter() {
            let local_key = self.local_key(key);
            self.local_mut().set(&local_key, value.clone());
        }
    }

    /// Read a local setting
    fn get_local(&self, key: &str) -> Option<Value> {
        self.local().get(&self.local_key(key)).cloned()
    }

    /// All non-empty values published for `key` by any remote unit, without
    /// duplicates, in discovery order
    fn get_remote_all(&self, key: &str) -> Result<Vec<Value>> {
        let mut values: Vec<Value> = Vec::new();
        for relation_id in self.relation_ids()? {
            for unit in self.related_units(&relation_id)? {
                let Some(value) = self.get_remote(key, &unit, &relation_id)? else {
                    continue;
                };

                if is_empty_value(&value) || values.contains(&value) {
                    continue;
                }
                values.push(value);
            }
        }

        Ok(values)
    }

    /// Persist local settings written during this hook
    fn commit(&mut self) -> Result<()> {
        self.local_mut().flush().map_err(Into::into)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::is_empty_value;

    /// Tests which relation values count as empty
    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(&json!(null)));
        assert!(is_empty_value(&json!("")));
        assert!(!is_empty_value(&json!(false)));
        assert!(!is_empty_value(&json!("no")));
    }
}
