//! Change detection for relation payloads
//!
//! Writing relation data fires a `relation-changed` hook on the remote side,
//! so re-sending an identical payload is not free. The gate remembers a digest
//! of the last payload seen per topic and reports whether a new payload
//! differs from it

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;
use util::digest::sha256_hex;

use crate::{error::KvError, kv::UnitKv};

/// The key under which the gate persists itself in the unit-local store
pub const CHANGE_GATE_KEY: &str = "data_changed";

/// Remembers the last payload seen per topic
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeGate {
    /// Topic mapped to the digest of the canonical encoding of its last payload
    seen: BTreeMap<String, String>,
}

impl ChangeGate {
    /// Constructor
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the gate from the unit-local store, empty if never stored
    pub fn load<K: UnitKv>(kv: &K) -> Result<Self, KvError> {
        Ok(kv.get_typed(CHANGE_GATE_KEY)?.unwrap_or_default())
    }

    /// Write the gate into the unit-local store
    pub fn store<K: UnitKv>(&self, kv: &mut K) -> Result<(), KvError> {
        kv.set_typed(CHANGE_GATE_KEY, self)
    }

    /// Whether `payload` differs from the last payload seen for `topic`
    ///
    /// Returns `true` the first time a topic is seen and whenever the payload
    /// differs by value, recording the new payload as the last seen one
    pub fn has_changed<T: Serialize>(&mut self, topic: &str, payload: &T) -> Result<bool, KvError> {
        let digest = canonical_digest(payload)?;
        if self.seen.get(topic) == Some(&digest) {
            debug!(topic, "payload unchanged");
            return Ok(false);
        }

        self.seen.insert(topic.to_string(), digest);
        Ok(true)
    }

    /// Forget the last payload seen for `topic`
    pub fn reset(&mut self, topic: &str) {
        self.seen.remove(topic);
    }
}

/// Digest of the canonical JSON encoding of a value
///
/// Going through `serde_json::Value` sorts object keys, so payloads that are
/// equal as mappings hash identically regardless of their container type
fn canonical_digest<T: Serialize>(payload: &T) -> Result<String, KvError> {
    let canonical = serde_json::to_value(payload)?.to_string();
    Ok(sha256_hex(canonical.as_bytes()))
}
