//! The connection lifecycle of the relation
//!
//! The lifecycle is level triggered: every `relation-changed` delivery
//! re-reads the remote `clustered` signal and settles the state accordingly

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{RelationError, store::is_empty_value};

/// The state of the connection to the hacluster subordinate
///
/// `Available` implies `Connected`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No relation is established
    #[default]
    Disconnected,
    /// The relation is established but the cluster has not formed
    Connected,
    /// The subordinate reports the cluster as formed
    Available,
}

impl ConnectionState {
    /// Whether the relation is established
    pub fn is_connected(&self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }

    /// Whether the cluster is available
    pub fn is_available(&self) -> bool {
        matches!(self, ConnectionState::Available)
    }
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Available => "available",
        };
        write!(f, "{name}")
    }
}

/// A relation lifecycle event
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelationEvent {
    /// A remote unit joined the relation
    Joined,
    /// A remote unit changed its settings
    Changed,
    /// A remote unit left the relation
    Departed,
    /// The relation was removed
    Broken,
}

impl RelationEvent {
    /// All lifecycle events
    pub const ALL: [RelationEvent; 4] =
        [RelationEvent::Joined, RelationEvent::Changed, RelationEvent::Departed, RelationEvent::Broken];

    /// The suffix of the hook name delivering the event
    fn suffix(&self) -> &'static str {
        match self {
            RelationEvent::Joined => "joined",
            RelationEvent::Changed => "changed",
            RelationEvent::Departed => "departed",
            RelationEvent::Broken => "broken",
        }
    }

    /// The name of the hook delivering the event for the given relation
    pub fn hook_name(&self, relation: &str) -> String {
        format!("{relation}-relation-{}", self.suffix())
    }

    /// Parse a hook name of the form `<relation>-relation-<event>`
    pub fn from_hook_name(relation: &str, hook: &str) -> Result<Self, RelationError> {
        RelationEvent::ALL
            .into_iter()
            .find(|event| event.hook_name(relation) == hook)
            .ok_or_else(|| RelationError::Parse(format!("not a {relation} relation hook: {hook}")))
    }
}

impl Display for RelationEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

/// Compute the state following `event`
///
/// `clustered` is only consulted for `Changed`. A `Changed` delivery implies
/// the relation exists, so it never leaves the machine disconnected
pub fn transition(state: ConnectionState, event: RelationEvent, clustered: bool) -> ConnectionState {
    match event {
        RelationEvent::Joined if state.is_connected() => state,
        RelationEvent::Joined => ConnectionState::Connected,
        RelationEvent::Changed if clustered => ConnectionState::Available,
        RelationEvent::Changed => ConnectionState::Connected,
        RelationEvent::Departed | RelationEvent::Broken => ConnectionState::Disconnected,
    }
}

/// Interpret a remote `clustered` value
///
/// Newer subordinates publish a boolean, older ones the strings `true` or
/// `yes` in any case. Anything else reads as not clustered
pub fn parse_clustered(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s.eq_ignore_ascii_case("true") || s.eq_ignore_ascii_case("yes"),
        _ => false,
    }
}

/// Interpret the `clustered` values published by all remote units
///
/// Only one subordinate unit is expected, so the first non-empty value is
/// authoritative
pub fn first_clustered(values: &[Value]) -> bool {
    values.iter().find(|v| !is_empty_value(v)).map(parse_clustered).unwrap_or(false)
}

#[cfg(test)]
mod test {
    use serde_json::json;

    use super::*;

    use super::ConnectionState::*;
    use super::RelationEvent::*;

    /// Tests the transitions out of every state
    #[test]
    fn test_transitions() {
        assert_eq!(transition(Disconnected, Joined, false), Connected);
        assert_eq!(transition(Connected, Joined, false), Connected);
        assert_eq!(transition(Available, Joined, false), Available);

        assert_eq!(transition(Connected, Changed, true), Available);
        assert_eq!(transition(Available, Changed, false), Connected);
        assert_eq!(transition(Available, Changed, true), Available);
        assert_eq!(transition(Disconnected, Changed, false), Connected);

        for state in [Disconnected, Connected, Available] {
            assert_eq!(transition(state, Departed, true), Disconnected);
            assert_eq!(transition(state, Broken, true), Disconnected);
        }
    }

    /// Tests that `available` always implies `connected`
    #[test]
    fn test_available_implies_connected() {
        for state in [Disconnected, Connected, Available] {
            for event in RelationEvent::ALL {
                for clustered in [true, false] {
                    let next = transition(state, event, clustered);
                    assert!(!next.is_available() || next.is_connected());
                }
            }
        }
    }

    /// Tests parsing hook names
    #[test]
    fn test_hook_names() {
        assert_eq!(RelationEvent::from_hook_name("ha", "ha-relation-joined").unwrap(), Joined);
        assert_eq!(RelationEvent::from_hook_name("ha", "ha-relation-broken").unwrap(), Broken);
        assert!(RelationEvent::from_hook_name("ha", "db-relation-joined").is_err());
        assert!(RelationEvent::from_hook_name("ha", "config-changed").is_err());
        assert_eq!(Departed.hook_name("ha"), "ha-relation-departed");
    }

    /// Tests the accepted forms of the clustered signal
    #[test]
    fn test_parse_clustered() {
        assert!(parse_clustered(&json!(true)));
        assert!(parse_clustered(&json!("True")));
        assert!(parse_clustered(&json!("yes")));
        assert!(parse_clustered(&json!("YES")));

        assert!(!parse_clustered(&json!(false)));
        assert!(!parse_clustered(&json!("false")));
        assert!(!parse_clustered(&json!("")));
        assert!(!parse_clustered(&json!(null)));
        assert!(!parse_clustered(&json!(1)));
    }

    /// Tests that the first non-empty value wins
    #[test]
    fn test_first_clustered() {
        assert!(!first_clustered(&[]));
        assert!(first_clustered(&[json!(""), json!("yes"), json!("no")]));
        assert!(!first_clustered(&[json!("no"), json!(true)]));
    }
}
