//! Error types emitted by the relation adapter

use std::{error::Error, fmt::Display};

use common::CrmError;
use state::KvError;

/// The relation error type
#[derive(Debug)]
pub enum RelationError {
    /// An error in the resource registry
    Crm(CrmError),
    /// A hook tool could not be run or exited unsuccessfully
    HookTool(String),
    /// An error accessing unit-local state
    Kv(KvError),
    /// Unparseable input, e.g. an unknown hook name or hook tool output
    Parse(String),
}

impl Display for RelationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
impl Error for RelationError {}

impl From<CrmError> for RelationError {
    fn from(e: CrmError) -> Self {
        RelationError::Crm(e)
    }
}

impl From<KvError> for RelationError {
    fn from(e: KvError) -> Self {
        RelationError::Kv(e)
    }
}

/// Useful for error types expecting `String`
impl From<RelationError> for String {
    fn from(e: RelationError) -> Self {
        e.to_string()
    }
}
