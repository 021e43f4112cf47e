//! Error types emitted by the resource registry

/// The error type for the resource registry
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CrmError {
    /// A wire entry could not be decoded
    #[error("failed to decode wire entry {key}: {reason}")]
    Decode {
        /// The wire key of the offending entry
        key: String,
        /// A description of the failure
        reason: String,
    },
    /// A registry entry could not be encoded
    #[error("failed to encode entry {key}: {reason}")]
    Encode {
        /// The wire key of the offending entry
        key: String,
        /// A description of the failure
        reason: String,
    },
    /// A wire entry references a resource kind the registry does not know
    #[error("unrecognized resource kind: {0}")]
    UnrecognizedResourceKind(String),
    /// A virtual IP was declared with an address that is not an IP
    #[error("invalid address: {0}")]
    InvalidAddress(String),
}

impl CrmError {
    /// Create a new `Decode` error
    pub fn decode(key: impl ToString, reason: impl ToString) -> Self {
        Self::Decode { key: key.to_string(), reason: reason.to_string() }
    }

    /// Create a new `Encode` error
    pub fn encode(key: impl ToString, reason: impl ToString) -> Self {
        Self::Encode { key: key.to_string(), reason: reason.to_string() }
    }

    /// Create a new `UnrecognizedResourceKind` error
    pub fn unrecognized_kind(kind: impl ToString) -> Self {
        Self::UnrecognizedResourceKind(kind.to_string())
    }
}
