//! Error types for unit-local storage access

/// The error type emitted by the unit-local store
#[derive(Debug, thiserror::Error)]
pub enum KvError {
    /// Error reading or writing the backing file
    #[error("io error: {0}")]
    Io(String),
    /// Error (de)serializing a stored value
    #[error("serde error: {0}")]
    Serde(String),
}

impl From<std::io::Error> for KvError {
    fn from(e: std::io::Error) -> Self {
        KvError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for KvError {
    fn from(e: serde_json::Error) -> Self {
        KvError::Serde(e.to_string())
    }
}
