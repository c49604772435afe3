//! Error types for the merge crate.

/// Errors that can occur during merge session operations.
///
/// Resolving a session that has nothing left to resolve is reported through
/// [`crate::ResolveStatus`], not as an error.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// No conflict with this key exists in the registry.
    #[error("conflict not found: {0}")]
    KeyNotFound(String),

    /// A conflict index past the end of the registry was requested.
    #[error("conflict index {index} out of range (registry holds {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// The configuration failed validation.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The configuration could not be parsed.
    #[error("configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The configuration could not be serialized.
    #[error("configuration serialization error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
