//! Error types for the legacy nn utilities

use thiserror::Error;

/// Main error type for tensor utility operations
#[derive(Error, Debug)]
pub enum Error {
    /// A traversal expected a tensor or a nested sequence of tensors
    #[error("Type mismatch: expecting {expected}, got {found} instead")]
    TypeMismatch {
        /// What the operation accepts at this position
        expected: String,
        /// What was actually found
        found: String,
    },

    /// Element counts or sequence lengths disagree
    #[error("Size mismatch: {0}")]
    SizeMismatch(String),

    /// Dimension index outside `0..=rank`
    #[error("Invalid dimension {dim} for tensor of rank {rank}")]
    InvalidDimension {
        /// Requested dimension
        dim: usize,
        /// Rank of the tensor
        rank: usize,
    },

    /// Unparseable tensor or storage type tag
    #[error("Invalid type name: {0}")]
    InvalidTypeName(String),

    /// A strided view does not fit its storage or cannot be formed
    #[error("Invalid view: {0}")]
    InvalidView(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Other errors, e.g. raised by a composite during conversion
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for tensor utility operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a type mismatch error
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Create a size mismatch error
    pub fn size_mismatch(msg: impl Into<String>) -> Self {
        Self::SizeMismatch(msg.into())
    }

    /// Create an invalid type name error
    pub fn invalid_type_name(name: impl Into<String>) -> Self {
        Self::InvalidTypeName(name.into())
    }

    /// Create an invalid view error
    pub fn invalid_view(msg: impl Into<String>) -> Self {
        Self::InvalidView(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this is the traversal type mismatch
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, Self::TypeMismatch { .. })
    }
}
