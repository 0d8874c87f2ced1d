//! Error types for vietsent

/// Result type alias using vietsent's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for vietsent operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Input failed length/shape constraints. Raised before any model or storage work.
    #[error("validation error: {0}")]
    Validation(String),

    /// External classifier failed to load or raised during inference
    #[error("classifier unavailable: {0}")]
    ClassifierUnavailable(String),

    /// Persistence layer unreachable or a write failed
    #[error("storage error: {0}")]
    Storage(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a new classifier-unavailable error
    pub fn classifier_unavailable(msg: impl Into<String>) -> Self {
        Self::ClassifierUnavailable(msg.into())
    }

    /// Create a new storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether the error came from the persistence layer
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Whether the error is a rejected input
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
