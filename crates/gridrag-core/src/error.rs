//! Error types for the retrieval engine.

use thiserror::Error;

/// Result type alias using RagError.
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors that can occur in the retrieval engine.
#[derive(Error, Debug)]
pub enum RagError {
    /// Bad chunking or fusion parameters, rejected before any processing.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Invalid argument provided by a caller.
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// A relation endpoint does not resolve to an existing chunk.
    #[error("Relation {relation_id} references missing chunk {missing}")]
    ReferentialIntegrity {
        relation_id: String,
        missing: String,
    },

    /// One backing store is unreachable; the read path can degrade around it.
    #[error("Store '{store}' unavailable: {message}")]
    StoreUnavailable { store: String, message: String },

    /// Neither store could answer, or the deadline elapsed before either did.
    #[error("Retrieval unavailable: {message}")]
    RetrievalUnavailable { message: String },

    /// Embedding provider throttled us past the bounded retry budget.
    #[error("Embedding provider rate limited after {attempts} attempts")]
    ProviderRateLimit { attempts: u32 },

    /// Embedding provider error.
    #[error("Embedding error: {message}")]
    Embedding { message: String },

    /// Database error.
    #[error("Database error: {message}")]
    Database { message: String },

    /// Document not found.
    #[error("Document not found: {id}")]
    DocumentNotFound { id: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error (unexpected).
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl RagError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a referential integrity error for a relation endpoint.
    pub fn referential_integrity(
        relation_id: impl Into<String>,
        missing: impl Into<String>,
    ) -> Self {
        Self::ReferentialIntegrity {
            relation_id: relation_id.into(),
            missing: missing.into(),
        }
    }

    /// Create a store unavailable error.
    pub fn store_unavailable(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StoreUnavailable {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Create a retrieval unavailable error.
    pub fn retrieval_unavailable(message: impl Into<String>) -> Self {
        Self::RetrievalUnavailable {
            message: message.into(),
        }
    }

    /// Create an embedding error.
    pub fn embedding(message: impl Into<String>) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Create a database error.
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the stable error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "CONFIGURATION_ERROR",
            Self::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Self::ReferentialIntegrity { .. } => "REFERENTIAL_INTEGRITY_ERROR",
            Self::StoreUnavailable { .. } => "STORE_UNAVAILABLE",
            Self::RetrievalUnavailable { .. } => "RETRIEVAL_UNAVAILABLE",
            Self::ProviderRateLimit { .. } => "PROVIDER_RATE_LIMIT",
            Self::Embedding { .. } => "EMBEDDING_ERROR",
            Self::Database { .. } => "DATABASE_ERROR",
            Self::DocumentNotFound { .. } => "DOCUMENT_NOT_FOUND",
            Self::Io(_) => "IO_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Internal { .. } => "INTERNAL_ERROR",
        }
    }

    /// Whether the read path may degrade around this error instead of failing.
    pub fn is_recoverable_for_search(&self) -> bool {
        matches!(self, Self::StoreUnavailable { .. } | Self::Database { .. })
    }
}
