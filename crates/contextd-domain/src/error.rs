//! Error handling types.

use thiserror::Error;

/// Result type alias for operations that can fail.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for contextd.
///
/// Each variant maps to exactly one row of the JSON-RPC error code table
/// (see `contextd-server::transport::error_code`); the mapping is an
/// exhaustive `match` so a new variant here forces that mapping to be
/// updated.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found.
    #[error("not found: {resource}")]
    NotFound {
        /// The resource that was not found.
        resource: String,
    },

    /// Invalid argument provided to an operation.
    #[error("invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    /// A collection name failed to parse into `owner/project/branch`.
    #[error("invalid collection name: {name}")]
    InvalidCollectionName {
        /// The offending name or URI.
        name: String,
    },

    /// Attempted to create a collection that already exists.
    #[error("already exists: {resource}")]
    AlreadyExists {
        /// The resource that already exists.
        resource: String,
    },

    /// Vector dimension did not match the collection's configured size.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Collection's configured vector size.
        expected: usize,
        /// Size of the vector actually supplied.
        actual: usize,
    },

    /// Caller's authenticated identity does not own the requested resource.
    #[error("unauthorized")]
    AuthError {
        /// Internal detail, never surfaced to the client.
        message: String,
    },

    /// Vector store backend failure.
    #[error("vector store error: {message}")]
    VectorStore {
        /// Description of the failure.
        message: String,
        /// Whether the adapter layer should retry this.
        transient: bool,
        /// Optional source error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding provider failure.
    #[error("embedding error: {message}")]
    Embedding {
        /// Description of the failure.
        message: String,
    },

    /// LLM completion failure.
    #[error("llm error: {message}")]
    Llm {
        /// Description of the failure.
        message: String,
    },

    /// Secret scrubbing failed; the caller MUST fail closed.
    #[error("secret scrub error: {message}")]
    SecretScrub {
        /// Description of the failure.
        message: String,
    },

    /// Configuration error, fatal at startup.
    #[error("configuration error for '{key}': {message}")]
    Config {
        /// The offending configuration key.
        key: String,
        /// Why it is invalid.
        message: String,
    },

    /// Event bus publish/subscribe failure.
    #[error("bus error: {message}")]
    Bus {
        /// Description of the failure.
        message: String,
    },

    /// Operation ID not present in the registry (or not owned by caller).
    #[error("operation not found: {id}")]
    OperationNotFound {
        /// The operation ID that was looked up.
        id: String,
    },

    /// I/O failure.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the failure.
        message: String,
        /// Optional source error.
        #[source]
        source: Option<std::io::Error>,
    },

    /// JSON (de)serialization failure.
    #[error("json error: {source}")]
    Json {
        /// The underlying serde_json error.
        #[from]
        source: serde_json::Error,
    },

    /// Unclassified internal failure.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl Error {
    /// Construct a [`Error::NotFound`].
    pub fn not_found<S: Into<String>>(resource: S) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Construct a [`Error::InvalidArgument`].
    pub fn invalid_argument<S: Into<String>>(message: S) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Construct a [`Error::InvalidCollectionName`].
    pub fn invalid_collection_name<S: Into<String>>(name: S) -> Self {
        Self::InvalidCollectionName { name: name.into() }
    }

    /// Construct a [`Error::AlreadyExists`].
    pub fn already_exists<S: Into<String>>(resource: S) -> Self {
        Self::AlreadyExists {
            resource: resource.into(),
        }
    }

    /// Construct a [`Error::AuthError`]. The `message` is never surfaced to
    /// the client; only the uniform "unauthorized" text is.
    pub fn auth<S: Into<String>>(message: S) -> Self {
        Self::AuthError {
            message: message.into(),
        }
    }

    /// Construct a transient [`Error::VectorStore`] (eligible for retry).
    pub fn vector_store_transient<S: Into<String>>(message: S) -> Self {
        Self::VectorStore {
            message: message.into(),
            transient: true,
            source: None,
        }
    }

    /// Construct a permanent [`Error::VectorStore`] (not retried).
    pub fn vector_store<S: Into<String>>(message: S) -> Self {
        Self::VectorStore {
            message: message.into(),
            transient: false,
            source: None,
        }
    }

    /// Construct a [`Error::Embedding`].
    pub fn embedding<S: Into<String>>(message: S) -> Self {
        Self::Embedding {
            message: message.into(),
        }
    }

    /// Construct a [`Error::Llm`].
    pub fn llm<S: Into<String>>(message: S) -> Self {
        Self::Llm {
            message: message.into(),
        }
    }

    /// Construct a [`Error::SecretScrub`].
    pub fn secret_scrub<S: Into<String>>(message: S) -> Self {
        Self::SecretScrub {
            message: message.into(),
        }
    }

    /// Construct a [`Error::Config`].
    pub fn config<K: Into<String>, S: Into<String>>(key: K, message: S) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }

    /// Construct a [`Error::Bus`].
    pub fn bus<S: Into<String>>(message: S) -> Self {
        Self::Bus {
            message: message.into(),
        }
    }

    /// Construct a [`Error::OperationNotFound`].
    pub fn operation_not_found<S: Into<String>>(id: S) -> Self {
        Self::OperationNotFound { id: id.into() }
    }

    /// Construct a [`Error::Internal`].
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether the adapter layer should retry this error with backoff.
    ///
    /// Only the transient infrastructure classes from spec §4.2/§7 are
    /// retryable: a transient [`Error::VectorStore`] or a [`Error::Bus`].
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::VectorStore { transient: true, .. } | Self::Bus { .. })
    }
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            message: source.to_string(),
            source: Some(source),
        }
    }
}
