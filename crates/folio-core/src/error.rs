//! Error types for the folio system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for folio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the folio system
#[derive(Error, Debug)]
pub enum Error {
    /// Transport-level failure reaching the provider (connect, timeout, non-2xx)
    #[error("Network error: {0}")]
    Network(String),

    /// The provider answered, but the body could not be parsed
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Well-formed error response from the provider
    #[error("Provider error ({provider}) #{}: {message}", display_code(.code))]
    Provider {
        /// Provider name
        provider: String,
        /// Numeric error code reported by the provider, if any
        code: Option<u32>,
        /// Error message
        message: String,
    },

    /// Provider rejected the API credentials
    ///
    /// This is still a provider error response; it gets its own variant so
    /// callers can print an actionable message.
    #[error(
        "Provider error ({provider}) #{code}: API key is invalid or API access has not been enabled. \
         Check the API credentials and make sure API access is enabled for the account."
    )]
    InvalidCredentials {
        /// Provider name
        provider: String,
        /// Numeric error code reported by the provider
        code: u32,
    },

    /// Sync requested but no provider client is configured
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// Document, record type or record missing
    #[error("Not found: {0}")]
    NotFound(String),

    /// Domain already provisioned
    #[error("Already exists: {0}")]
    AlreadyExists(String),

    /// Invalid input (unsupported DNS record type, bad domain name, ...)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Document store errors with context
    #[error("Store error: {0}")]
    Store(String),

    /// Filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a provider error
    pub fn provider(
        provider: impl Into<String>,
        code: Option<u32>,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            code,
            message: message.into(),
        }
    }

    /// Create an invalid credentials error
    pub fn invalid_credentials(provider: impl Into<String>, code: u32) -> Self {
        Self::InvalidCredentials {
            provider: provider.into(),
            code,
        }
    }

    /// Create a "not configured" error
    pub fn not_configured(msg: impl Into<String>) -> Self {
        Self::NotConfigured(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an "already exists" error
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Whether this error came back from the provider as an error response
    pub fn is_provider_error(&self) -> bool {
        matches!(self, Self::Provider { .. } | Self::InvalidCredentials { .. })
    }

    /// Whether the provider rejected the API credentials
    pub fn is_invalid_credentials(&self) -> bool {
        matches!(self, Self::InvalidCredentials { .. })
    }

    /// Whether retrying the same call may succeed
    ///
    /// Only transport failures qualify. Provider and protocol errors are
    /// deterministic for a given request.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

fn display_code(code: &Option<u32>) -> String {
    code.map(|c| c.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
