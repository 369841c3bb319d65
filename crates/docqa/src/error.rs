//! Error types for the document Q&A pipeline

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for docqa operations
pub type Result<T> = std::result::Result<T, Error>;

/// Failure classes reported by the remote embedding and chat services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The service rejected the request with a rate limit (HTTP 429)
    RateLimited,
    /// Credentials were missing or rejected (HTTP 401/403)
    AuthFailed,
    /// Transport failure, timeout or server-side (5xx) failure
    NetworkFailed,
    /// The service answered, but not with something we can use
    InvalidResponse,
}

impl ProviderErrorKind {
    /// Whether a provider may retry a request that failed this way
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited | Self::NetworkFailed)
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RateLimited => "rate limited",
            Self::AuthFailed => "authentication failed",
            Self::NetworkFailed => "network failure",
            Self::InvalidResponse => "invalid response",
        };
        f.write_str(label)
    }
}

/// Pipeline errors
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration (chunking parameters, missing credentials, ...)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Storage access failure
    #[error("IO error at '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A PDF file could not be parsed
    #[error("Failed to parse '{filename}': {message}")]
    PageParse { filename: String, message: String },

    /// Embedding or chat-completion service failure
    #[error("{provider} {kind}: {message}")]
    Provider {
        provider: String,
        kind: ProviderErrorKind,
        message: String,
    },

    /// Chunk/vector counts or vector dimensionality disagree
    #[error("Dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// A query was issued before any index was built
    #[error("Index is not ready: build the index before querying")]
    NotReady,

    /// A build was requested while another build is running
    #[error("An index build is already in progress")]
    AlreadyBuilding,

    /// Documents were loaded but produced no text to index
    #[error("No indexable text found in '{}'", .0.display())]
    EmptyCorpus(PathBuf),

    /// Caller supplied an unusable argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create an IO error bound to the path being accessed
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a page parse error
    pub fn page_parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PageParse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a provider error
    pub fn provider(
        provider: impl Into<String>,
        kind: ProviderErrorKind,
        message: impl Into<String>,
    ) -> Self {
        Self::Provider {
            provider: provider.into(),
            kind,
            message: message.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch(message: impl Into<String>) -> Self {
        Self::DimensionMismatch(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable machine-readable name of the error kind
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::Io { .. } => "io_error",
            Error::PageParse { .. } => "page_parse_error",
            Error::Provider { kind, .. } => match kind {
                ProviderErrorKind::RateLimited => "provider_rate_limited",
                ProviderErrorKind::AuthFailed => "provider_auth_failed",
                ProviderErrorKind::NetworkFailed => "provider_network_failed",
                ProviderErrorKind::InvalidResponse => "provider_invalid_response",
            },
            Error::DimensionMismatch(_) => "dimension_mismatch",
            Error::NotReady => "not_ready",
            Error::AlreadyBuilding => "already_building",
            Error::EmptyCorpus(_) => "empty_corpus",
            Error::InvalidInput(_) => "invalid_input",
            Error::Internal(_) => "internal_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Error::Config(_) | Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Error::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Error::PageParse { .. } | Error::EmptyCorpus(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Provider { kind, .. } => match kind {
                ProviderErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
                _ => StatusCode::BAD_GATEWAY,
            },
            Error::DimensionMismatch(_) | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Error::NotReady | Error::AlreadyBuilding => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        }

        let body = Json(json!({
            "error": {
                "type": self.kind(),
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}
