//! Error types for the preferences service
//!
//! Both fetch and write failures are non-fatal to the caller. They carry
//! the human-readable message the backend returned, when there was one.

/// Low-level service failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// Connection, timeout or request construction failed
    #[error("transport error: {0}")]
    Transport(String),

    /// Backend answered with an error payload
    #[error("rejected with status {status}: {message}")]
    Rejected {
        /// HTTP-equivalent status code
        status: u16,
        /// Human-readable message from the payload
        message: String,
    },

    /// Response body could not be decoded
    #[error("decode error: {0}")]
    Decode(String),

    /// Backend reported itself unavailable
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl ServiceError {
    /// Message suitable for a user-visible error indicator
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Transport(m) | Self::Decode(m) | Self::Unavailable(m) => m,
            Self::Rejected { message, .. } => message,
        }
    }
}

/// Loading the authoritative preference set failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load preferences: {source}")]
pub struct FetchError {
    /// Underlying failure
    #[from]
    pub source: ServiceError,
}

impl FetchError {
    /// User-visible message
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        self.source.message()
    }
}

/// Writing a partial preference set failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to save preferences: {source}")]
pub struct WriteError {
    /// Underlying failure
    #[from]
    pub source: ServiceError,
}

impl WriteError {
    /// User-visible message
    #[inline]
    #[must_use]
    pub fn message(&self) -> &str {
        self.source.message()
    }
}

/// Invalid client configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Base URL is empty or not http(s)
    #[error("invalid base url: {0}")]
    InvalidBaseUrl(String),

    /// HTTP client could not be built
    #[error("http client: {0}")]
    Client(String),
}
