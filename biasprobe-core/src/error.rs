//! Error types for the biasprobe core library.
//!
//! Uses `thiserror` for public API error types with structured variants
//! covering the upstream generative service, the response cache,
//! configuration, and reporting.

use std::path::PathBuf;

/// Top-level error type for the biasprobe core library.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors from the generative-language service boundary.
///
/// Transient variants (rate limiting, timeouts, connection drops) are
/// retried with backoff; fatal variants (auth, malformed request) abort
/// only the single fetch that raised them.
#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("Rate limited by upstream, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Upstream connection failed: {message}")]
    Connection { message: String },

    #[error("Authentication failed: {message}")]
    AuthFailed { message: String },

    #[error("Malformed request rejected by upstream: {message}")]
    MalformedRequest { message: String },

    #[error("Upstream response parse error: {message}")]
    ResponseParse { message: String },
}

impl UpstreamError {
    /// Whether this failure is worth retrying with backoff.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            UpstreamError::RateLimited { .. }
                | UpstreamError::Timeout { .. }
                | UpstreamError::Connection { .. }
        )
    }
}

/// Errors from the durable request cache.
///
/// A corrupted store is recoverable: the cache degrades to in-memory
/// operation for the session instead of surfacing this error to callers.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache store at {path} is corrupted: {message}")]
    Corrupted { path: PathBuf, message: String },

    #[error("Cache store at {path} could not be written: {message}")]
    WriteFailed { path: PathBuf, message: String },
}

/// Errors from the configuration system.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Configuration parse error: {message}")]
    ParseError { message: String },
}

/// A type alias for results using the top-level `ProbeError`.
pub type Result<T> = std::result::Result<T, ProbeError>;
