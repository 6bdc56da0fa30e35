//! Error Types
//!
//! One enum per boundary:
//!
//! - [`RemoteError`] - typed outcome of every remote store call
//! - [`CacheError`] - local cache persistence failures
//! - [`SharingError`] - the classes surfaced by the sharing subsystem

use thiserror::Error;

/// Failure of a remote store call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("Remote store unavailable: {0}")]
    Unavailable(String),

    #[error("Remote call timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    #[error("Remote procedure not available: {name}")]
    ProcedureUnavailable { name: String },

    #[error("Conflicting record: {0}")]
    Conflict(String),

    #[error("Rejected by remote store: {0}")]
    Rejected(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for remote store calls
pub type RemoteResult<T> = Result<T, RemoteError>;

impl RemoteError {
    /// Create an unavailable error
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    /// Create a procedure-unavailable error
    pub fn procedure_unavailable(name: impl Into<String>) -> Self {
        Self::ProcedureUnavailable { name: name.into() }
    }

    /// Create a conflict error
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    /// Create a rejection error
    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    /// Infrastructure failure, as opposed to the store refusing the request
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Timeout { .. } | Self::ProcedureUnavailable { .. }
        )
    }
}

impl From<serde_json::Error> for RemoteError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Failure of the local cache
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("Cache I/O error: {0}")]
    Io(String),

    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

/// Result type for local cache operations
pub type CacheResult<T> = Result<T, CacheError>;

impl From<std::io::Error> for CacheError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Sharing subsystem error classes
///
/// Only `InvalidArgument` and `Unauthenticated` are raised as hard failures,
/// and only by issuance and deactivation. The other classes are folded into
/// result values by validation, redemption and repair.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SharingError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not signed in: {0}")]
    Unauthenticated(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Token has expired")]
    Expired,

    #[error("Backend unavailable: {0}")]
    TransientBackendFailure(String),

    #[error("Copy is incomplete: {copied} of {expected} steps")]
    IncompleteCopy { copied: usize, expected: usize },
}

/// Result type for sharing operations
pub type SharingResult<T> = Result<T, SharingError>;

impl SharingError {
    /// Create an invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<RemoteError> for SharingError {
    fn from(err: RemoteError) -> Self {
        Self::TransientBackendFailure(err.to_string())
    }
}
