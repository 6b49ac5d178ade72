//! Error type for the Polaris management API boundary

use thiserror::Error;

/// Error returned by every remote management call.
///
/// Conflicts get their own variant because re-runs of the tool hit them
/// constantly and they must stay distinguishable from real failures.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("conflict: {message}")]
    Conflict { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{0}")]
    Auth(String),
}

impl ApiError {
    /// Map an HTTP status code plus response body to the right variant.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            404 => ApiError::NotFound { message },
            409 => ApiError::Conflict { message },
            _ => ApiError::Status { status, message },
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ApiError::Conflict { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}
