//! Error types for the GCP REST clients.

use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the Compute Engine and Recommender clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport-level failure: connection, TLS, timeout, or body read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success response from the API.
    #[error("API error {status}: {message}")]
    Api {
        status: u16,
        message: String,
        /// Machine-readable reason from the error envelope, e.g.
        /// `rateLimitExceeded` or `notFound`.
        reason: Option<String>,
    },

    /// The access token contains bytes that cannot go into a header.
    #[error("invalid access token: {0}")]
    InvalidToken(String),
}

/// Standard GCP error envelope: `{"error": {"message": ..., "errors": [...]}}`.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorItem>,
}

#[derive(Debug, Deserialize)]
struct ErrorItem {
    #[serde(default)]
    reason: Option<String>,
}

impl ApiError {
    /// Build an [`ApiError::Api`] from a non-success response body.
    ///
    /// Falls back to the raw body text when it is not the standard
    /// error envelope.
    pub(crate) fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(envelope) => ApiError::Api {
                status,
                message: envelope.error.message,
                reason: envelope.error.errors.into_iter().find_map(|e| e.reason),
            },
            Err(_) => {
                let body = body.trim();
                ApiError::Api {
                    status,
                    message: if body.is_empty() {
                        format!("HTTP {status}")
                    } else {
                        body.to_string()
                    },
                    reason: None,
                }
            }
        }
    }

    /// Whether a retry of the same call may succeed.
    ///
    /// Transport failures, rate limiting, and server-side 5xx responses
    /// qualify. Client errors other than 429 do not.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Http(e) => e.is_timeout() || e.is_connect(),
            ApiError::Api { status, reason, .. } => {
                matches!(status, 429 | 500 | 502 | 503 | 504)
                    || reason.as_deref() == Some("rateLimitExceeded")
            }
            ApiError::InvalidToken(_) => false,
        }
    }

    /// Whether this error reports a stop of an instance that is not
    /// running. The API refuses the call, but the instance is already
    /// where a stop would leave it.
    pub fn is_stop_noop(&self) -> bool {
        match self {
            ApiError::Api {
                status: 400,
                message,
                ..
            } => {
                let message = message.to_ascii_lowercase();
                message.contains("not running") || message.contains("already stopped")
            }
            _ => false,
        }
    }

    /// HTTP status of the failure, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            ApiError::Api { status, .. } => Some(*status),
            ApiError::InvalidToken(_) => None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
