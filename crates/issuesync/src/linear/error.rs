//! Error types for Linear API operations.

use chrono::Utc;
use thiserror::Error;

use crate::platform::PlatformError;

/// Errors that can occur when interacting with the Linear API.
#[derive(Debug, Error)]
pub enum LinearError {
    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON parsing failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The GraphQL layer reported errors.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// API key missing, invalid or lacking access.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A mutation answered `success: false`.
    #[error("Update rejected for issue {0}")]
    UpdateRejected(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<LinearError> for PlatformError {
    fn from(err: LinearError) -> Self {
        match err {
            LinearError::Http(message) => PlatformError::Network { message },
            LinearError::Json(e) => PlatformError::Internal {
                message: format!("JSON parse error: {}", e),
            },
            LinearError::Api { status, message } => {
                if status == 401 || status == 403 {
                    PlatformError::AuthRequired
                } else if status == 404 {
                    PlatformError::NotFound { resource: message }
                } else if status == 429 {
                    PlatformError::RateLimited {
                        reset_at: Utc::now() + chrono::Duration::minutes(1),
                    }
                } else {
                    PlatformError::Api { message }
                }
            }
            LinearError::GraphQl(message) => PlatformError::Api { message },
            LinearError::Auth(_) => PlatformError::AuthRequired,
            LinearError::UpdateRejected(id) => PlatformError::Api {
                message: format!("update rejected for issue {}", id),
            },
            LinearError::Config(msg) => PlatformError::Internal { message: msg },
        }
    }
}
