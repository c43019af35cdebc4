//! GitHub API error types.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::platform::PlatformError;

/// Errors that can occur when interacting with the GitHub API.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON (de)serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// GraphQL endpoint answered with errors.
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded. Resets at {reset_at}")]
    RateLimited { reset_at: DateTime<Utc> },

    /// Repository or user not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<GitHubError> for PlatformError {
    fn from(err: GitHubError) -> Self {
        match err {
            GitHubError::Http(message) => PlatformError::Network { message },
            GitHubError::Json(e) => PlatformError::Internal {
                message: format!("JSON parse error: {}", e),
            },
            GitHubError::Api { status, message } => match status {
                401 => PlatformError::AuthRequired,
                404 => PlatformError::NotFound { resource: message },
                429 => PlatformError::RateLimited {
                    reset_at: Utc::now() + chrono::Duration::minutes(1),
                },
                _ => PlatformError::Api { message },
            },
            GitHubError::GraphQl(message) => PlatformError::Api { message },
            GitHubError::RateLimited { reset_at } => PlatformError::RateLimited { reset_at },
            GitHubError::NotFound(resource) => PlatformError::NotFound { resource },
            GitHubError::Config(message) => PlatformError::Internal { message },
        }
    }
}
