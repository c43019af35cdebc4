//! Tracker-agnostic interfaces consumed by the sync engine.
//!
//! This module defines the `SourceApi` and `DestinationApi` traits that the
//! reconciliation core talks to, plus the shared error and rate limiting
//! types used by the concrete GitHub and Linear clients.
//!
//! # Example
//!
//! ```ignore
//! use issuesync::platform::{SourceApi, PlatformError};
//!
//! async fn count_open<S: SourceApi>(source: &S) -> Result<usize, PlatformError> {
//!     let page = source.list_open_issues(1).await?;
//!     Ok(page.items.len())
//! }
//! ```

mod errors;
mod fallback;
mod rate_limit;
mod types;

pub use errors::{PlatformError, Result, short_error_message};
pub use fallback::FallbackSource;
pub use rate_limit::{ApiRateLimiter, rate_limits};
pub use types::{
    ActorIdentity, DestinationActor, DestinationApi, DestinationIssue, IssueFilter, IssuePage,
    IssueUpdate, RateLimitInfo, RemoteIssue, RepoCoordinates, SourceApi, Team,
};

#[cfg(test)]
mod tests {
    use std::time::{Duration as StdDuration, Instant};

    use chrono::Utc;

    use super::*;

    #[test]
    fn test_platform_error_api() {
        let err = PlatformError::api("Something went wrong");
        assert!(err.to_string().contains("API error"));
        assert!(err.to_string().contains("Something went wrong"));
    }

    #[test]
    fn test_platform_error_not_found() {
        let err = PlatformError::not_found("team ENG");
        assert!(err.to_string().contains("Not found"));
        assert!(err.to_string().contains("team ENG"));
    }

    #[test]
    fn test_platform_error_network_is_transport() {
        let err = PlatformError::network("connection refused");
        assert!(err.to_string().contains("Network error"));
        assert!(err.is_transport());

        assert!(!PlatformError::api("bad query").is_transport());
        assert!(!PlatformError::AuthRequired.is_transport());
    }

    #[test]
    fn test_platform_error_is_rate_limited() {
        let rate_limited = PlatformError::RateLimited {
            reset_at: Utc::now(),
        };
        assert!(rate_limited.is_rate_limited());
        assert!(!PlatformError::internal("x").is_rate_limited());
    }

    #[test]
    fn test_short_error_message_multiline() {
        let err = std::io::Error::other("first line\nsecond line\nthird line");
        assert_eq!(short_error_message(&err), "first line");
    }

    #[test]
    fn test_repo_coordinates_parse() {
        let repo = RepoCoordinates::parse("acme/widgets").unwrap();
        assert_eq!(repo.owner, "acme");
        assert_eq!(repo.repo, "widgets");
        assert_eq!(repo.full_name(), "acme/widgets");
        assert_eq!(repo.to_string(), "acme/widgets");

        assert_eq!(
            RepoCoordinates::parse(" /acme/widgets/ ").unwrap(),
            RepoCoordinates::new("acme", "widgets")
        );
    }

    #[test]
    fn test_repo_coordinates_parse_rejects_malformed() {
        assert!(RepoCoordinates::parse("acme").is_err());
        assert!(RepoCoordinates::parse("acme/").is_err());
        assert!(RepoCoordinates::parse("/widgets").is_err());
        assert!(RepoCoordinates::parse("a/b/c").is_err());

        let err = RepoCoordinates::parse("widgets").unwrap_err();
        assert!(matches!(err, PlatformError::InvalidRepository(ref slug) if slug == "widgets"));
        assert!(err.to_string().contains("expected owner/name"));
    }

    #[test]
    fn test_team_is_identified_by_id_key_or_name() {
        let team = Team {
            id: "9cfb4f0a".to_string(),
            name: "Platform Engineering".to_string(),
            key: "ENG".to_string(),
        };
        assert!(team.is_identified_by("9cfb4f0a"));
        assert!(team.is_identified_by("eng"));
        assert!(team.is_identified_by("platform engineering"));
        assert!(!team.is_identified_by("9CFB4F0A"));
        assert!(!team.is_identified_by("OPS"));
    }

    #[test]
    fn test_rate_limits_constants() {
        assert_eq!(rate_limits::GITHUB_DEFAULT_RPS, 10);
        assert_eq!(rate_limits::LINEAR_DEFAULT_RPS, 5);
    }

    #[test]
    fn test_api_rate_limiter_optional() {
        assert!(ApiRateLimiter::optional(0).is_none());
        assert!(ApiRateLimiter::optional(3).is_some());
    }

    #[tokio::test]
    async fn test_api_rate_limiter_wait_allows_first_request() {
        let limiter = ApiRateLimiter::new(100);
        let start = Instant::now();
        limiter.wait().await;
        assert!(start.elapsed() < StdDuration::from_millis(50));
    }
}
