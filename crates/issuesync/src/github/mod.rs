//! GitHub as the source tracker.
//!
//! # Module Structure
//!
//! - [`error`] - Error types for GitHub API operations
//! - [`types`] - Wire types for the REST and GraphQL APIs
//! - [`client`] - HTTP client and rate limit bookkeeping
//! - [`source`] - `SourceApi` strategies over the client
//!
//! # Example
//!
//! ```ignore
//! use issuesync::github::{GitHubClient, GitHubGraphQlSource, GitHubIssueScanSource};
//! use issuesync::platform::{FallbackSource, RepoCoordinates};
//!
//! let client = GitHubClient::new(&token, None)?;
//! let repo = RepoCoordinates::parse("acme/widgets")?;
//! let source = FallbackSource::new(
//!     GitHubGraphQlSource::new(client.clone(), repo.clone()),
//!     GitHubIssueScanSource::new(client, repo),
//! );
//! ```

mod client;
mod error;
mod source;
mod types;

pub use client::{GITHUB_API_URL, GitHubClient, LinkPagination, parse_link_header};
pub use error::GitHubError;
pub use source::{GitHubGraphQlSource, GitHubIssueScanSource};
pub use types::{
    DEFAULT_PAGE_SIZE, GitHubIssue, GitHubRateLimitResponse, GitHubRateLimits, GitHubUser,
    RateLimitResource,
};
