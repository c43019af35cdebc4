//! issuesync - one-way GitHub to Linear reconciliation of issue metadata.
//!
//! Open GitHub issues are joined to the Linear issues that mirror them through
//! a back-reference token (`owner/repo/issues/N`) in the Linear description,
//! and the Linear assignee or priority is corrected to match GitHub.
//!
//! # Features
//!
//! - `github` - GitHub source client (REST and GraphQL).
//! - `linear` - Linear destination client.
//!
//! # Example
//!
//! ```ignore
//! use issuesync::github::{GitHubClient, GitHubGraphQlSource, GitHubIssueScanSource};
//! use issuesync::linear::LinearClient;
//! use issuesync::platform::{FallbackSource, RepoCoordinates};
//! use issuesync::sync::{SyncEngine, SyncOptions, TrackedField};
//!
//! let repo = RepoCoordinates::parse("acme/widgets")?;
//! let github = GitHubClient::new(&github_token, None)?;
//! let source = FallbackSource::new(
//!     GitHubGraphQlSource::new(github.clone(), repo.clone()),
//!     GitHubIssueScanSource::new(github, repo.clone()),
//! );
//! let linear = LinearClient::new(&linear_key, None)?;
//!
//! let options = SyncOptions::new(repo, "ENG", TrackedField::Assignee);
//! let report = SyncEngine::new(&source, &linear, &options).run().await?;
//! ```

pub mod graphql;
pub mod http;
pub mod platform;
pub mod sync;

#[cfg(feature = "github")]
pub mod github;

#[cfg(feature = "linear")]
pub mod linear;

pub use platform::{
    ApiRateLimiter, DestinationApi, FallbackSource, PlatformError, RateLimitInfo,
    RepoCoordinates, SourceApi, rate_limits,
};
pub use sync::{SyncEngine, SyncError, SyncOptions, SyncReport, TrackedField};
