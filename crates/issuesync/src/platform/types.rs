use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::errors::{PlatformError, Result};

/// Rate limit information from the source tracker.
#[derive(Debug, Clone, Serialize)]
pub struct RateLimitInfo {
    /// Maximum requests allowed per period.
    pub limit: usize,
    /// Remaining requests in current period.
    pub remaining: usize,
    /// When the rate limit resets.
    pub reset_at: DateTime<Utc>,
}

/// Owner/name coordinates of a source repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepoCoordinates {
    pub owner: String,
    pub repo: String,
}

impl RepoCoordinates {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }

    /// Parse `owner/name`.
    pub fn parse(slug: &str) -> Result<Self> {
        let trimmed = slug.trim().trim_matches('/');
        match trimmed.split_once('/') {
            Some((owner, repo))
                if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') =>
            {
                Ok(Self::new(owner, repo))
            }
            _ => Err(PlatformError::InvalidRepository(slug.to_string())),
        }
    }

    /// Get the full name (owner/name).
    #[inline]
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// An open issue as reported by the source tracker, before field extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteIssue {
    pub number: u64,
    pub title: String,
    pub url: String,
    /// GitHub lists pull requests on the issues endpoint.
    pub is_pull_request: bool,
    /// Assignee logins, in the order the tracker returns them.
    pub assignees: Vec<String>,
    /// Label names.
    pub labels: Vec<String>,
}

/// One page of open issues.
#[derive(Debug, Clone, Default)]
pub struct IssuePage {
    pub items: Vec<RemoteIssue>,
    pub has_more: bool,
}

/// A source-side actor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ActorIdentity {
    pub source_handle: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

impl ActorIdentity {
    /// An identity known only by its handle.
    pub fn handle_only(handle: impl Into<String>) -> Self {
        Self {
            source_handle: handle.into(),
            display_name: None,
            email: None,
        }
    }
}

/// A team on the destination tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub key: String,
}

impl Team {
    /// Whether `identifier` names this team by id, key or name.
    ///
    /// Keys and names compare case-insensitively, ids exactly.
    pub fn is_identified_by(&self, identifier: &str) -> bool {
        let identifier = identifier.trim();
        self.id == identifier
            || self.key.eq_ignore_ascii_case(identifier)
            || self.name.to_lowercase() == identifier.to_lowercase()
    }
}

/// A user on the destination tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationActor {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
}

/// An issue on the destination tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestinationIssue {
    pub id: String,
    /// Human-readable key such as `ENG-12`.
    pub identifier: String,
    pub title: String,
    pub description: String,
    pub assignee_id: Option<String>,
    /// Destination priority scale: 0 none, 1 urgent, 2 high, 3 medium, 4 low.
    pub priority: i32,
}

/// Issue search filter for the destination tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueFilter {
    pub team_id: String,
    pub title_equals: Option<String>,
    pub description_contains: Option<String>,
}

/// Single-field update applied to a destination issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IssueUpdate {
    pub assignee_id: Option<String>,
    pub priority: Option<i32>,
}

/// The source tracker as consumed by the sync engine.
///
/// # Implementation Notes
///
/// Implementors should:
/// - Number pages from 1 and return an empty page past the end
/// - Record the remaining-quota signal of every response they receive
/// - Convert transport failures to `PlatformError::Network`
#[async_trait]
pub trait SourceApi: Send + Sync {
    /// Fetch one page of open issues.
    async fn list_open_issues(&self, page: u32) -> Result<IssuePage>;

    /// Remaining request quota as last reported by the tracker.
    ///
    /// `None` means no response carried a quota signal yet.
    fn quota_remaining(&self) -> Option<usize>;

    /// Look up profile details for a handle.
    async fn actor_details(&self, handle: &str) -> Result<Option<ActorIdentity>>;
}

/// The destination tracker as consumed by the sync engine.
#[async_trait]
pub trait DestinationApi: Send + Sync {
    /// List all teams visible to the credentials.
    async fn list_teams(&self) -> Result<Vec<Team>>;

    /// List all users.
    async fn list_actors(&self) -> Result<Vec<DestinationActor>>;

    /// Find issues matching a filter.
    async fn find_issues(&self, filter: &IssueFilter) -> Result<Vec<DestinationIssue>>;

    /// Apply an update to a single issue.
    async fn update_issue(&self, id: &str, update: &IssueUpdate) -> Result<()>;
}
