//! `SourceApi` strategies over the GitHub API.
//!
//! [`GitHubGraphQlSource`] pages through open issues with a GraphQL cursor and
//! [`GitHubIssueScanSource`] walks the REST issues listing. Both report pages
//! in creation order so that either one can take over mid-run.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::client::GitHubClient;
use super::types::{DEFAULT_PAGE_SIZE, GitHubUser};
use crate::platform::{
    ActorIdentity, IssuePage, PlatformError, RemoteIssue, RepoCoordinates, Result, SourceApi,
};

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn actor_from_user(user: GitHubUser) -> ActorIdentity {
    ActorIdentity {
        source_handle: user.login,
        display_name: non_empty(user.name),
        email: non_empty(user.email),
    }
}

async fn lookup_actor(client: &GitHubClient, handle: &str) -> Result<Option<ActorIdentity>> {
    let user = client.get_user(handle).await?;
    Ok(user.map(actor_from_user))
}

fn quota_from(client: &GitHubClient) -> Option<usize> {
    client.last_rate_limit().map(|info| info.remaining)
}

/// Open issues via the GraphQL API.
///
/// GraphQL pages are cursor-addressed, so the cursor returned with page `n` is
/// remembered to serve page `n + 1`.
#[derive(Debug)]
pub struct GitHubGraphQlSource {
    client: GitHubClient,
    repo: RepoCoordinates,
    page_size: u32,
    cursors: Mutex<HashMap<u32, Option<String>>>,
}

impl GitHubGraphQlSource {
    pub fn new(client: GitHubClient, repo: RepoCoordinates) -> Self {
        Self {
            client,
            repo,
            page_size: DEFAULT_PAGE_SIZE,
            cursors: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, DEFAULT_PAGE_SIZE);
        self
    }

    /// Cursor to request `page` with; `Ok(None)` for the first page.
    fn cursor_for(&self, page: u32) -> Result<Option<String>> {
        if page <= 1 {
            return Ok(None);
        }
        let cursors = self
            .cursors
            .lock()
            .map_err(|_| PlatformError::internal("cursor map poisoned"))?;
        match cursors.get(&(page - 1)) {
            Some(cursor) => Ok(cursor.clone()),
            None => Err(PlatformError::internal(format!(
                "page {page} requested before page {}",
                page - 1
            ))),
        }
    }

    fn remember_cursor(&self, page: u32, cursor: Option<String>) {
        if let Ok(mut cursors) = self.cursors.lock() {
            cursors.insert(page, cursor);
        }
    }
}

#[async_trait]
impl SourceApi for GitHubGraphQlSource {
    async fn list_open_issues(&self, page: u32) -> Result<IssuePage> {
        let after = self.cursor_for(page)?;
        let connection = self
            .client
            .open_issues_graphql(&self.repo, self.page_size, after.as_deref())
            .await?;

        let has_more = connection.page_info.has_next_page;
        self.remember_cursor(page, connection.page_info.end_cursor);

        let items: Vec<RemoteIssue> = connection.nodes.into_iter().map(Into::into).collect();
        tracing::debug!(
            repo = %self.repo,
            page,
            count = items.len(),
            has_more,
            "fetched open issues via GraphQL"
        );
        Ok(IssuePage { items, has_more })
    }

    fn quota_remaining(&self) -> Option<usize> {
        quota_from(&self.client)
    }

    async fn actor_details(&self, handle: &str) -> Result<Option<ActorIdentity>> {
        lookup_actor(&self.client, handle).await
    }
}

/// Open issues via the REST listing.
///
/// The listing includes pull requests; they are flagged, not removed.
#[derive(Debug)]
pub struct GitHubIssueScanSource {
    client: GitHubClient,
    repo: RepoCoordinates,
    page_size: u32,
}

impl GitHubIssueScanSource {
    pub fn new(client: GitHubClient, repo: RepoCoordinates) -> Self {
        Self {
            client,
            repo,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, DEFAULT_PAGE_SIZE);
        self
    }
}

#[async_trait]
impl SourceApi for GitHubIssueScanSource {
    async fn list_open_issues(&self, page: u32) -> Result<IssuePage> {
        let page = page.max(1);
        let (issues, pagination) = self
            .client
            .list_issues_page(&self.repo, page, self.page_size)
            .await?;

        // Pull requests stay in the page so that an all-PR page is not
        // mistaken for the end of the listing.
        let items: Vec<RemoteIssue> = issues.into_iter().map(RemoteIssue::from).collect();
        tracing::debug!(
            repo = %self.repo,
            page,
            count = items.len(),
            "scanned open issues via REST"
        );
        Ok(IssuePage {
            items,
            has_more: pagination.has_next(),
        })
    }

    fn quota_remaining(&self) -> Option<usize> {
        quota_from(&self.client)
    }

    async fn actor_details(&self, handle: &str) -> Result<Option<ActorIdentity>> {
        lookup_actor(&self.client, handle).await
    }
}
