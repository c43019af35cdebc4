//! GitHub API client and rate limit bookkeeping.

use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use super::error::GitHubError;
use super::types::{
    GitHubIssue, GitHubRateLimitResponse, GitHubUser, GraphQlIssue, OPEN_ISSUES_QUERY,
    OpenIssuesData,
};
use crate::graphql::{Connection, GraphQlRequest, GraphQlResponse};
use crate::http::reqwest_transport::ReqwestTransport;
use crate::http::{HttpHeaders, HttpRequest, HttpResponse, HttpTransport, header_get};
use crate::platform::{ApiRateLimiter, RateLimitInfo, RepoCoordinates};

/// Public GitHub REST endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Pagination information extracted from GitHub's Link header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPagination {
    /// The last page number (from rel="last" link).
    pub last_page: Option<u32>,
    /// The next page number (from rel="next" link).
    pub next_page: Option<u32>,
}

impl LinkPagination {
    /// Whether the server advertised another page.
    pub fn has_next(&self) -> bool {
        self.next_page.is_some()
    }
}

/// Parse the Link header to extract pagination info.
///
/// GitHub Link headers look like:
/// `<https://api.github.com/repositories/1/issues?page=2>; rel="next", <...&page=3>; rel="last"`
pub fn parse_link_header(link_header: &str) -> LinkPagination {
    let mut info = LinkPagination::default();

    for part in link_header.split(',') {
        let mut url = None;
        let mut rel = None;

        for segment in part.trim().split(';') {
            let segment = segment.trim();
            if segment.starts_with('<') && segment.ends_with('>') {
                url = Some(&segment[1..segment.len() - 1]);
            } else if let Some(rel_value) = segment.strip_prefix("rel=") {
                rel = Some(rel_value.trim_matches('"'));
            }
        }

        if let (Some(url), Some(rel_type)) = (url, rel)
            && let Some(page_num) = extract_page_from_url(url)
        {
            match rel_type {
                "last" => info.last_page = Some(page_num),
                "next" => info.next_page = Some(page_num),
                _ => {}
            }
        }
    }

    info
}

/// Extract the page parameter from a URL.
fn extract_page_from_url(url: &str) -> Option<u32> {
    let query = &url[url.find('?')? + 1..];
    query
        .split('&')
        .find_map(|param| param.strip_prefix("page="))
        .and_then(|value| value.parse().ok())
}

/// GraphQL endpoint for a REST base URL.
///
/// Enterprise servers expose REST under `/api/v3` and GraphQL under
/// `/api/graphql`; github.com serves both from the API host root.
fn graphql_endpoint(api_base: &Url) -> String {
    let base = api_base.as_str().trim_end_matches('/');
    match base.strip_suffix("/api/v3") {
        Some(root) => format!("{root}/api/graphql"),
        None => format!("{base}/graphql"),
    }
}

/// GitHub API client.
///
/// Every response's `x-ratelimit-*` headers are recorded so that callers can
/// consult the remaining quota without spending a request on `/rate_limit`.
#[derive(Clone)]
pub struct GitHubClient {
    transport: Arc<dyn HttpTransport>,
    api_base: Url,
    graphql_url: String,
    token: String,
    /// Optional rate limiter for pacing API requests.
    rate_limiter: Option<ApiRateLimiter>,
    last_rate_limit: Arc<Mutex<Option<RateLimitInfo>>>,
}

impl GitHubClient {
    /// Create a client for github.com backed by reqwest.
    pub fn new(token: &str, rate_limiter: Option<ApiRateLimiter>) -> Result<Self, GitHubError> {
        Self::with_api_url(GITHUB_API_URL, token, rate_limiter)
    }

    /// Create a client for a specific API host (e.g. GitHub Enterprise).
    pub fn with_api_url(
        api_url: &str,
        token: &str,
        rate_limiter: Option<ApiRateLimiter>,
    ) -> Result<Self, GitHubError> {
        let transport = ReqwestTransport::with_timeout(StdDuration::from_secs(30))
            .map_err(|e| GitHubError::Config(e.to_string()))?;
        Self::new_with_transport(api_url, token, rate_limiter, Arc::new(transport))
    }

    pub fn new_with_transport(
        api_url: &str,
        token: &str,
        rate_limiter: Option<ApiRateLimiter>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self, GitHubError> {
        let api_base = Url::parse(api_url.trim_end_matches('/'))
            .map_err(|e| GitHubError::Config(format!("invalid API URL '{api_url}': {e}")))?;
        if api_base.cannot_be_a_base() {
            return Err(GitHubError::Config(format!(
                "invalid API URL '{api_url}': not a base URL"
            )));
        }
        let graphql_url = graphql_endpoint(&api_base);

        Ok(Self {
            transport,
            api_base,
            graphql_url,
            token: token.to_string(),
            rate_limiter,
            last_rate_limit: Arc::new(Mutex::new(None)),
        })
    }

    /// REST base URL.
    pub fn api_base(&self) -> &str {
        self.api_base.as_str()
    }

    /// GraphQL endpoint URL.
    pub fn graphql_url(&self) -> &str {
        &self.graphql_url
    }

    /// Rate limit status as of the most recent response.
    pub fn last_rate_limit(&self) -> Option<RateLimitInfo> {
        self.last_rate_limit
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or(None)
    }

    /// Wait for rate limiter if one is configured.
    async fn wait_for_rate_limit(&self) {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }
    }

    fn record_rate_limit(&self, headers: &HttpHeaders) {
        if let Some(info) = Self::parse_rate_limit_headers(headers)
            && let Ok(mut last) = self.last_rate_limit.lock()
        {
            *last = Some(info);
        }
    }

    /// Extract rate limit info from GitHub response headers.
    pub(crate) fn parse_rate_limit_headers(headers: &HttpHeaders) -> Option<RateLimitInfo> {
        let limit = header_get(headers, "x-ratelimit-limit")?
            .parse::<usize>()
            .ok()?;
        let remaining = header_get(headers, "x-ratelimit-remaining")?
            .parse::<usize>()
            .ok()?;
        let reset_epoch = header_get(headers, "x-ratelimit-reset")?
            .parse::<i64>()
            .ok()?;
        let reset_at = DateTime::from_timestamp(reset_epoch, 0).unwrap_or_else(Utc::now);
        Some(RateLimitInfo {
            limit,
            remaining,
            reset_at,
        })
    }

    fn default_headers(&self) -> HttpHeaders {
        vec![
            (
                "Accept".to_string(),
                "application/vnd.github+json".to_string(),
            ),
            ("User-Agent".to_string(), "issuesync".to_string()),
            (
                "Authorization".to_string(),
                format!("Bearer {}", self.token),
            ),
            ("X-GitHub-Api-Version".to_string(), "2022-11-28".to_string()),
        ]
    }

    /// Build a REST URL under the API base from path segments.
    pub(crate) fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, GitHubError> {
        self.wait_for_rate_limit().await;

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| GitHubError::Http(e.to_string()))?;

        self.record_rate_limit(&response.headers);

        if response.is_success() {
            return Ok(response);
        }

        // GitHub reports primary rate limit exhaustion as 403 with zero remaining.
        if response.status == 403 && header_get(&response.headers, "x-ratelimit-remaining") == Some("0")
        {
            let reset_at = Self::parse_rate_limit_headers(&response.headers)
                .map(|info| info.reset_at)
                .unwrap_or_else(Utc::now);
            return Err(GitHubError::RateLimited { reset_at });
        }

        Err(GitHubError::Api {
            status: response.status,
            message: response.body_text(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
    ) -> Result<(T, HttpHeaders), GitHubError> {
        let response = self
            .send(HttpRequest::get(url.as_str(), self.default_headers()))
            .await?;
        let data = serde_json::from_slice(&response.body)?;
        Ok((data, response.headers))
    }

    /// Run a GraphQL query.
    pub async fn graphql<T: DeserializeOwned, V: Serialize>(
        &self,
        query: &str,
        variables: V,
    ) -> Result<T, GitHubError> {
        let body = GraphQlRequest::new(query, variables).to_body()?;
        let response = self
            .send(HttpRequest::post_json(
                self.graphql_url.as_str(),
                self.default_headers(),
                body,
            ))
            .await?;
        let envelope: GraphQlResponse<T> = serde_json::from_slice(&response.body)?;
        envelope.into_result().map_err(GitHubError::GraphQl)
    }

    /// Get full rate limit status for all resources.
    pub async fn get_rate_limits(&self) -> Result<GitHubRateLimitResponse, GitHubError> {
        let (limits, _) = self.get_json(self.endpoint(&["rate_limit"])).await?;
        Ok(limits)
    }

    /// Fetch a user's public profile; `None` if the login does not exist.
    pub async fn get_user(&self, login: &str) -> Result<Option<GitHubUser>, GitHubError> {
        match self.get_json(self.endpoint(&["users", login])).await {
            Ok((user, _)) => Ok(Some(user)),
            Err(GitHubError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// URL of one page of open issues, oldest first.
    pub(crate) fn issues_url(&self, repo: &RepoCoordinates, page: u32, per_page: u32) -> Url {
        let mut url = self.endpoint(&["repos", &repo.owner, &repo.repo, "issues"]);
        url.query_pairs_mut()
            .append_pair("state", "open")
            .append_pair("sort", "created")
            .append_pair("direction", "asc")
            .append_pair("per_page", &per_page.to_string())
            .append_pair("page", &page.to_string());
        url
    }

    /// Fetch one page of open issues (pull requests included) via REST.
    pub async fn list_issues_page(
        &self,
        repo: &RepoCoordinates,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<GitHubIssue>, LinkPagination), GitHubError> {
        let url = self.issues_url(repo, page, per_page);
        let (issues, headers) = self
            .get_json::<Vec<GitHubIssue>>(url)
            .await
            .map_err(|e| match e {
                GitHubError::Api { status: 404, .. } => GitHubError::NotFound(repo.full_name()),
                other => other,
            })?;
        let pagination = header_get(&headers, "link")
            .map(parse_link_header)
            .unwrap_or_default();
        Ok((issues, pagination))
    }

    /// Fetch one page of open issues via GraphQL.
    pub async fn open_issues_graphql(
        &self,
        repo: &RepoCoordinates,
        first: u32,
        after: Option<&str>,
    ) -> Result<Connection<GraphQlIssue>, GitHubError> {
        let variables = serde_json::json!({
            "owner": repo.owner,
            "name": repo.repo,
            "first": first,
            "after": after,
        });
        let data: OpenIssuesData = self.graphql(OPEN_ISSUES_QUERY, variables).await?;
        data.repository
            .map(|r| r.issues)
            .ok_or_else(|| GitHubError::NotFound(repo.full_name()))
    }
}

impl std::fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_base", &self.api_base.as_str())
            .field("graphql_url", &self.graphql_url)
            .finish_non_exhaustive()
    }
}
