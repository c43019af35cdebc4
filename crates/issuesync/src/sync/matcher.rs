//! Cross-reference matching between source and destination issues.
//!
//! A destination issue mirrors a source issue when its description carries
//! the source's back-reference token and both titles are equal after
//! trimming. The destination search narrows candidates; every candidate is
//! re-checked locally before it counts.

use std::collections::HashMap;

use crate::platform::{DestinationApi, DestinationIssue, IssueFilter, RepoCoordinates};

use super::progress::{ProgressCallback, SyncProgress, emit};
use super::types::{BackReference, SourceIssue};

/// Whether `text` contains `token` not immediately followed by a digit or
/// preceded by a name character.
///
/// Keeps `acme/widgets/issues/4` from matching inside
/// `acme/widgets/issues/42` or `xacme/widgets/issues/4`.
pub fn contains_token(text: &str, token: &str) -> bool {
    if token.is_empty() {
        return false;
    }
    text.match_indices(token).any(|(start, matched)| {
        let before_ok = text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !(c.is_alphanumeric() || matches!(c, '-' | '_' | '.')));
        let after_ok = text[start + matched.len()..]
            .chars()
            .next()
            .is_none_or(|c| !c.is_ascii_digit());
        before_ok && after_ok
    })
}

/// The match predicate: token in the description, titles equal after trim.
///
/// Title comparison is byte-exact; case differences do not match.
pub fn is_cross_reference(source: &SourceIssue, token: &str, candidate: &DestinationIssue) -> bool {
    contains_token(&candidate.description, token) && source.title.trim() == candidate.title.trim()
}

/// Per-run memo of destination search results keyed by token.
#[derive(Debug, Default)]
pub struct MatchCache {
    entries: HashMap<String, Vec<DestinationIssue>>,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token: &str) -> Option<&[DestinationIssue]> {
        self.entries.get(token).map(Vec::as_slice)
    }

    pub fn insert(&mut self, token: String, issues: Vec<DestinationIssue>) {
        self.entries.entry(token).or_insert(issues);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A source issue and the destination issues that mirror it.
#[derive(Debug, Clone)]
pub struct IssueMatch {
    pub source: SourceIssue,
    pub reference: BackReference,
    /// In the order the destination returned them.
    pub destinations: Vec<DestinationIssue>,
}

/// Matching outcome, in source iteration order.
#[derive(Debug, Default)]
pub struct IssueMatches {
    pub matched: Vec<IssueMatch>,
    /// Source numbers with no counterpart.
    pub unmatched: Vec<u64>,
    /// Source numbers whose destination search failed.
    pub failed: Vec<u64>,
}

impl IssueMatches {
    /// Destination issues matched to a source number.
    pub fn get(&self, number: u64) -> Option<&[DestinationIssue]> {
        self.matched
            .iter()
            .find(|m| m.source.number == number)
            .map(|m| m.destinations.as_slice())
    }

    /// Total (source, destination) pairs.
    pub fn pair_count(&self) -> usize {
        self.matched.iter().map(|m| m.destinations.len()).sum()
    }
}

/// Finds destination issues that mirror source issues.
#[derive(Debug)]
pub struct CrossReferenceMatcher {
    repo: RepoCoordinates,
    team_id: String,
    cache: MatchCache,
}

impl CrossReferenceMatcher {
    pub fn new(repo: RepoCoordinates, team_id: impl Into<String>, cache: MatchCache) -> Self {
        Self {
            repo,
            team_id: team_id.into(),
            cache,
        }
    }

    pub fn cache(&self) -> &MatchCache {
        &self.cache
    }

    /// Candidates for a token, served from the cache when possible.
    async fn candidates<D>(
        &mut self,
        destination: &D,
        token: &str,
    ) -> crate::platform::Result<&[DestinationIssue]>
    where
        D: DestinationApi + ?Sized,
    {
        if !self.cache.entries.contains_key(token) {
            let filter = IssueFilter {
                team_id: self.team_id.clone(),
                title_equals: None,
                description_contains: Some(token.to_string()),
            };
            let found = destination.find_issues(&filter).await?;
            self.cache.insert(token.to_string(), found);
        }
        Ok(self.cache.get(token).unwrap_or_default())
    }

    /// Match every source issue, one destination query per distinct token.
    ///
    /// A failed query drops only its own source issue.
    pub async fn match_issues<D>(
        &mut self,
        destination: &D,
        sources: &[SourceIssue],
        on_progress: Option<&ProgressCallback>,
    ) -> IssueMatches
    where
        D: DestinationApi + ?Sized,
    {
        emit(
            on_progress,
            SyncProgress::MatchingIssues {
                count: sources.len(),
            },
        );

        let mut outcome = IssueMatches::default();

        for source in sources {
            let reference = BackReference::new(self.repo.clone(), source.number);
            let token = reference.token();

            let candidates = match self.candidates(destination, &token).await {
                Ok(candidates) => candidates,
                Err(e) => {
                    tracing::warn!(
                        number = source.number,
                        token = %token,
                        error = %e,
                        "Destination search failed, skipping issue"
                    );
                    emit(
                        on_progress,
                        SyncProgress::MatchError {
                            number: source.number,
                            error: e.to_string(),
                        },
                    );
                    outcome.failed.push(source.number);
                    continue;
                }
            };

            let destinations: Vec<DestinationIssue> = candidates
                .iter()
                .filter(|candidate| is_cross_reference(source, &token, candidate))
                .cloned()
                .collect();

            if destinations.is_empty() {
                tracing::info!(
                    number = source.number,
                    title = %source.title,
                    "No destination issue references this issue"
                );
                emit(
                    on_progress,
                    SyncProgress::Unmatched {
                        number: source.number,
                        title: source.title.clone(),
                    },
                );
                outcome.unmatched.push(source.number);
                continue;
            }

            emit(
                on_progress,
                SyncProgress::Matched {
                    number: source.number,
                    identifiers: destinations.iter().map(|d| d.identifier.clone()).collect(),
                },
            );
            outcome.matched.push(IssueMatch {
                source: source.clone(),
                reference,
                destinations,
            });
        }

        emit(
            on_progress,
            SyncProgress::MatchingComplete {
                pairs: outcome.pair_count(),
                unmatched: outcome.unmatched.len(),
            },
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::platform::{DestinationActor, IssueUpdate, PlatformError, Result, Team};

    fn source(number: u64, title: &str) -> SourceIssue {
        SourceIssue {
            number,
            title: title.to_string(),
            raw_field_value: Some("alice".to_string()),
            url: format!("https://github.com/owner/repo/issues/{number}"),
        }
    }

    fn dest(id: &str, title: &str, description: &str) -> DestinationIssue {
        DestinationIssue {
            id: id.to_string(),
            identifier: id.to_uppercase(),
            title: title.to_string(),
            description: description.to_string(),
            assignee_id: None,
            priority: 0,
        }
    }

    /// Destination that answers every search with a fixed candidate list
    /// (ignoring the filter), so local verification is what is under test.
    struct CannedDestination {
        candidates: Vec<DestinationIssue>,
        fail_on: Option<String>,
        queries: Mutex<Vec<IssueFilter>>,
    }

    impl CannedDestination {
        fn new(candidates: Vec<DestinationIssue>) -> Self {
            Self {
                candidates,
                fail_on: None,
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl DestinationApi for CannedDestination {
        async fn list_teams(&self) -> Result<Vec<Team>> {
            Ok(Vec::new())
        }

        async fn list_actors(&self) -> Result<Vec<DestinationActor>> {
            Ok(Vec::new())
        }

        async fn find_issues(&self, filter: &IssueFilter) -> Result<Vec<DestinationIssue>> {
            self.queries.lock().unwrap().push(filter.clone());
            if filter.description_contains.is_some()
                && filter.description_contains == self.fail_on
            {
                return Err(PlatformError::network("connection reset"));
            }
            Ok(self.candidates.clone())
        }

        async fn update_issue(&self, _id: &str, _update: &IssueUpdate) -> Result<()> {
            Ok(())
        }
    }

    fn matcher() -> CrossReferenceMatcher {
        CrossReferenceMatcher::new(RepoCoordinates::new("owner", "repo"), "team-1", MatchCache::new())
    }

    #[test]
    fn test_contains_token_digit_boundary() {
        assert!(contains_token("See owner/repo/issues/4.", "owner/repo/issues/4"));
        assert!(contains_token(
            "https://github.com/owner/repo/issues/4",
            "owner/repo/issues/4"
        ));
        assert!(!contains_token("owner/repo/issues/42", "owner/repo/issues/4"));
        assert!(!contains_token("xowner/repo/issues/4", "owner/repo/issues/4"));
        assert!(contains_token(
            "owner/repo/issues/42 and owner/repo/issues/4",
            "owner/repo/issues/4"
        ));
        assert!(!contains_token("anything", ""));
    }

    #[test]
    fn test_is_cross_reference_title_sensitivity() {
        let src = source(42, "Fix login bug");
        let token = "owner/repo/issues/42";
        assert!(is_cross_reference(
            &src,
            token,
            &dest("a", "  Fix login bug\n", "owner/repo/issues/42")
        ));
        assert!(!is_cross_reference(
            &src,
            token,
            &dest("b", "fix login bug", "owner/repo/issues/42")
        ));
        assert!(!is_cross_reference(
            &src,
            token,
            &dest("c", "Fix login bug", "owner/repo/issues/43")
        ));
    }

    #[tokio::test]
    async fn test_match_issues_soundness() {
        let destination = CannedDestination::new(vec![
            dest("a", "Fix login bug", "Synced from owner/repo/issues/42"),
            dest("b", "Fix login bug", "Synced from owner/repo/issues/420"),
            dest("c", "Fix login bug", "Synced from other/repo/issues/42"),
            dest("d", "Fix login bug", "Mirror: owner/repo/issues/42"),
        ]);
        let mut matcher = matcher();

        let matches = matcher
            .match_issues(&destination, &[source(42, "Fix login bug")], None)
            .await;

        let ids: Vec<&str> = matches
            .get(42)
            .unwrap()
            .iter()
            .map(|d| d.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "d"]);
        assert_eq!(matches.pair_count(), 2);

        for issue in matches.get(42).unwrap() {
            assert!(contains_token(&issue.description, "owner/repo/issues/42"));
        }
    }

    #[tokio::test]
    async fn test_match_issues_unmatched_and_query_shape() {
        let destination = CannedDestination::new(vec![dest(
            "a",
            "Something else",
            "owner/repo/issues/7",
        )]);
        let mut matcher = matcher();

        let matches = matcher
            .match_issues(&destination, &[source(7, "Crash on start")], None)
            .await;
        assert!(matches.matched.is_empty());
        assert_eq!(matches.unmatched, vec![7]);

        let queries = destination.queries.lock().unwrap();
        assert_eq!(queries[0].team_id, "team-1");
        assert_eq!(
            queries[0].description_contains.as_deref(),
            Some("owner/repo/issues/7")
        );
    }

    #[tokio::test]
    async fn test_match_cache_avoids_repeat_queries() {
        let destination = CannedDestination::new(vec![dest(
            "a",
            "Fix login bug",
            "owner/repo/issues/42",
        )]);
        let mut matcher = matcher();
        let sources = [source(42, "Fix login bug")];

        matcher.match_issues(&destination, &sources, None).await;
        matcher.match_issues(&destination, &sources, None).await;

        assert_eq!(destination.queries.lock().unwrap().len(), 1);
        assert_eq!(matcher.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_query_failure_drops_only_that_issue() {
        let mut destination = CannedDestination::new(vec![
            dest("a", "First", "owner/repo/issues/1"),
            dest("c", "Third", "owner/repo/issues/3"),
        ]);
        destination.fail_on = Some("owner/repo/issues/2".to_string());
        let mut matcher = matcher();

        let matches = matcher
            .match_issues(
                &destination,
                &[source(1, "First"), source(2, "Second"), source(3, "Third")],
                None,
            )
            .await;

        assert_eq!(matches.failed, vec![2]);
        let numbers: Vec<u64> = matches.matched.iter().map(|m| m.source.number).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert!(matcher.cache().get("owner/repo/issues/2").is_none());
    }
}
