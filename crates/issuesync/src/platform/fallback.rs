//! Primary/secondary source composition.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use super::errors::Result;
use super::types::{ActorIdentity, IssuePage, SourceApi};

/// A `SourceApi` that prefers `primary` and falls back to `secondary`.
///
/// The first transport error from the primary switches every later call to
/// the secondary, and the failing call is retried there once. Errors that
/// are not transport failures propagate unchanged without switching.
#[derive(Debug)]
pub struct FallbackSource<P, S> {
    primary: P,
    secondary: S,
    switched: AtomicBool,
}

impl<P: SourceApi, S: SourceApi> FallbackSource<P, S> {
    pub fn new(primary: P, secondary: S) -> Self {
        Self {
            primary,
            secondary,
            switched: AtomicBool::new(false),
        }
    }

    /// Whether the secondary strategy is in use.
    pub fn is_switched(&self) -> bool {
        self.switched.load(Ordering::Relaxed)
    }

    fn switch(&self, operation: &str, reason: &impl std::fmt::Display) {
        if !self.switched.swap(true, Ordering::Relaxed) {
            tracing::warn!(
                operation,
                error = %reason,
                "Primary collection strategy failed, falling back to issue scan"
            );
        }
    }
}

#[async_trait]
impl<P: SourceApi, S: SourceApi> SourceApi for FallbackSource<P, S> {
    async fn list_open_issues(&self, page: u32) -> Result<IssuePage> {
        if self.is_switched() {
            return self.secondary.list_open_issues(page).await;
        }
        match self.primary.list_open_issues(page).await {
            Err(e) if e.is_transport() => {
                self.switch("list_open_issues", &e);
                self.secondary.list_open_issues(page).await
            }
            other => other,
        }
    }

    fn quota_remaining(&self) -> Option<usize> {
        if self.is_switched() {
            self.secondary.quota_remaining()
        } else {
            self.primary.quota_remaining()
        }
    }

    async fn actor_details(&self, handle: &str) -> Result<Option<ActorIdentity>> {
        if self.is_switched() {
            return self.secondary.actor_details(handle).await;
        }
        match self.primary.actor_details(handle).await {
            Err(e) if e.is_transport() => {
                self.switch("actor_details", &e);
                self.secondary.actor_details(handle).await
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;
    use crate::platform::{PlatformError, RemoteIssue};

    struct ScriptedSource {
        name: &'static str,
        pages: Mutex<VecDeque<Result<IssuePage>>>,
        calls: Mutex<Vec<u32>>,
        quota: Option<usize>,
    }

    impl ScriptedSource {
        fn new(name: &'static str, pages: Vec<Result<IssuePage>>, quota: Option<usize>) -> Self {
            Self {
                name,
                pages: Mutex::new(pages.into()),
                calls: Mutex::new(Vec::new()),
                quota,
            }
        }

        fn calls(&self) -> Vec<u32> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SourceApi for ScriptedSource {
        async fn list_open_issues(&self, page: u32) -> Result<IssuePage> {
            self.calls.lock().unwrap().push(page);
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(IssuePage::default()))
        }

        fn quota_remaining(&self) -> Option<usize> {
            self.quota
        }

        async fn actor_details(&self, handle: &str) -> Result<Option<ActorIdentity>> {
            Ok(Some(ActorIdentity {
                source_handle: handle.to_string(),
                display_name: Some(self.name.to_string()),
                email: None,
            }))
        }
    }

    fn page_of(number: u64) -> IssuePage {
        IssuePage {
            items: vec![RemoteIssue {
                number,
                title: format!("Issue {number}"),
                url: String::new(),
                is_pull_request: false,
                assignees: Vec::new(),
                labels: Vec::new(),
            }],
            has_more: true,
        }
    }

    #[tokio::test]
    async fn uses_primary_while_healthy() {
        let source = FallbackSource::new(
            ScriptedSource::new("primary", vec![Ok(page_of(1))], Some(500)),
            ScriptedSource::new("secondary", vec![], Some(900)),
        );

        let page = source.list_open_issues(1).await.unwrap();
        assert_eq!(page.items[0].number, 1);
        assert!(!source.is_switched());
        assert_eq!(source.quota_remaining(), Some(500));
        assert!(source.secondary.calls().is_empty());
    }

    #[tokio::test]
    async fn transport_error_switches_and_retries_once_on_secondary() {
        let source = FallbackSource::new(
            ScriptedSource::new(
                "primary",
                vec![Ok(page_of(1)), Err(PlatformError::network("reset"))],
                Some(500),
            ),
            ScriptedSource::new("secondary", vec![Ok(page_of(2)), Ok(page_of(3))], Some(900)),
        );

        source.list_open_issues(1).await.unwrap();
        let page = source.list_open_issues(2).await.unwrap();
        assert_eq!(page.items[0].number, 2);
        assert!(source.is_switched());

        let page = source.list_open_issues(3).await.unwrap();
        assert_eq!(page.items[0].number, 3);

        assert_eq!(source.primary.calls(), vec![1, 2]);
        assert_eq!(source.secondary.calls(), vec![2, 3]);
        assert_eq!(source.quota_remaining(), Some(900));

        let actor = source.actor_details("alice").await.unwrap().unwrap();
        assert_eq!(actor.display_name.as_deref(), Some("secondary"));
    }

    #[tokio::test]
    async fn non_transport_errors_do_not_switch() {
        let source = FallbackSource::new(
            ScriptedSource::new("primary", vec![Err(PlatformError::AuthRequired)], None),
            ScriptedSource::new("secondary", vec![Ok(page_of(1))], None),
        );

        let err = source.list_open_issues(1).await.unwrap_err();
        assert!(matches!(err, PlatformError::AuthRequired));
        assert!(!source.is_switched());
        assert!(source.secondary.calls().is_empty());
    }

    #[tokio::test]
    async fn secondary_failure_after_switch_propagates() {
        let source = FallbackSource::new(
            ScriptedSource::new("primary", vec![Err(PlatformError::network("reset"))], None),
            ScriptedSource::new(
                "secondary",
                vec![Err(PlatformError::network("also down"))],
                None,
            ),
        );

        let err = source.list_open_issues(1).await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(source.secondary.calls(), vec![1]);
    }
}
