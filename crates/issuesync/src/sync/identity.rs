//! Source actor to destination actor resolution.
//!
//! Resolution is exact-match only. A handle that matches nothing, or matches
//! more than one actor, stays unresolved.

use std::collections::HashMap;

use crate::platform::{ActorIdentity, DestinationActor, SourceApi};

/// Index slot for a normalized key.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Unique(usize),
    /// More than one actor shares this key.
    Ambiguous,
}

fn normalize(key: &str) -> String {
    key.trim().to_lowercase()
}

fn insert_key(index: &mut HashMap<String, Slot>, key: String, position: usize) {
    if key.is_empty() {
        return;
    }
    index
        .entry(key)
        .and_modify(|slot| *slot = Slot::Ambiguous)
        .or_insert(Slot::Unique(position));
}

/// Destination actors indexed by lower-cased email and display name.
#[derive(Debug, Default)]
pub struct ActorDirectory {
    actors: Vec<DestinationActor>,
    by_email: HashMap<String, Slot>,
    by_name: HashMap<String, Slot>,
    by_id: HashMap<String, usize>,
}

impl ActorDirectory {
    pub fn new(actors: Vec<DestinationActor>) -> Self {
        let mut by_email = HashMap::new();
        let mut by_name = HashMap::new();
        let mut by_id = HashMap::new();

        for (position, actor) in actors.iter().enumerate() {
            if let Some(email) = &actor.email {
                insert_key(&mut by_email, normalize(email), position);
            }
            insert_key(&mut by_name, normalize(&actor.display_name), position);
            by_id.insert(actor.id.clone(), position);
        }

        Self {
            actors,
            by_email,
            by_name,
            by_id,
        }
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }

    fn lookup(&self, index: &HashMap<String, Slot>, key: &str) -> Option<&DestinationActor> {
        match index.get(&normalize(key))? {
            Slot::Unique(position) => self.actors.get(*position),
            Slot::Ambiguous => {
                tracing::debug!(key, "Ambiguous actor key, ignoring");
                None
            }
        }
    }

    /// Case-insensitive email lookup.
    pub fn by_email(&self, email: &str) -> Option<&DestinationActor> {
        self.lookup(&self.by_email, email)
    }

    /// Case-insensitive display name lookup.
    pub fn by_display_name(&self, name: &str) -> Option<&DestinationActor> {
        self.lookup(&self.by_name, name)
    }

    /// Exact id lookup.
    pub fn by_id(&self, id: &str) -> Option<&DestinationActor> {
        self.by_id.get(id).and_then(|p| self.actors.get(*p))
    }
}

/// Per-run memo of handle resolutions, including misses.
///
/// Entries are never invalidated during a run.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: HashMap<String, Option<String>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Some(result)` if the handle was resolved before.
    pub fn get(&self, handle: &str) -> Option<Option<&str>> {
        self.entries
            .get(&normalize(handle))
            .map(|resolved| resolved.as_deref())
    }

    pub fn insert(&mut self, handle: &str, resolved: Option<String>) {
        self.entries.entry(normalize(handle)).or_insert(resolved);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps source actors to destination actor ids.
///
/// Strategies, first hit wins:
/// 1. override table (target matched as display name, email or id)
/// 2. email
/// 3. display name
/// 4. source handle as a display name
#[derive(Debug, Default)]
pub struct IdentityResolver {
    /// Keyed by lower-cased source handle.
    overrides: HashMap<String, String>,
    cache: ResolutionCache,
}

impl IdentityResolver {
    pub fn new(overrides: &HashMap<String, String>, cache: ResolutionCache) -> Self {
        let overrides = overrides
            .iter()
            .map(|(handle, target)| (normalize(handle), target.trim().to_string()))
            .collect();
        Self { overrides, cache }
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    fn from_override<'d>(
        &self,
        handle: &str,
        directory: &'d ActorDirectory,
    ) -> Option<&'d DestinationActor> {
        let target = self.overrides.get(&normalize(handle))?;
        let found = directory
            .by_display_name(target)
            .or_else(|| directory.by_email(target))
            .or_else(|| directory.by_id(target));
        if found.is_none() {
            tracing::warn!(
                handle,
                target = %target,
                "Override target not found among destination actors"
            );
        }
        found
    }

    fn find<'d>(
        &self,
        actor: &ActorIdentity,
        directory: &'d ActorDirectory,
    ) -> Option<&'d DestinationActor> {
        self.from_override(&actor.source_handle, directory)
            .or_else(|| actor.email.as_deref().and_then(|e| directory.by_email(e)))
            .or_else(|| {
                actor
                    .display_name
                    .as_deref()
                    .and_then(|n| directory.by_display_name(n))
            })
            .or_else(|| directory.by_display_name(&actor.source_handle))
    }

    /// Resolve an actor, consulting and filling the cache.
    pub fn resolve(&mut self, actor: &ActorIdentity, directory: &ActorDirectory) -> Option<String> {
        if let Some(cached) = self.cache.get(&actor.source_handle) {
            return cached.map(str::to_string);
        }

        let resolved = self.find(actor, directory).map(|a| a.id.clone());
        tracing::debug!(
            handle = %actor.source_handle,
            resolved = resolved.as_deref().unwrap_or("none"),
            "Resolved actor"
        );
        self.cache.insert(&actor.source_handle, resolved.clone());
        resolved
    }

    /// Resolve a bare handle, fetching its details from the source on a
    /// cache miss.
    ///
    /// A failed or empty lookup degrades to resolving the handle alone.
    pub async fn resolve_handle<S>(
        &mut self,
        handle: &str,
        source: &S,
        directory: &ActorDirectory,
    ) -> Option<String>
    where
        S: SourceApi + ?Sized,
    {
        if let Some(cached) = self.cache.get(handle) {
            return cached.map(str::to_string);
        }

        let actor = match source.actor_details(handle).await {
            Ok(Some(actor)) => actor,
            Ok(None) => ActorIdentity::handle_only(handle),
            Err(e) => {
                tracing::warn!(handle, error = %e, "Actor lookup failed, using handle only");
                ActorIdentity::handle_only(handle)
            }
        };
        self.resolve(&actor, directory)
    }
}
