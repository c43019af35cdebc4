//! Field translation from source values to destination values.

use crate::platform::SourceApi;

use super::identity::{ActorDirectory, IdentityResolver};
use super::types::{SourceIssue, TrackedField};

/// Priority tokens and their destination values, in lookup order.
const PRIORITY_TOKENS: [(&str, i32); 3] = [("p1", 1), ("p2", 2), ("p3", 3)];

/// Map a priority label to the destination scale.
///
/// Substring match on the lower-cased label; unrecognised or absent labels
/// map to 0 (no priority). Never fails.
pub fn priority_from_label(label: Option<&str>) -> i32 {
    let Some(label) = label else {
        return 0;
    };
    let label = label.to_lowercase();
    PRIORITY_TOKENS
        .iter()
        .find(|(token, _)| label.contains(token))
        .map(|(_, value)| *value)
        .unwrap_or(0)
}

/// Desired destination value for one source issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetValue {
    /// Resolved destination actor id, or `None` when the source has no
    /// assignee or it could not be resolved.
    Assignee(Option<String>),
    Priority(i32),
}

/// Translate a source issue's tracked field.
///
/// Assignee translation goes through the identity resolver and may call the
/// source for actor details on a cache miss.
pub async fn translate<S>(
    field: TrackedField,
    issue: &SourceIssue,
    resolver: &mut IdentityResolver,
    source: &S,
    directory: &ActorDirectory,
) -> TargetValue
where
    S: SourceApi + ?Sized,
{
    match field {
        TrackedField::Priority => {
            TargetValue::Priority(priority_from_label(issue.raw_field_value.as_deref()))
        }
        TrackedField::Assignee => match issue.raw_field_value.as_deref() {
            Some(handle) => {
                TargetValue::Assignee(resolver.resolve_handle(handle, source, directory).await)
            }
            None => TargetValue::Assignee(None),
        },
    }
}
