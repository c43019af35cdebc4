//! The reconciliation core.
//!
//! # Module Structure
//!
//! - [`types`] - Core types: `SourceIssue`, `UpdateIntent`, `SyncOptions`, `SyncReport`
//! - [`progress`] - Progress reporting: `SyncProgress`, `ProgressCallback`, `emit()`
//! - [`collector`] - Open issue collection with quota early-exit
//! - [`identity`] - Source actor to destination actor resolution
//! - [`matcher`] - Back-reference matching
//! - [`translate`] - Source values to destination values
//! - [`planner`] - Minimal update planning
//! - [`executor`] - Update application
//! - [`engine`] - Run orchestration: `SyncEngine`
//!
//! # Example
//!
//! ```ignore
//! use issuesync::sync::{SyncEngine, SyncOptions, TrackedField};
//! use issuesync::platform::RepoCoordinates;
//!
//! let options = SyncOptions::new(RepoCoordinates::parse("acme/widgets")?, "ENG", TrackedField::Priority);
//! let report = SyncEngine::new(&source, &destination, &options).run().await?;
//! println!("Updated {} issues", report.updated);
//! ```

pub mod collector;
pub mod engine;
pub mod executor;
pub mod identity;
pub mod matcher;
pub mod planner;
mod progress;
pub mod translate;
mod types;

pub use types::{
    BackReference, DEFAULT_QUOTA_LOW_WATER, FieldChange, SourceIssue, SyncOptions, SyncReport,
    TrackedField, UpdateFailure, UpdateIntent,
};

pub use progress::{ProgressCallback, SyncProgress, emit};

pub use collector::{Collection, SourceCollector};
pub use engine::{SyncEngine, SyncError, find_team};
pub use executor::{ExecutionReport, UpdateExecutor};
pub use identity::{ActorDirectory, IdentityResolver, ResolutionCache};
pub use matcher::{CrossReferenceMatcher, IssueMatch, IssueMatches, MatchCache};
pub use planner::{MatchedPair, plan};
pub use translate::{TargetValue, priority_from_label};
