//! Linear as the destination tracker.
//!
//! Everything goes through the GraphQL endpoint; connections are followed
//! by cursor until exhausted.

mod client;
mod error;
mod types;

pub use client::LinearClient;
pub use error::LinearError;
pub use types::{DEFAULT_PAGE_SIZE, LINEAR_API_URL, issue_filter_json};
