//! Trait seams for the collaborators the pipeline talks to.
//!
//! - `CommitSource`: commit subject lines between two tags of a repository
//! - `IssueTracker`: ticket details by identifier
//!
//! Both traits are async and transport-agnostic. Network implementations
//! live in `tagdiff-sources`; in-memory fakes are provided for testing via
//! the `fakes` module.

use async_trait::async_trait;

use crate::domain::{CommitRangeError, EnrichmentError, TicketDetails, TicketReference};

/// Lists commit subjects reachable from `head` but not from `base`.
///
/// Order of the returned messages is unspecified and must not be relied on.
#[async_trait]
pub trait CommitSource: Send + Sync {
    /// `repo` is an `owner/repo` slug.
    async fn commit_messages(
        &self,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<String>, CommitRangeError>;
}

/// Looks up ticket details in an issue tracker.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// `Ok(None)` means the tracker answered but does not know the ticket.
    async fn lookup(
        &self,
        id: &TicketReference,
    ) -> Result<Option<TicketDetails>, EnrichmentError>;
}
