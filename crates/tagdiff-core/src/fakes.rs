//! In-memory fakes for the collaborator traits (testing only)
//!
//! Provides `StaticCommitSource` and `MemoryIssueTracker`, which satisfy the
//! trait contracts without any network access and record the calls made.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::{CommitRangeError, EnrichmentError, TicketDetails, TicketReference};
use crate::source_traits::{CommitSource, IssueTracker};

// ---------------------------------------------------------------------------
// StaticCommitSource
// ---------------------------------------------------------------------------

type RangeKey = (String, String, String);

/// Commit source answering from a fixed table of `(repo, base, head)` ranges.
///
/// Unknown ranges fail with `CommitRangeError::NotFound`.
#[derive(Debug, Default)]
pub struct StaticCommitSource {
    ranges: HashMap<RangeKey, Result<Vec<String>, CommitRangeError>>,
    calls: Mutex<Vec<RangeKey>>,
}

impl StaticCommitSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_range<S: Into<String>>(
        mut self,
        repo: &str,
        base: &str,
        head: &str,
        messages: impl IntoIterator<Item = S>,
    ) -> Self {
        let messages = messages.into_iter().map(Into::into).collect();
        self.ranges.insert(key(repo, base, head), Ok(messages));
        self
    }

    pub fn with_failure(mut self, repo: &str, base: &str, head: &str, err: CommitRangeError) -> Self {
        self.ranges.insert(key(repo, base, head), Err(err));
        self
    }

    /// Ranges requested so far, in call order.
    pub fn calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

fn key(repo: &str, base: &str, head: &str) -> RangeKey {
    (repo.to_string(), base.to_string(), head.to_string())
}

#[async_trait]
impl CommitSource for StaticCommitSource {
    async fn commit_messages(
        &self,
        repo: &str,
        base: &str,
        head: &str,
    ) -> Result<Vec<String>, CommitRangeError> {
        let k = key(repo, base, head);
        self.calls.lock().unwrap().push(k.clone());
        self.ranges
            .get(&k)
            .cloned()
            .unwrap_or_else(|| {
                Err(CommitRangeError::NotFound {
                    repo: repo.to_string(),
                    base: base.to_string(),
                    head: head.to_string(),
                })
            })
    }
}

// ---------------------------------------------------------------------------
// MemoryIssueTracker
// ---------------------------------------------------------------------------

/// Issue tracker backed by a `HashMap<id, details>`.
///
/// IDs with a registered failure return that error; unknown IDs return
/// `Ok(None)`.
#[derive(Debug, Default)]
pub struct MemoryIssueTracker {
    tickets: HashMap<String, TicketDetails>,
    failures: HashMap<String, EnrichmentError>,
    lookups: Mutex<Vec<String>>,
}

impl MemoryIssueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ticket(mut self, id: &str, details: TicketDetails) -> Self {
        self.tickets.insert(id.to_string(), details);
        self
    }

    pub fn with_failure(mut self, id: &str, err: EnrichmentError) -> Self {
        self.failures.insert(id.to_string(), err);
        self
    }

    /// IDs looked up so far, in call order.
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl IssueTracker for MemoryIssueTracker {
    async fn lookup(
        &self,
        id: &TicketReference,
    ) -> Result<Option<TicketDetails>, EnrichmentError> {
        self.lookups.lock().unwrap().push(id.to_string());
        if let Some(err) = self.failures.get(id.as_str()) {
            return Err(err.clone());
        }
        Ok(self.tickets.get(id.as_str()).cloned())
    }
}
