//! Ticket identifiers mined from commit messages, and their enriched form.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// An issue-tracker identifier such as `ENG-123`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TicketReference(String);

impl TicketReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Project key: everything before the first `-` (`ENG` for `ENG-123`).
    pub fn project(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl std::fmt::Display for TicketReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fields an issue tracker returns for a ticket.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TicketDetails {
    pub title: String,
    pub state: Option<String>,
    pub assignee: Option<String>,
}

/// A ticket as reported: always the ID, plus tracker fields when enrichment succeeded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Ticket {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
}

impl Ticket {
    /// Unenriched ticket carrying only its ID.
    pub fn bare(reference: &TicketReference) -> Self {
        Self {
            id: reference.as_str().to_string(),
            title: None,
            state: None,
            assignee: None,
        }
    }

    pub fn enriched(reference: &TicketReference, details: TicketDetails) -> Self {
        Self {
            id: reference.as_str().to_string(),
            title: Some(details.title),
            state: details.state,
            assignee: details.assignee,
        }
    }

    pub fn is_enriched(&self) -> bool {
        self.title.is_some()
    }
}

/// Group ticket IDs by project key. IDs are sorted and deduplicated per project.
pub fn group_by_project<'a, I>(ids: I) -> BTreeMap<String, Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for id in ids {
        let reference = TicketReference::new(id);
        grouped
            .entry(reference.project().to_string())
            .or_default()
            .push(id.to_string());
    }
    for ids in grouped.values_mut() {
        ids.sort();
        ids.dedup();
    }
    grouped
}
