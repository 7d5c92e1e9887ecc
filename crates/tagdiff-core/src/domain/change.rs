//! Change records produced by reconciling deployed and declared versions.

use serde::{Deserialize, Serialize};

/// Classification of a single [`ChangeRecord`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ChangeStatus {
    Unchanged,
    Changed,
    /// Present in the deployed source only.
    DeployedOnly,
    /// Present in the declared (.env) source only.
    DeclaredOnly,
}

/// One service's deployed vs. declared version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub service: String,

    /// Deployed version; `None` when the deployed source does not list the service.
    pub current_version: Option<String>,

    /// Declared version; `None` when the .env does not declare the service.
    pub new_version: Option<String>,

    /// `true` iff the two sides differ as strings (a missing side always differs).
    pub changed: bool,
}

impl ChangeRecord {
    pub fn new(
        service: impl Into<String>,
        current_version: Option<String>,
        new_version: Option<String>,
    ) -> Self {
        let changed = current_version != new_version;
        Self {
            service: service.into(),
            current_version,
            new_version,
            changed,
        }
    }

    pub fn status(&self) -> ChangeStatus {
        match (&self.current_version, &self.new_version) {
            (Some(_), None) => ChangeStatus::DeployedOnly,
            (None, Some(_)) => ChangeStatus::DeclaredOnly,
            _ if self.changed => ChangeStatus::Changed,
            _ => ChangeStatus::Unchanged,
        }
    }
}

/// Per-status counts over a reconciliation result.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChangeSummary {
    pub unchanged: usize,
    pub changed: usize,
    pub deployed_only: usize,
    pub declared_only: usize,
}

impl ChangeSummary {
    pub fn from_records(records: &[ChangeRecord]) -> Self {
        let mut summary = Self::default();
        for record in records {
            match record.status() {
                ChangeStatus::Unchanged => summary.unchanged += 1,
                ChangeStatus::Changed => summary.changed += 1,
                ChangeStatus::DeployedOnly => summary.deployed_only += 1,
                ChangeStatus::DeclaredOnly => summary.declared_only += 1,
            }
        }
        summary
    }

    pub fn has_differences(&self) -> bool {
        self.changed > 0 || self.deployed_only > 0 || self.declared_only > 0
    }

    pub fn total(&self) -> usize {
        self.unchanged + self.changed + self.deployed_only + self.declared_only
    }
}
