//! Reconciliation report model, assembly, and writers.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::artifact::write_json_artifact;
use crate::domain::{group_by_project, Ticket};
use crate::obs;

/// Outcome of processing one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Commit range scanned.
    Success,
    /// Listed with identical tags; not scanned.
    Unchanged,
    /// No deployed version to compare from.
    NewService,
    /// No declared version to compare to.
    NoNewVersion,
    /// Commit range could not be listed.
    Error,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Unchanged => "unchanged",
            Self::NewService => "new_service",
            Self::NoNewVersion => "no_new_version",
            Self::Error => "error",
        }
    }
}

/// Per-service section of the report.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceReport {
    pub service: String,
    pub repository: String,
    pub current_tag: String,
    pub new_tag: String,
    pub commits_ahead: usize,
    pub tickets: Vec<Ticket>,
    pub ticket_count: usize,
    pub status: ServiceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServiceReport {
    /// Report row with no commits scanned.
    pub fn unscanned(
        service: &str,
        repository: &str,
        current_tag: &str,
        new_tag: &str,
        status: ServiceStatus,
    ) -> Self {
        Self {
            service: service.to_string(),
            repository: repository.to_string(),
            current_tag: current_tag.to_string(),
            new_tag: new_tag.to_string(),
            commits_ahead: 0,
            tickets: Vec::new(),
            ticket_count: 0,
            status,
            error: None,
        }
    }
}

/// Run counters gathered by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTally {
    /// Input rows examined.
    pub total_services: usize,
    /// Rows whose tags differ.
    pub services_with_changes: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetadata {
    pub generated_at: DateTime<Utc>,
    pub total_services: usize,
    pub services_with_changes: usize,
    pub total_unique_tickets: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

/// The document written by `tagdiff process`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub metadata: ReportMetadata,
    pub services: Vec<ServiceReport>,
    pub all_tickets: Vec<String>,
    pub tickets_by_project: BTreeMap<String, Vec<String>>,
}

/// Assemble a report stamped with the current time.
pub fn assemble_report(
    services: Vec<ServiceReport>,
    tally: RunTally,
    run_id: Option<String>,
) -> ReconciliationReport {
    assemble_report_at(services, tally, run_id, Utc::now())
}

/// Assemble a report with an explicit timestamp.
///
/// `ticket_count` is recomputed from each service's tickets; `allTickets` is
/// the deduplicated union of every service's ticket IDs in first-seen order.
pub fn assemble_report_at(
    mut services: Vec<ServiceReport>,
    tally: RunTally,
    run_id: Option<String>,
    generated_at: DateTime<Utc>,
) -> ReconciliationReport {
    let mut seen = HashSet::new();
    let mut all_tickets = Vec::new();

    for service in &mut services {
        service.ticket_count = service.tickets.len();
        for ticket in &service.tickets {
            if seen.insert(ticket.id.clone()) {
                all_tickets.push(ticket.id.clone());
            }
        }
    }

    let tickets_by_project = group_by_project(all_tickets.iter().map(String::as_str));
    obs::emit_report_assembled(services.len(), all_tickets.len());

    ReconciliationReport {
        metadata: ReportMetadata {
            generated_at,
            total_services: tally.total_services,
            services_with_changes: tally.services_with_changes,
            total_unique_tickets: all_tickets.len(),
            processed: tally.processed,
            skipped: tally.skipped,
            failed: tally.failed,
            run_id,
        },
        services,
        all_tickets,
        tickets_by_project,
    }
}

/// Write the report as JSON, creating parent directories as needed.
pub fn write_report_json(path: &Path, report: &ReconciliationReport, pretty: bool) -> Result<()> {
    write_json_artifact(path, report, pretty).context("write reconciliation report")
}

/// Render the plain-text ticket listing for one tag range.
pub fn render_ticket_listing(
    repo: &str,
    from_tag: &str,
    to_tag: &str,
    tickets: &[Ticket],
    generated_at: DateTime<Utc>,
) -> String {
    let rule = "=".repeat(80);
    let mut out = String::new();
    out.push_str("Tickets Found in Git Tag Comparison\n");
    out.push_str(&format!("{}\n\n", rule));
    out.push_str(&format!("Repository: {}\n", repo));
    out.push_str(&format!("From Tag: {}\n", from_tag));
    out.push_str(&format!("To Tag: {}\n", to_tag));
    out.push_str(&format!(
        "Extraction Date: {}\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    ));

    if tickets.is_empty() {
        out.push_str("No tickets found in the commit messages.\n");
        return out;
    }

    out.push_str(&format!("Total tickets found: {}\n\n", tickets.len()));
    out.push_str(&format!("Tickets:\n{}\n", rule));
    for ticket in tickets {
        match &ticket.title {
            Some(title) => {
                out.push_str(&format!("\n{}: {}\n", ticket.id, title));
                out.push_str(&format!(
                    "  State: {} | Assignee: {}\n",
                    ticket.state.as_deref().unwrap_or("-"),
                    ticket.assignee.as_deref().unwrap_or("Unassigned")
                ));
            }
            None => out.push_str(&format!("\n{}\n", ticket.id)),
        }
    }

    let projects = group_by_project(tickets.iter().map(|t| t.id.as_str()));
    out.push_str(&format!("\n\nSummary:\n{}\n", rule));
    out.push_str(&format!("Total unique tickets: {}\n", tickets.len()));
    out.push_str(&format!(
        "Projects involved: {}\n",
        projects.keys().cloned().collect::<Vec<_>>().join(", ")
    ));
    for (project, ids) in &projects {
        out.push_str(&format!("  - {}: {} tickets\n", project, ids.len()));
    }
    out
}
