//! Structured observability hooks for tagdiff run lifecycle events.
//!
//! This module provides:
//! - Run-scoped tracing spans via `RunSpan`
//! - Emission functions for pipeline milestones (fetch, parse, reconcile,
//!   per-service processing, enrichment degradation, report assembly)
//!
//! Every event carries an `event = "..."` field so JSON log consumers can
//! filter on it.

use tracing::{info, warn, Span};
use uuid::Uuid;

/// Run-scoped tracing span tagged with a run id.
///
/// The span is not entered on creation. Attach it to async work with
/// [`tracing::Instrument`], or enter it for synchronous sections:
///
/// ```ignore
/// let run = RunSpan::start();
/// let report = work().instrument(run.span()).await;
/// ```
#[derive(Debug, Clone)]
pub struct RunSpan {
    run_id: String,
    span: Span,
}

impl RunSpan {
    /// Create a span tagged with a fresh UUID v4 run id.
    pub fn start() -> Self {
        Self::with_id(&Uuid::new_v4().to_string())
    }

    /// Create a span tagged with the given run id.
    pub fn with_id(run_id: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            span: tracing::info_span!("tagdiff.run", run_id = %run_id),
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Handle to the span, for `.instrument(..)`.
    pub fn span(&self) -> Span {
        self.span.clone()
    }

    /// Enter the span until the guard drops. Do not hold across `.await`.
    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

/// Emit event: a source document was fetched.
pub fn emit_source_fetched(location: &str, bytes: usize) {
    info!(event = "source.fetched", location = %location, bytes = bytes);
}

/// Emit event: a document was normalized into a version map.
pub fn emit_versions_parsed(origin: &str, services: usize) {
    info!(event = "versions.parsed", origin = %origin, services = services);
}

/// Emit event: reconciliation finished.
pub fn emit_reconcile_completed(total: usize, changed: usize) {
    info!(event = "reconcile.completed", total = total, changed = changed);
}

/// Emit event: one service went through ticket extraction.
pub fn emit_service_processed(service: &str, status: &str, commits_ahead: usize, tickets: usize) {
    info!(
        event = "service.processed",
        service = %service,
        status = %status,
        commits_ahead = commits_ahead,
        tickets = tickets,
    );
}

/// Emit event: a ticket was reported without tracker details (warning level).
pub fn emit_enrichment_degraded(ticket_id: &str, reason: &dyn std::fmt::Display) {
    warn!(event = "enrichment.degraded", ticket_id = %ticket_id, reason = %reason);
}

/// Emit event: report assembled.
pub fn emit_report_assembled(services: usize, unique_tickets: usize) {
    info!(
        event = "report.assembled",
        services = services,
        unique_tickets = unique_tickets,
    );
}
