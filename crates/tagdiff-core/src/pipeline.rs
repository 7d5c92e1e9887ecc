//! Ticket-extraction pipeline over intermediate service inputs.
//!
//! Services are handled strictly one after another; every commit listing
//! and tracker lookup is awaited before the next begins.

use tracing::{debug, warn};

use crate::domain::{Result, ServiceInput, TagdiffError};
use crate::enrich::TicketEnricher;
use crate::obs;
use crate::report::{assemble_report, ReconciliationReport, RunTally, ServiceReport, ServiceStatus};
use crate::source_traits::CommitSource;
use crate::tickets::TicketExtractor;

/// Knobs for [`process_services`].
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// List services whose tags are identical (status `unchanged`).
    pub include_unchanged: bool,
    /// Record per-service failures instead of aborting the run.
    pub keep_going: bool,
    /// Stamped into the report metadata.
    pub run_id: Option<String>,
}

/// Reduce a repository reference to an `owner/repo` slug.
///
/// Accepts `owner/repo`, `https://host/owner/repo[.git]` and
/// `git@host:owner/repo[.git]`.
pub fn repository_slug(repository: &str) -> Option<String> {
    let trimmed = repository.trim();
    let path = if let Some((_, rest)) = trimmed.split_once("://") {
        rest.split_once('/').map(|(_, path)| path)?
    } else if let Some((_, rest)) = trimmed.strip_prefix("git@").and_then(|r| r.split_once(':')) {
        rest
    } else {
        trimmed
    };

    let path = path.trim_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(repo), None) if !owner.is_empty() && !repo.is_empty() => {
            Some(format!("{}/{}", owner, repo))
        }
        _ => None,
    }
}

/// Run ticket extraction for every input row and assemble the report.
///
/// Per row, in order:
/// - both tags empty, or identical tags without `include_unchanged`: skipped
/// - empty `current_tag`: `new_service`, nothing scanned
/// - empty `new_tag`: `no_new_version`
/// - otherwise the commit range is listed, tickets extracted and enriched
///
/// A bad repository or a failed commit listing aborts the run unless
/// `keep_going` is set, in which case the row is recorded with status
/// `error`.
pub async fn process_services(
    inputs: &[ServiceInput],
    commits: &dyn CommitSource,
    extractor: &TicketExtractor,
    enricher: &mut TicketEnricher<'_>,
    options: &ProcessOptions,
) -> Result<ReconciliationReport> {
    let mut tally = RunTally {
        total_services: inputs.len(),
        services_with_changes: inputs.iter().filter(|i| i.is_changed()).count(),
        ..RunTally::default()
    };
    let mut services = Vec::new();

    for (idx, input) in inputs.iter().enumerate() {
        debug!(
            service = %input.service,
            position = idx + 1,
            total = inputs.len(),
            "processing service"
        );

        let (current, new) = (input.current_tag.as_str(), input.new_tag.as_str());
        if current.is_empty() && new.is_empty() {
            tally.skipped += 1;
            continue;
        }

        let status_only = if current == new {
            if !options.include_unchanged {
                tally.skipped += 1;
                continue;
            }
            Some(ServiceStatus::Unchanged)
        } else if current.is_empty() {
            Some(ServiceStatus::NewService)
        } else if new.is_empty() {
            Some(ServiceStatus::NoNewVersion)
        } else {
            None
        };

        if let Some(status) = status_only {
            obs::emit_service_processed(&input.service, status.as_str(), 0, 0);
            services.push(ServiceReport::unscanned(
                &input.service,
                &input.repository,
                current,
                new,
                status,
            ));
            continue;
        }

        match scan_service(input, commits, extractor, enricher).await {
            Ok(report) => {
                tally.processed += 1;
                obs::emit_service_processed(
                    &report.service,
                    report.status.as_str(),
                    report.commits_ahead,
                    report.tickets.len(),
                );
                services.push(report);
            }
            Err(err) if options.keep_going => {
                warn!(service = %input.service, error = %err, "service failed, continuing");
                tally.failed += 1;
                obs::emit_service_processed(&input.service, ServiceStatus::Error.as_str(), 0, 0);
                let mut report = ServiceReport::unscanned(
                    &input.service,
                    &input.repository,
                    current,
                    new,
                    ServiceStatus::Error,
                );
                report.error = Some(err.to_string());
                services.push(report);
            }
            Err(err) => return Err(err),
        }
    }

    Ok(assemble_report(services, tally, options.run_id.clone()))
}

async fn scan_service(
    input: &ServiceInput,
    commits: &dyn CommitSource,
    extractor: &TicketExtractor,
    enricher: &mut TicketEnricher<'_>,
) -> Result<ServiceReport> {
    let slug = repository_slug(&input.repository)
        .ok_or_else(|| TagdiffError::InvalidRepository(input.repository.clone()))?;

    let messages = commits
        .commit_messages(&slug, &input.current_tag, &input.new_tag)
        .await
        .map_err(|source| TagdiffError::CommitRange {
            service: input.service.clone(),
            source,
        })?;

    let extraction = extractor.extract(&messages);
    let tickets = enricher.enrich(&extraction.tickets).await;

    let mut report = ServiceReport::unscanned(
        &input.service,
        &input.repository,
        &input.current_tag,
        &input.new_tag,
        ServiceStatus::Success,
    );
    report.commits_ahead = extraction.commits_ahead;
    report.ticket_count = tickets.len();
    report.tickets = tickets;
    Ok(report)
}
