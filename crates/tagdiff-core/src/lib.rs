//! tagdiff core library
//!
//! Version reconciliation between deployed and declared service versions,
//! and ticket extraction over the commit ranges between their tags.
//! Network access lives behind the [`CommitSource`] and [`IssueTracker`]
//! traits; this crate performs no I/O beyond reading and writing local
//! JSON artifacts.

pub mod artifact;
pub mod catalog;
pub mod domain;
pub mod enrich;
pub mod fakes;
pub mod normalize;
pub mod obs;
pub mod pipeline;
pub mod reconcile;
pub mod report;
pub mod source_traits;
pub mod telemetry;
pub mod tickets;

pub use artifact::{write_json_artifact, write_text_artifact};
pub use catalog::{CatalogEntry, ServiceCatalog};

pub use domain::{
    group_by_project, parse_service_inputs, read_service_inputs, ChangeRecord, ChangeStatus,
    ChangeSummary, CommitRangeError, EnrichmentError, ParseError, Result, ServiceInput,
    ServiceVersionMap, SourceFormat, TagdiffError, Ticket, TicketDetails, TicketReference,
    VersionEntry,
};

pub use enrich::{EnrichmentStats, TicketEnricher};
pub use normalize::{Normalizer, VersionRule};
pub use pipeline::{process_services, repository_slug, ProcessOptions};
pub use reconcile::{plan_service_inputs, reconcile};
pub use report::{
    assemble_report, assemble_report_at, render_ticket_listing, write_report_json, ReportMetadata,
    ReconciliationReport, RunTally, ServiceReport, ServiceStatus,
};
pub use source_traits::{CommitSource, IssueTracker};
pub use telemetry::{init_tracing, level_for};
pub use tickets::{TicketExtraction, TicketExtractor, DEFAULT_TICKET_PATTERN};
