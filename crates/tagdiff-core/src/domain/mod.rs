//! Domain models for tagdiff.
//!
//! Canonical definitions for the core entities:
//! - `VersionEntry` / `ServiceVersionMap`: parsed versions from one source
//! - `ChangeRecord`: deployed vs. declared version of one service
//! - `TicketReference` / `Ticket`: ticket IDs and their enriched form
//! - `ServiceInput`: intermediate tag pairs handed to ticket extraction

pub mod change;
pub mod error;
pub mod input;
pub mod ticket;
pub mod version;

// Re-export main types and errors
pub use change::{ChangeRecord, ChangeStatus, ChangeSummary};
pub use error::{CommitRangeError, EnrichmentError, ParseError, Result, TagdiffError};
pub use input::{parse_service_inputs, read_service_inputs, ServiceInput};
pub use ticket::{group_by_project, Ticket, TicketDetails, TicketReference};
pub use version::{ServiceVersionMap, SourceFormat, VersionEntry};
