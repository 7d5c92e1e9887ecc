//! Ticket enrichment with a run-scoped cache.
//!
//! The enricher never fails: a ticket whose lookup does not succeed is
//! reported with its ID only. A tracker that rejects the credentials is
//! switched off for the remainder of the run and every later ticket
//! degrades the same way.

use std::collections::HashMap;

use crate::domain::{EnrichmentError, Ticket, TicketReference};
use crate::obs;
use crate::source_traits::IssueTracker;

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentStats {
    /// Tracker calls actually made.
    pub lookups: usize,
    pub enriched: usize,
    pub degraded: usize,
    /// Requests answered from the cache.
    pub cache_hits: usize,
}

/// Resolves ticket references to [`Ticket`]s, once per ID per run.
pub struct TicketEnricher<'a> {
    tracker: Option<&'a dyn IssueTracker>,
    available: bool,
    cache: HashMap<TicketReference, Ticket>,
    stats: EnrichmentStats,
}

impl<'a> TicketEnricher<'a> {
    pub fn new(tracker: Option<&'a dyn IssueTracker>) -> Self {
        Self {
            tracker,
            available: true,
            cache: HashMap::new(),
            stats: EnrichmentStats::default(),
        }
    }

    /// Enricher that never calls a tracker; every ticket is bare.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// `false` once no tracker is configured or it rejected our credentials.
    pub fn is_available(&self) -> bool {
        self.tracker.is_some() && self.available
    }

    pub fn stats(&self) -> EnrichmentStats {
        self.stats
    }

    /// Enrich `references` in order. Always returns one ticket per reference.
    pub async fn enrich(&mut self, references: &[TicketReference]) -> Vec<Ticket> {
        let mut tickets = Vec::with_capacity(references.len());
        for reference in references {
            tickets.push(self.enrich_one(reference).await);
        }
        tickets
    }

    async fn enrich_one(&mut self, reference: &TicketReference) -> Ticket {
        if let Some(ticket) = self.cache.get(reference) {
            self.stats.cache_hits += 1;
            return ticket.clone();
        }

        let ticket = match self.tracker.filter(|_| self.available) {
            None => Ticket::bare(reference),
            Some(tracker) => {
                self.stats.lookups += 1;
                match tracker.lookup(reference).await {
                    Ok(Some(details)) => {
                        self.stats.enriched += 1;
                        Ticket::enriched(reference, details)
                    }
                    Ok(None) => {
                        let err = EnrichmentError::NotFound(reference.to_string());
                        self.degrade(reference, &err)
                    }
                    Err(err) => {
                        if matches!(err, EnrichmentError::Unauthorized(_)) {
                            tracing::warn!(error = %err, "enrichment unavailable for the rest of this run");
                            self.available = false;
                        }
                        self.degrade(reference, &err)
                    }
                }
            }
        };

        self.cache.insert(reference.clone(), ticket.clone());
        ticket
    }

    fn degrade(&mut self, reference: &TicketReference, err: &EnrichmentError) -> Ticket {
        self.stats.degraded += 1;
        obs::emit_enrichment_degraded(reference.as_str(), err);
        Ticket::bare(reference)
    }
}
