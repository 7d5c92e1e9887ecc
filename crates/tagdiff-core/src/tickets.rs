//! Ticket extraction from commit messages.
//!
//! Tickets are referenced in commit subjects as bracketed identifiers,
//! e.g. `[ENG-123] fix login`. Extraction is order-preserving and
//! deduplicated across the whole commit range.

use regex::Regex;
use std::collections::HashSet;

use crate::domain::{ParseError, TicketReference};

/// Default inner ticket pattern: project key, dash, number.
pub const DEFAULT_TICKET_PATTERN: &str = r"[A-Z]+-\d+";

/// Tickets found in a commit range.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketExtraction {
    /// Unique tickets in first-seen order.
    pub tickets: Vec<TicketReference>,

    /// Number of commit messages examined.
    pub commits_ahead: usize,
}

/// Applies `\[(<pattern>)\]` to commit messages.
#[derive(Debug, Clone)]
pub struct TicketExtractor {
    pattern: Regex,
}

impl Default for TicketExtractor {
    fn default() -> Self {
        Self::with_pattern(DEFAULT_TICKET_PATTERN).expect("default ticket pattern must compile")
    }
}

impl TicketExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extractor for a custom inner pattern; the brackets are added here.
    pub fn with_pattern(inner: &str) -> Result<Self, ParseError> {
        let pattern = Regex::new(&format!(r"\[({})\]", inner))?;
        Ok(Self { pattern })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Ticket IDs in one message, in order of appearance (duplicates kept).
    pub fn find_in<'a>(&'a self, message: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.pattern
            .captures_iter(message)
            .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
    }

    /// Extract unique tickets from a commit range.
    ///
    /// Messages without tickets contribute nothing but still count toward
    /// `commits_ahead`.
    pub fn extract<I, S>(&self, messages: I) -> TicketExtraction
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let mut extraction = TicketExtraction::default();

        for message in messages {
            extraction.commits_ahead += 1;
            for id in self.find_in(message.as_ref()) {
                if seen.insert(id.to_string()) {
                    extraction.tickets.push(TicketReference::new(id));
                }
            }
        }

        extraction
    }
}
