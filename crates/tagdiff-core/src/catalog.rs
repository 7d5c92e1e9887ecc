//! Service catalog: maps deployed service names to the `.env` keys that
//! declare them and to the repositories their tags live in.
//!
//! Deployed endpoints and `.env` files rarely agree on naming (`ui` vs.
//! `APPCDUI_VERSION`). The catalog lets the reconciler line the two up.
//! An empty catalog is valid; every operation then passes data through.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::Path;

use crate::domain::{ServiceVersionMap, VersionEntry};

/// A single catalog row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Service name as reported by the deployed version endpoint.
    pub service: String,

    /// `.env` key declaring the service's version (e.g. `APPCDUI_VERSION`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_key: Option<String>,

    /// Repository URL or `owner/repo` slug.
    #[serde(default)]
    pub repository: String,

    /// Other names the normalizer may produce for this service.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
}

impl CatalogEntry {
    pub fn new(service: &str, version_key: Option<&str>, repository: &str) -> Self {
        Self {
            service: service.to_lowercase(),
            version_key: version_key.map(str::to_string),
            repository: repository.to_string(),
            aliases: Vec::new(),
        }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.aliases.push(alias.to_lowercase());
        self
    }

    fn answers_to(&self, entry: &VersionEntry) -> bool {
        let key_matches = self
            .version_key
            .as_deref()
            .is_some_and(|k| k.eq_ignore_ascii_case(&entry.source_key));
        key_matches || self.aliases.iter().any(|a| a == &entry.service)
    }
}

/// Ordered collection of [`CatalogEntry`] rows.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceCatalog {
    #[serde(default)]
    pub services: Vec<CatalogEntry>,
}

impl ServiceCatalog {
    pub fn new(services: Vec<CatalogEntry>) -> Self {
        Self { services }
    }

    /// Parse a catalog from its JSON form.
    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).context("parse service catalog")
    }

    /// Load a catalog file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("read service catalog {:?}", path))?;
        Self::from_json(&content).with_context(|| format!("in {:?}", path))
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    pub fn get(&self, service: &str) -> Option<&CatalogEntry> {
        self.services
            .iter()
            .find(|e| e.service.eq_ignore_ascii_case(service))
    }

    /// Every lower-cased service name and alias the catalog knows.
    pub fn known_services(&self) -> BTreeSet<String> {
        self.services
            .iter()
            .flat_map(|e| std::iter::once(&e.service).chain(e.aliases.iter()))
            .map(|s| s.to_lowercase())
            .collect()
    }

    /// `version_key`s declared in the catalog, as written.
    pub fn version_keys(&self) -> impl Iterator<Item = &str> {
        self.services.iter().filter_map(|e| e.version_key.as_deref())
    }

    /// Re-file declared entries under their catalog service name.
    ///
    /// An entry is renamed when its raw key equals a catalog `version_key`
    /// (case-insensitive) or its service is a catalog alias. Entries the
    /// catalog does not know keep their name.
    pub fn canonicalize(&self, map: &ServiceVersionMap) -> ServiceVersionMap {
        map.iter()
            .map(|entry| match self.services.iter().find(|c| c.answers_to(entry)) {
                Some(c) => entry.renamed(&c.service),
                None => entry.clone(),
            })
            .collect()
    }

    /// Repository for a service: the catalog value, else a GitHub URL under
    /// `github_org` when one is given, else an empty string.
    pub fn repository_for(&self, service: &str, github_org: Option<&str>) -> String {
        match (self.get(service), github_org) {
            (Some(entry), _) if !entry.repository.is_empty() => entry.repository.clone(),
            (_, Some(org)) => format!("https://github.com/{}/{}", org, service),
            _ => String::new(),
        }
    }
}
