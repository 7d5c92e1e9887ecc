//! Version entries and the per-source service → version map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How a version was declared in its source document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceFormat {
    /// `KEY=value` lines and JSON scalars.
    KeyEqualsValue,
    /// `IMAGE_<SERVICE>=<repo>:<tag>`; only the tag is kept.
    ImageTag,
}

/// A single parsed `(service, version)` pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VersionEntry {
    /// Canonical, lower-cased service name.
    pub service: String,

    /// Literal version text (a leading `v` is preserved).
    pub version: String,

    /// Declaration format the entry was parsed from.
    pub source_format: SourceFormat,

    /// Raw key as written in the source (`APPCDUI_VERSION`, `ui`, ...).
    pub source_key: String,
}

impl VersionEntry {
    pub fn new(
        service: impl Into<String>,
        version: impl Into<String>,
        source_format: SourceFormat,
        source_key: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into().to_lowercase(),
            version: version.into(),
            source_format,
            source_key: source_key.into(),
        }
    }

    /// Copy of this entry filed under a different service name.
    pub fn renamed(&self, service: &str) -> Self {
        Self {
            service: service.to_lowercase(),
            ..self.clone()
        }
    }
}

/// Insertion-ordered map from service name to its [`VersionEntry`].
///
/// Keys are unique. Re-inserting a service replaces its entry but keeps the
/// position where the service was first seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceVersionMap {
    entries: Vec<VersionEntry>,
    index: HashMap<String, usize>,
}

impl ServiceVersionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry, returning the entry it replaced (if any).
    pub fn insert(&mut self, entry: VersionEntry) -> Option<VersionEntry> {
        match self.index.get(&entry.service) {
            Some(&pos) => Some(std::mem::replace(&mut self.entries[pos], entry)),
            None => {
                self.index.insert(entry.service.clone(), self.entries.len());
                self.entries.push(entry);
                None
            }
        }
    }

    pub fn get(&self, service: &str) -> Option<&VersionEntry> {
        self.index.get(service).map(|&pos| &self.entries[pos])
    }

    /// Version string for a service, if present.
    pub fn version(&self, service: &str) -> Option<&str> {
        self.get(service).map(|e| e.version.as_str())
    }

    pub fn contains(&self, service: &str) -> bool {
        self.index.contains_key(service)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &VersionEntry> {
        self.entries.iter()
    }

    /// Service names in first-seen order.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.service.as_str())
    }
}

impl FromIterator<VersionEntry> for ServiceVersionMap {
    fn from_iter<I: IntoIterator<Item = VersionEntry>>(iter: I) -> Self {
        let mut map = Self::new();
        for entry in iter {
            map.insert(entry);
        }
        map
    }
}

impl<'a> IntoIterator for &'a ServiceVersionMap {
    type Item = &'a VersionEntry;
    type IntoIter = std::slice::Iter<'a, VersionEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(service: &str, version: &str) -> VersionEntry {
        VersionEntry::new(service, version, SourceFormat::KeyEqualsValue, service)
    }

    #[test]
    fn test_service_name_is_lowercased() {
        let e = VersionEntry::new("APPCD", "v1", SourceFormat::KeyEqualsValue, "APPCD_VERSION");
        assert_eq!(e.service, "appcd");
        assert_eq!(e.source_key, "APPCD_VERSION");
    }

    #[test]
    fn test_reinsert_keeps_position_and_takes_last_value() {
        let mut map = ServiceVersionMap::new();
        map.insert(entry("appcd", "v1"));
        map.insert(entry("ui", "v2"));
        let replaced = map.insert(entry("appcd", "v3"));

        assert_eq!(replaced.map(|e| e.version), Some("v1".to_string()));
        assert_eq!(map.len(), 2);
        assert_eq!(map.services().collect::<Vec<_>>(), vec!["appcd", "ui"]);
        assert_eq!(map.version("appcd"), Some("v3"));
    }

    #[test]
    fn test_from_iterator_and_lookup() {
        let map: ServiceVersionMap = vec![entry("a", "1"), entry("b", "2")].into_iter().collect();
        assert!(map.contains("a"));
        assert!(!map.contains("c"));
        assert_eq!(map.get("b").map(|e| e.version.as_str()), Some("2"));
        assert_eq!((&map).into_iter().count(), 2);
    }

    #[test]
    fn test_renamed_entry_keeps_version_and_key() {
        let e = VersionEntry::new("appcdui", "v0.17.3", SourceFormat::KeyEqualsValue, "APPCDUI_VERSION");
        let r = e.renamed("UI");
        assert_eq!(r.service, "ui");
        assert_eq!(r.version, "v0.17.3");
        assert_eq!(r.source_key, "APPCDUI_VERSION");
    }
}
