//! Version string normalization.
//!
//! Turns `.env`-style text and arbitrarily nested JSON documents into a
//! [`ServiceVersionMap`]. Text input is matched line by line against an
//! ordered table of [`VersionRule`]s; adding a declaration format means
//! adding a row, not a branch.

use regex::Regex;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::catalog::ServiceCatalog;
use crate::domain::{ParseError, ServiceVersionMap, SourceFormat, VersionEntry};

/// `=value`, optionally quoted. Values never contain whitespace or quotes.
const KEY_VALUE: &str = r#"\s*=\s*["']?(?P<version>[^\s"']+)["']?"#;

/// Built-in rules in priority order: (name, key pattern, format).
const BASE_RULES: &[(&str, &str, SourceFormat)] = &[
    ("service_version", r"^(?P<service>\w+)_VERSION", SourceFormat::KeyEqualsValue),
    ("version_service", r"^VERSION_(?P<service>\w+)", SourceFormat::KeyEqualsValue),
    ("service_tag", r"^(?P<service>\w+)_TAG", SourceFormat::KeyEqualsValue),
];

/// `IMAGE_<SERVICE>=<repo>:<tag>`; the tag follows the last `:`.
const IMAGE_RULE: &str =
    r#"^IMAGE_(?P<service>\w+)\s*=\s*["']?\S+:(?P<version>[^\s"':]+)["']?"#;

/// Keys whose scalar value is a version of the enclosing object.
const VERSION_FIELDS: &[&str] = &["version", "tag"];

/// Key suffixes marking a `<service><suffix>` version field.
const VERSION_SUFFIXES: &[&str] = &["_version", "-version", "_tag", "-tag"];

/// Fields naming the service an object describes.
const NAME_FIELDS: &[&str] = &["service", "name"];

/// One row of the text rule table.
///
/// The pattern must define the named groups `service` and `version`.
#[derive(Debug, Clone)]
pub struct VersionRule {
    name: String,
    pattern: Regex,
    format: SourceFormat,
}

impl VersionRule {
    /// Compile a rule. Matching is case-insensitive.
    pub fn new(name: &str, pattern: &str, format: SourceFormat) -> Result<Self, ParseError> {
        let pattern = Regex::new(&format!("(?i){}", pattern))?;
        Ok(Self {
            name: name.to_string(),
            pattern,
            format,
        })
    }

    /// Exact `KEY=value` rule for a key the built-in rules cannot express.
    pub fn bare_key(key: &str) -> Result<Self, ParseError> {
        Self::new(
            &format!("bare:{}", key),
            &format!("^(?P<service>{}){}", regex::escape(key), KEY_VALUE),
            SourceFormat::KeyEqualsValue,
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn format(&self) -> SourceFormat {
        self.format
    }

    fn apply(&self, line: &str) -> Option<VersionEntry> {
        let caps = self.pattern.captures(line)?;
        let service = caps.name("service")?.as_str();
        let version = caps.name("version")?.as_str();
        let source_key = line.split('=').next().unwrap_or(line).trim();
        Some(VersionEntry::new(service, version, self.format, source_key))
    }
}

fn base_rules() -> &'static [VersionRule] {
    static RULES: OnceLock<Vec<VersionRule>> = OnceLock::new();
    RULES.get_or_init(|| {
        let mut rules: Vec<VersionRule> = BASE_RULES
            .iter()
            .map(|(name, key, format)| {
                VersionRule::new(name, &format!("{}{}", key, KEY_VALUE), *format)
                    .expect("built-in version rule must compile")
            })
            .collect();
        rules.push(
            VersionRule::new("image_tag", IMAGE_RULE, SourceFormat::ImageTag)
                .expect("image rule must compile"),
        );
        rules
    })
}

/// Parses version-bearing text and JSON into [`ServiceVersionMap`]s.
#[derive(Debug, Clone)]
pub struct Normalizer {
    rules: Vec<VersionRule>,
    known_services: BTreeSet<String>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            rules: base_rules().to_vec(),
            known_services: BTreeSet::new(),
        }
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalizer aware of a catalog's service names and `.env` keys.
    ///
    /// Catalog keys none of the built-in rules match (e.g.
    /// `SGAI_ORCHESTRATION`) get an exact-key rule at lowest priority.
    pub fn for_catalog(catalog: &ServiceCatalog) -> Result<Self, ParseError> {
        let mut normalizer = Self {
            known_services: catalog.known_services(),
            ..Self::default()
        };
        for key in catalog.version_keys() {
            let sample = format!("{}=v0", key);
            if normalizer.parse_line(&sample).is_none() {
                normalizer.rules.push(VersionRule::bare_key(key)?);
            }
        }
        Ok(normalizer)
    }

    /// Append a rule at lowest priority.
    pub fn with_rule(mut self, rule: VersionRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[VersionRule] {
        &self.rules
    }

    /// Match one line against the rule table; first matching rule wins.
    pub fn parse_line(&self, line: &str) -> Option<VersionEntry> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        self.rules.iter().find_map(|rule| rule.apply(line))
    }

    /// Parse `.env`-style text. Lines no rule matches are skipped.
    pub fn parse_env(&self, content: &str) -> ServiceVersionMap {
        content.lines().filter_map(|l| self.parse_line(l)).collect()
    }

    /// Parse a JSON document. Malformed JSON fails the whole document.
    pub fn parse_json(&self, content: &str) -> Result<ServiceVersionMap, ParseError> {
        let value: Value = serde_json::from_str(content)?;
        self.parse_json_value(&value)
    }

    /// Walk an already-decoded JSON value.
    pub fn parse_json_value(&self, value: &Value) -> Result<ServiceVersionMap, ParseError> {
        if !(value.is_object() || value.is_array()) {
            return Err(ParseError::UnexpectedShape(
                "version document must be a JSON object or array".to_string(),
            ));
        }
        let mut map = ServiceVersionMap::new();
        self.walk(value, None, true, &mut map);
        Ok(map)
    }

    fn walk(&self, value: &Value, context: Option<&str>, top_level: bool, out: &mut ServiceVersionMap) {
        match value {
            Value::Object(fields) => {
                let label = NAME_FIELDS
                    .iter()
                    .find_map(|f| fields.get(*f).and_then(Value::as_str).map(|v| (*f, v)));
                let owner = label.map(|(_, name)| name).or(context);
                for (key, child) in fields {
                    if label.is_some_and(|(field, _)| field == key.as_str()) {
                        continue;
                    }
                    match scalar_text(child) {
                        Some(version) => {
                            if let Some(service) = self.json_service(key, owner, top_level) {
                                out.insert(VersionEntry::new(
                                    service,
                                    version,
                                    SourceFormat::KeyEqualsValue,
                                    key.as_str(),
                                ));
                            }
                        }
                        None => self.walk(child, Some(key), false, out),
                    }
                }
            }
            Value::Array(items) => {
                for item in items {
                    self.walk(item, context, false, out);
                }
            }
            _ => {}
        }
    }

    fn json_service(&self, key: &str, owner: Option<&str>, top_level: bool) -> Option<String> {
        let lower = key.to_lowercase();
        if self.known_services.contains(&lower) {
            return Some(lower);
        }
        if VERSION_FIELDS.contains(&lower.as_str()) {
            if let Some(owner) = owner {
                return Some(owner.to_lowercase());
            }
        }
        let stripped = VERSION_SUFFIXES
            .iter()
            .find_map(|s| lower.strip_suffix(s))
            .filter(|s| !s.is_empty());
        if let Some(service) = stripped {
            return Some(service.to_string());
        }
        top_level.then_some(lower)
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
