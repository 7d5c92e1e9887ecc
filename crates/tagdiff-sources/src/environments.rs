//! Deployment environment presets for the deployed-version endpoint.

use crate::error::Result;
use crate::fetcher::SourceLocation;

/// A named deployment whose version document lives at the URL template
/// with `{env}` replaced by `subdomain`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Environment {
    pub name: &'static str,
    pub subdomain: &'static str,
}

pub const ENVIRONMENTS: [Environment; 4] = [
    Environment {
        name: "production",
        subdomain: "cloud",
    },
    Environment {
        name: "staging",
        subdomain: "stage.dev",
    },
    Environment {
        name: "development",
        subdomain: "main.dev",
    },
    Environment {
        name: "demo",
        subdomain: "demo.cloud",
    },
];

impl Environment {
    pub fn version_url(&self, template: &str) -> String {
        template.replace("{env}", self.subdomain)
    }
}

/// Look up a preset by name or subdomain, case-insensitively.
pub fn find_environment(name: &str) -> Option<&'static Environment> {
    ENVIRONMENTS
        .iter()
        .find(|e| e.name.eq_ignore_ascii_case(name) || e.subdomain.eq_ignore_ascii_case(name))
}

/// Resolve a CLI target: a preset becomes its version URL, anything else is
/// parsed as a [`SourceLocation`].
pub fn resolve_target(target: &str, url_template: &str) -> Result<SourceLocation> {
    match find_environment(target) {
        Some(env) => Ok(SourceLocation::Url(env.version_url(url_template))),
        None => target.parse(),
    }
}
