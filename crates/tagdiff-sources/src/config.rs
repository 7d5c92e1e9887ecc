//! Credentials and endpoints for the network sources.

use std::time::Duration;

use crate::error::{FetchError, Result};

/// GitHub token variables, in lookup order.
pub const GITHUB_TOKEN_VARS: [&str; 4] = [
    "GITHUB_PAT",
    "GH_TOKEN",
    "GITHUB_ACCESS_TOKEN",
    "GH_LOCAL_UTILS_TOKEN",
];
pub const LINEAR_API_KEY_VAR: &str = "LINEAR_API_KEY";
pub const TIMEOUT_VAR: &str = "TAGDIFF_HTTP_TIMEOUT_SECS";
pub const GITHUB_API_URL_VAR: &str = "TAGDIFF_GITHUB_API_URL";
pub const LINEAR_API_URL_VAR: &str = "TAGDIFF_LINEAR_API_URL";
pub const VERSION_URL_TEMPLATE_VAR: &str = "TAGDIFF_VERSION_URL_TEMPLATE";

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_LINEAR_API_URL: &str = "https://api.linear.app/graphql";
pub const DEFAULT_VERSION_URL_TEMPLATE: &str = "https://{env}.stackgen.com/version.json";

/// Source configuration
#[derive(Clone, PartialEq, Eq)]
pub struct SourceConfig {
    /// GitHub token (optional; unauthenticated requests are rate limited)
    pub github_token: Option<String>,
    /// Linear API key (optional; tickets stay unenriched without it)
    pub linear_api_key: Option<String>,
    /// Per-request timeout
    pub timeout: Duration,
    pub github_api_url: String,
    pub linear_api_url: String,
    /// Deployed version URL with an `{env}` placeholder
    pub version_url_template: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            github_token: None,
            linear_api_key: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            linear_api_url: DEFAULT_LINEAR_API_URL.to_string(),
            version_url_template: DEFAULT_VERSION_URL_TEMPLATE.to_string(),
        }
    }
}

impl SourceConfig {
    /// Create a config with defaults and no credentials
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create a config from an arbitrary variable lookup. Empty values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let timeout = match get(TIMEOUT_VAR).map(|v| v.trim().parse::<u64>()) {
            Some(Ok(secs)) if secs > 0 => Duration::from_secs(secs),
            Some(_) => {
                tracing::warn!(
                    var = TIMEOUT_VAR,
                    "ignoring invalid timeout, using {}s",
                    DEFAULT_TIMEOUT_SECS
                );
                defaults.timeout
            }
            None => defaults.timeout,
        };

        SourceConfig {
            github_token: GITHUB_TOKEN_VARS.iter().find_map(|k| get(k)),
            linear_api_key: get(LINEAR_API_KEY_VAR),
            timeout,
            github_api_url: get(GITHUB_API_URL_VAR).unwrap_or(defaults.github_api_url),
            linear_api_url: get(LINEAR_API_URL_VAR).unwrap_or(defaults.linear_api_url),
            version_url_template: get(VERSION_URL_TEMPLATE_VAR)
                .unwrap_or(defaults.version_url_template),
        }
    }

    /// Set GitHub token
    pub fn with_github_token(mut self, token: &str) -> Self {
        self.github_token = Some(token.to_string());
        self
    }

    /// Set Linear API key
    pub fn with_linear_api_key(mut self, key: &str) -> Self {
        self.linear_api_key = Some(key.to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build the shared HTTP client.
    pub fn http_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .user_agent(concat!("tagdiff/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout)
            .build()
            .map_err(|e| FetchError::Network(format!("failed to create HTTP client: {e}")))
    }
}

impl std::fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn redact(secret: &Option<String>) -> &'static str {
            if secret.is_some() {
                "<redacted>"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("SourceConfig")
            .field("github_token", &redact(&self.github_token))
            .field("linear_api_key", &redact(&self.linear_api_key))
            .field("timeout", &self.timeout)
            .field("github_api_url", &self.github_api_url)
            .field("linear_api_url", &self.linear_api_url)
            .field("version_url_template", &self.version_url_template)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = SourceConfig::from_lookup(lookup(&[]));
        assert_eq!(config, SourceConfig::default());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_github_token_lookup_order() {
        let config = SourceConfig::from_lookup(lookup(&[
            ("GH_LOCAL_UTILS_TOKEN", "local"),
            ("GH_TOKEN", "gh"),
            ("GITHUB_PAT", ""),
        ]));
        assert_eq!(config.github_token.as_deref(), Some("gh"));
    }

    #[test]
    fn test_overrides_and_invalid_timeout() {
        let config = SourceConfig::from_lookup(lookup(&[
            ("LINEAR_API_KEY", "lin_api_x"),
            ("TAGDIFF_HTTP_TIMEOUT_SECS", "5"),
            ("TAGDIFF_GITHUB_API_URL", "https://ghe.example.com/api/v3"),
        ]));
        assert_eq!(config.linear_api_key.as_deref(), Some("lin_api_x"));
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.github_api_url, "https://ghe.example.com/api/v3");

        let config = SourceConfig::from_lookup(lookup(&[("TAGDIFF_HTTP_TIMEOUT_SECS", "soon")]));
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let config = SourceConfig::new()
            .with_github_token("ghp_secret")
            .with_linear_api_key("lin_secret");
        let debug = format!("{:?}", config);
        assert!(!debug.contains("ghp_secret"));
        assert!(!debug.contains("lin_secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_http_client_builds() {
        assert!(SourceConfig::new().http_client().is_ok());
    }
}
