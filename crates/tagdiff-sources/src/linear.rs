//! Linear GraphQL client used for ticket enrichment.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tagdiff_core::{EnrichmentError, IssueTracker, TicketDetails, TicketReference};
use tracing::{debug, trace};

use crate::config::SourceConfig;
use crate::error::Result;

const ISSUE_QUERY: &str = r#"query IssueByIdentifier($identifier: String!) {
  issue(id: $identifier) {
    identifier
    title
    state { name }
    assignee { name }
  }
}"#;

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    #[serde(default)]
    data: Option<IssueData>,
    #[serde(default)]
    errors: Vec<GraphqlError>,
}

#[derive(Debug, Deserialize)]
struct IssueData {
    issue: Option<Issue>,
}

#[derive(Debug, Deserialize)]
struct Issue {
    title: String,
    state: Option<Named>,
    assignee: Option<Named>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: String,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    extensions: Option<serde_json::Value>,
}

impl GraphqlError {
    fn code(&self) -> Option<&str> {
        self.extensions.as_ref()?.get("code")?.as_str()
    }
}

/// Interpret a Linear response body for one issue lookup.
///
/// A null issue or an "entity not found" error means the ticket is unknown
/// (`Ok(None)`); rate-limit and authentication error codes map to their
/// [`EnrichmentError`] variants.
pub fn parse_issue_response(body: &str) -> std::result::Result<Option<TicketDetails>, EnrichmentError> {
    let response: GraphqlResponse = serde_json::from_str(body)
        .map_err(|e| EnrichmentError::Api(format!("undecodable response: {e}")))?;

    if let Some(err) = response.errors.first() {
        return match err.code() {
            Some("RATELIMITED") => Err(EnrichmentError::RateLimited),
            Some("AUTHENTICATION_ERROR") => Err(EnrichmentError::Unauthorized(err.message.clone())),
            _ if err.message.to_lowercase().contains("not found") => Ok(None),
            _ => Err(EnrichmentError::Api(err.message.clone())),
        };
    }

    Ok(response.data.and_then(|d| d.issue).map(|issue| TicketDetails {
        title: issue.title,
        state: issue.state.map(|s| s.name),
        assignee: issue.assignee.map(|a| a.name),
    }))
}

/// Linear API client
#[derive(Clone)]
pub struct LinearClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl LinearClient {
    pub fn new(http: reqwest::Client, api_url: &str, api_key: &str) -> Self {
        LinearClient {
            http,
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// Client for the configured key, or `None` when no key is set.
    pub fn from_config(config: &SourceConfig) -> Result<Option<Self>> {
        match &config.linear_api_key {
            Some(key) => Ok(Some(Self::new(
                config.http_client()?,
                &config.linear_api_url,
                key,
            ))),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for LinearClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinearClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl IssueTracker for LinearClient {
    async fn lookup(
        &self,
        id: &TicketReference,
    ) -> std::result::Result<Option<TicketDetails>, EnrichmentError> {
        debug!(ticket = %id, "looking up ticket");
        let payload = json!({
            "query": ISSUE_QUERY,
            "variables": { "identifier": id.as_str() },
        });

        let response = self
            .http
            .post(&self.api_url)
            .header(reqwest::header::AUTHORIZATION, &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EnrichmentError::Network(e.to_string()))?;
        trace!(ticket = %id, status = status.as_u16(), body = %body, "linear response");

        match status.as_u16() {
            200..=299 => parse_issue_response(&body),
            // Linear answers malformed identifiers with 400.
            400 => Ok(None),
            401 | 403 => Err(EnrichmentError::Unauthorized(format!(
                "Linear API returned {status}"
            ))),
            429 => Err(EnrichmentError::RateLimited),
            _ => Err(EnrichmentError::Api(format!("Linear API returned {status}"))),
        }
    }
}
