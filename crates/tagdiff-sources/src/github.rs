//! GitHub REST client: file contents and tag comparisons.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tagdiff_core::{CommitRangeError, CommitSource};
use tracing::{debug, warn};

use crate::config::SourceConfig;
use crate::error::{FetchError, Result};

const ACCEPT_JSON: &str = "application/vnd.github.v3+json";
const ACCEPT_RAW: &str = "application/vnd.github.raw";

/// Commits requested per compare page.
pub const COMPARE_PAGE_SIZE: u32 = 100;

/// Upper bound on compare pages fetched for one range.
pub const MAX_COMPARE_PAGES: u32 = 50;

/// Response of `GET /repos/{repo}/compare/{base}...{head}`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Comparison {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub ahead_by: u64,
    #[serde(default)]
    pub behind_by: u64,
    #[serde(default)]
    pub total_commits: u64,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub commits: Vec<ComparedCommit>,
    /// Changed files; GitHub sends these with the first page only.
    #[serde(default)]
    pub files: Vec<ChangedFile>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ComparedCommit {
    pub sha: String,
    pub commit: CommitBody,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CommitBody {
    pub message: String,
    #[serde(default)]
    pub author: Option<CommitAuthor>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct CommitAuthor {
    #[serde(default)]
    pub name: String,
    /// ISO 8601 timestamp as sent by GitHub.
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangedFile {
    pub filename: String,
    pub status: String,
    #[serde(default)]
    pub additions: u64,
    #[serde(default)]
    pub deletions: u64,
    #[serde(default)]
    pub changes: u64,
}

/// Aggregate line and file counts over [`Comparison::files`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FileStats {
    pub added: usize,
    pub modified: usize,
    pub removed: usize,
    pub additions: u64,
    pub deletions: u64,
}

impl ComparedCommit {
    pub fn subject(&self) -> &str {
        self.commit.message.lines().next().unwrap_or_default()
    }

    pub fn short_sha(&self) -> &str {
        self.sha.get(..7).unwrap_or(&self.sha)
    }
}

impl Comparison {
    /// First line of every commit message, in API order.
    pub fn subjects(&self) -> Vec<String> {
        self.commits.iter().map(|c| c.subject().to_string()).collect()
    }

    /// Commits GitHub counted in the range but did not list.
    pub fn missing_commits(&self) -> u64 {
        self.total_commits.saturating_sub(self.commits.len() as u64)
    }

    pub fn is_truncated(&self) -> bool {
        self.missing_commits() > 0
    }

    /// Append the commits of a later page. Returns how many were added.
    pub fn absorb_page(&mut self, page: Comparison) -> usize {
        let added = page.commits.len();
        self.commits.extend(page.commits);
        if self.files.is_empty() {
            self.files = page.files;
        }
        added
    }

    pub fn file_stats(&self) -> FileStats {
        self.files.iter().fold(FileStats::default(), |mut stats, f| {
            match f.status.as_str() {
                "added" => stats.added += 1,
                "removed" => stats.removed += 1,
                "modified" => stats.modified += 1,
                _ => {}
            }
            stats.additions += f.additions;
            stats.deletions += f.deletions;
            stats
        })
    }
}

/// Decode a compare response body.
pub fn parse_comparison(body: &str) -> Result<Comparison> {
    serde_json::from_str(body).map_err(|e| FetchError::Decode(format!("compare response: {e}")))
}

/// Whether a GitHub token should be sent to `url`.
///
/// Tokens go only to GitHub hosts and to the configured API origin
/// (host and port).
pub fn is_github_url(url: &str, api_url: &str) -> bool {
    let origin = |u: &str| {
        let parsed = reqwest::Url::parse(u).ok()?;
        Some((parsed.host_str()?.to_string(), parsed.port_or_known_default()))
    };
    let Some(target) = origin(url) else {
        return false;
    };
    let host = target.0.as_str();
    host == "github.com"
        || host.ends_with(".github.com")
        || host == "raw.githubusercontent.com"
        || origin(api_url).as_ref() == Some(&target)
}

/// GitHub REST API client
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GithubClient {
    /// Create a client with its own HTTP client
    pub fn new(config: &SourceConfig) -> Result<Self> {
        Ok(Self::with_http(config.http_client()?, config))
    }

    /// Create a client sharing an existing HTTP client
    pub fn with_http(http: reqwest::Client, config: &SourceConfig) -> Self {
        GithubClient {
            http,
            api_url: config.github_api_url.trim_end_matches('/').to_string(),
            token: config.github_token.clone(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn get(&self, url: &str, accept: &str) -> reqwest::RequestBuilder {
        let request = self.http.get(url).header(reqwest::header::ACCEPT, accept);
        match &self.token {
            Some(token) => request.header(reqwest::header::AUTHORIZATION, format!("token {token}")),
            None => request,
        }
    }

    async fn get_text(&self, url: &str, accept: &str, query: &[(&str, &str)]) -> Result<String> {
        debug!(url = %url, "GET");
        let response = self.get(url, accept).query(query).send().await?;
        FetchError::check_status(response.status(), url)?;
        Ok(response.text().await?)
    }

    /// File contents at `branch` via the contents API.
    pub async fn fetch_file(&self, repo: &str, path: &str, branch: &str) -> Result<String> {
        let url = format!(
            "{}/repos/{}/contents/{}",
            self.api_url,
            repo,
            path.trim_start_matches('/')
        );
        self.get_text(&url, ACCEPT_RAW, &[("ref", branch)])
            .await
            .map_err(|err| match err {
                FetchError::NotFound(_) => {
                    FetchError::NotFound(format!("{path} in {repo} at {branch}"))
                }
                other => other,
            })
    }

    /// Compare two refs, following pages until every commit GitHub counts
    /// in the range is listed or [`MAX_COMPARE_PAGES`] is reached.
    pub async fn compare(&self, repo: &str, base: &str, head: &str) -> Result<Comparison> {
        let url = format!("{}/repos/{}/compare/{}...{}", self.api_url, repo, base, head);
        let mut comparison = self.compare_page(&url, 1).await?;

        let mut page = 1;
        while comparison.is_truncated() && page < MAX_COMPARE_PAGES {
            page += 1;
            let next = self.compare_page(&url, page).await?;
            if comparison.absorb_page(next) == 0 {
                break;
            }
        }

        if comparison.is_truncated() {
            warn!(
                repo = %repo,
                base = %base,
                head = %head,
                listed = comparison.commits.len(),
                total = comparison.total_commits,
                "GitHub did not list every commit in the range"
            );
        }
        Ok(comparison)
    }

    async fn compare_page(&self, url: &str, page: u32) -> Result<Comparison> {
        let per_page = COMPARE_PAGE_SIZE.to_string();
        let page = page.to_string();
        let body = self
            .get_text(url, ACCEPT_JSON, &[("per_page", per_page.as_str()), ("page", page.as_str())])
            .await?;
        parse_comparison(&body)
    }
}

impl std::fmt::Debug for GithubClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GithubClient")
            .field("api_url", &self.api_url)
            .field("authenticated", &self.token.is_some())
            .finish()
    }
}

#[async_trait]
impl CommitSource for GithubClient {
    async fn commit_messages(
        &self,
        repo: &str,
        base: &str,
        head: &str,
    ) -> std::result::Result<Vec<String>, CommitRangeError> {
        match self.compare(repo, base, head).await {
            Ok(comparison) => Ok(comparison.subjects()),
            Err(FetchError::NotFound(_)) => Err(CommitRangeError::NotFound {
                repo: repo.to_string(),
                base: base.to_string(),
                head: head.to_string(),
            }),
            Err(other) => Err(CommitRangeError::Request(other.to_string())),
        }
    }
}
