//! Source Fetcher: raw text from URLs, local files, git refs, or GitHub.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tagdiff_core::obs;
use tracing::debug;

use crate::config::SourceConfig;
use crate::error::{FetchError, Result};
use crate::git;
use crate::github::{is_github_url, GithubClient};

/// Where a source document lives.
///
/// String forms:
/// - `http://...` / `https://...`: fetched over HTTP
/// - `git:<rev>:<path>`: file at a ref of the local repository
/// - `github:<owner>/<repo>[@<branch>]:<path>`: GitHub contents API
///   (branch defaults to `main`)
/// - anything else: local file path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    Url(String),
    File(PathBuf),
    GitRef { rev: String, path: String },
    GithubContents {
        repo: String,
        branch: String,
        path: String,
    },
}

impl SourceLocation {
    pub fn github(repo: &str, branch: &str, path: &str) -> Self {
        SourceLocation::GithubContents {
            repo: repo.to_string(),
            branch: branch.to_string(),
            path: path.to_string(),
        }
    }
}

impl FromStr for SourceLocation {
    type Err = FetchError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FetchError::InvalidLocation("empty location".to_string()));
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            return Ok(SourceLocation::Url(s.to_string()));
        }
        if let Some(rest) = s.strip_prefix("git:") {
            return match rest.split_once(':') {
                Some((rev, path)) if !rev.is_empty() && !path.is_empty() => {
                    Ok(SourceLocation::GitRef {
                        rev: rev.to_string(),
                        path: path.to_string(),
                    })
                }
                _ => Err(FetchError::InvalidLocation(format!(
                    "{s:?}: expected git:<rev>:<path>"
                ))),
            };
        }
        if let Some(rest) = s.strip_prefix("github:") {
            let invalid = || {
                FetchError::InvalidLocation(format!(
                    "{s:?}: expected github:<owner>/<repo>[@<branch>]:<path>"
                ))
            };
            let (repo_ref, path) = rest.split_once(':').ok_or_else(invalid)?;
            let (repo, branch) = repo_ref.split_once('@').unwrap_or((repo_ref, "main"));
            if !repo.contains('/') || branch.is_empty() || path.is_empty() {
                return Err(invalid());
            }
            return Ok(SourceLocation::github(repo, branch, path));
        }
        Ok(SourceLocation::File(PathBuf::from(s)))
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceLocation::Url(url) => write!(f, "{url}"),
            SourceLocation::File(path) => write!(f, "{}", path.display()),
            SourceLocation::GitRef { rev, path } => write!(f, "git:{rev}:{path}"),
            SourceLocation::GithubContents { repo, branch, path } => {
                write!(f, "github:{repo}@{branch}:{path}")
            }
        }
    }
}

/// Retrieves raw text content. Every request carries the configured timeout;
/// a failed fetch is never retried.
#[derive(Debug, Clone)]
pub struct SourceFetcher {
    http: reqwest::Client,
    github: GithubClient,
    config: SourceConfig,
    git_dir: PathBuf,
}

impl SourceFetcher {
    pub fn new(config: SourceConfig) -> Result<Self> {
        let http = config.http_client()?;
        let github = GithubClient::with_http(http.clone(), &config);
        Ok(SourceFetcher {
            http,
            github,
            config,
            git_dir: PathBuf::from("."),
        })
    }

    /// Repository used for `git:` locations (default: current directory).
    pub fn with_git_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.git_dir = dir.into();
        self
    }

    pub fn config(&self) -> &SourceConfig {
        &self.config
    }

    pub fn github(&self) -> &GithubClient {
        &self.github
    }

    /// Fetch the document at `location`.
    pub async fn fetch(&self, location: &SourceLocation) -> Result<String> {
        let content = match location {
            SourceLocation::Url(url) => self.fetch_url(url).await?,
            SourceLocation::File(path) => read_file(path).await?,
            SourceLocation::GitRef { rev, path } => git::read_file_at_ref(&self.git_dir, rev, path)?,
            SourceLocation::GithubContents { repo, branch, path } => {
                self.github.fetch_file(repo, path, branch).await?
            }
        };
        obs::emit_source_fetched(&location.to_string(), content.len());
        Ok(content)
    }

    /// GET `url`; the GitHub token is attached only for GitHub hosts.
    pub async fn fetch_url(&self, url: &str) -> Result<String> {
        debug!(url = %url, "fetching");
        let mut request = self.http.get(url);
        if let Some(token) = &self.config.github_token {
            if is_github_url(url, &self.config.github_api_url) {
                request = request.header(reqwest::header::AUTHORIZATION, format!("token {token}"));
            }
        }
        let response = request.send().await?;
        FetchError::check_status(response.status(), url)?;
        Ok(response.text().await?)
    }
}

/// Read a local file; a missing file is [`FetchError::NotFound`].
pub async fn read_file(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(FetchError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(FetchError::Io(e)),
    }
}
