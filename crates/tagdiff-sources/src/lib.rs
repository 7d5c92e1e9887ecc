//! tagdiff-sources: network and local collaborators for tagdiff
//!
//! - [`SourceFetcher`]: version documents and `.env` files from URLs,
//!   local files, git refs, or the GitHub contents API
//! - [`GithubClient`]: tag comparisons, implements `CommitSource`
//! - [`LocalGitCommitSource`]: the same contract over a local clone
//! - [`LinearClient`]: ticket details, implements `IssueTracker`
//!
//! Configuration comes from [`SourceConfig::from_env`].

pub mod config;
pub mod environments;
pub mod error;
pub mod fetcher;
pub mod git;
pub mod github;
pub mod linear;

pub use config::SourceConfig;
pub use environments::{find_environment, resolve_target, Environment, ENVIRONMENTS};
pub use error::{FetchError, Result};
pub use fetcher::{read_file, SourceFetcher, SourceLocation};
pub use git::{commit_subjects, read_file_at_ref, LocalGitCommitSource};
pub use github::{
    is_github_url, parse_comparison, ChangedFile, CommitAuthor, ComparedCommit, Comparison,
    FileStats, GithubClient, COMPARE_PAGE_SIZE, MAX_COMPARE_PAGES,
};
pub use linear::{parse_issue_response, LinearClient};
