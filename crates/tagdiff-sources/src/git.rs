//! Local git access: file contents at a ref, and commit subjects in a range.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use async_trait::async_trait;
use tagdiff_core::{CommitRangeError, CommitSource};

use crate::error::{FetchError, Result};

fn run_git(repo_dir: &Path, args: &[&str]) -> Result<Output> {
    Command::new("git")
        .args(args)
        .current_dir(repo_dir)
        .output()
        .map_err(|e| FetchError::Git(format!("failed to run git: {e}")))
}

fn is_missing_object(stderr: &str) -> bool {
    const MARKERS: [&str; 5] = [
        "does not exist",
        "exists on disk, but not in",
        "invalid object name",
        "unknown revision",
        "bad revision",
    ];
    MARKERS.iter().any(|marker| stderr.contains(marker))
}

/// Read `path` as of `rev` (`git show <rev>:<path>`).
pub fn read_file_at_ref(repo_dir: &Path, rev: &str, path: &str) -> Result<String> {
    let object = format!("{rev}:{path}");
    let output = run_git(repo_dir, &["show", "--end-of-options", &object])?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_missing_object(&stderr) {
            return Err(FetchError::NotFound(object));
        }
        return Err(FetchError::Git(format!("git show {object} failed: {}", stderr.trim())));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| FetchError::Decode(format!("{object} is not UTF-8: {e}")))
}

/// Subjects of commits reachable from `head` but not `base`
/// (`git log --format=%s base..head`). Empty subjects are kept so every
/// commit is counted.
pub fn commit_subjects(repo_dir: &Path, base: &str, head: &str) -> Result<Vec<String>> {
    let range = format!("{base}..{head}");
    let output = run_git(repo_dir, &["log", "--format=%s", "--end-of-options", &range])?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if is_missing_object(&stderr) {
            return Err(FetchError::NotFound(range));
        }
        return Err(FetchError::Git(format!("git log {range} failed: {}", stderr.trim())));
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect())
}

/// [`CommitSource`] over a local clone. The `repo` argument is only used in
/// error messages.
#[derive(Debug, Clone)]
pub struct LocalGitCommitSource {
    repo_dir: PathBuf,
}

impl LocalGitCommitSource {
    pub fn new(repo_dir: impl Into<PathBuf>) -> Self {
        Self {
            repo_dir: repo_dir.into(),
        }
    }
}

#[async_trait]
impl CommitSource for LocalGitCommitSource {
    async fn commit_messages(
        &self,
        repo: &str,
        base: &str,
        head: &str,
    ) -> std::result::Result<Vec<String>, CommitRangeError> {
        commit_subjects(&self.repo_dir, base, head).map_err(|err| match err {
            FetchError::NotFound(_) => CommitRangeError::NotFound {
                repo: repo.to_string(),
                base: base.to_string(),
                head: head.to_string(),
            },
            other => CommitRangeError::Request(other.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::Command as StdCommand;

    fn git(repo_dir: &Path, args: &[&str]) {
        let output = StdCommand::new("git")
            .args(args)
            .current_dir(repo_dir)
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    fn make_git_repo() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        git(dir.path(), &["init"]);
        git(dir.path(), &["config", "user.name", "test-user"]);
        git(dir.path(), &["config", "user.email", "test@example.com"]);
        std::fs::write(dir.path().join(".env"), "APPCD_VERSION=v1.0.0\n").unwrap();
        git(dir.path(), &["add", ".env"]);
        git(dir.path(), &["commit", "-m", "initial"]);
        git(dir.path(), &["tag", "v1"]);
        std::fs::write(dir.path().join(".env"), "APPCD_VERSION=v1.1.0\n").unwrap();
        git(dir.path(), &["commit", "-am", "[ENG-1] bump appcd"]);
        git(dir.path(), &["commit", "--allow-empty", "-m", "[ENG-2][OPS-3] follow-up"]);
        git(dir.path(), &["tag", "v2"]);
        dir
    }

    #[test]
    fn read_file_at_ref_returns_historic_content() {
        let repo = make_git_repo();
        assert_eq!(
            read_file_at_ref(repo.path(), "v1", ".env").unwrap(),
            "APPCD_VERSION=v1.0.0\n"
        );
        assert_eq!(
            read_file_at_ref(repo.path(), "v2", ".env").unwrap(),
            "APPCD_VERSION=v1.1.0\n"
        );
    }

    #[test]
    fn read_file_at_ref_missing_path_is_not_found() {
        let repo = make_git_repo();
        let err = read_file_at_ref(repo.path(), "v1", "missing.env").unwrap_err();
        assert!(matches!(err, FetchError::NotFound(_)), "got {err:?}");
    }

    #[test]
    fn commit_subjects_lists_range() {
        let repo = make_git_repo();
        let subjects = commit_subjects(repo.path(), "v1", "v2").unwrap();
        assert_eq!(subjects.len(), 2);
        assert!(subjects.contains(&"[ENG-1] bump appcd".to_string()));
        assert!(subjects.contains(&"[ENG-2][OPS-3] follow-up".to_string()));
    }

    #[test]
    fn commit_subjects_counts_commits_with_empty_messages() {
        let repo = make_git_repo();
        git(
            repo.path(),
            &["commit", "--allow-empty", "--allow-empty-message", "-m", ""],
        );
        git(repo.path(), &["tag", "v3"]);

        let subjects = commit_subjects(repo.path(), "v1", "v3").unwrap();
        assert_eq!(subjects.len(), 3);
        assert_eq!(subjects[0], "");
    }

    #[test]
    fn option_like_revisions_are_not_parsed_as_options() {
        let repo = make_git_repo();
        let target = repo.path().join("written-by-git");
        let rev = format!("--output={}", target.display());

        assert!(read_file_at_ref(repo.path(), &rev, ".env").is_err());
        assert!(commit_subjects(repo.path(), &rev, "v2").is_err());
        assert!(commit_subjects(repo.path(), "v1", &rev).is_err());
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn local_source_maps_unknown_tag_to_not_found() {
        let repo = make_git_repo();
        let source = LocalGitCommitSource::new(repo.path());
        let err = source
            .commit_messages("acme/app", "v1", "v9")
            .await
            .unwrap_err();
        assert!(matches!(err, CommitRangeError::NotFound { .. }));
    }

    #[test]
    fn outside_repo_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(commit_subjects(dir.path(), "v1", "v2").is_err());
    }
}
