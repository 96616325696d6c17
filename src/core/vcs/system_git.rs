//! System git backend
//!
//! Every operation is one `git` subprocess with an isolated environment.
//! Paths handed to git are relative to the directory the backend was opened
//! on, so they resolve the same way whatever symlinks sit above the repository.

use crate::core::error::{GitError, ReleaseError, ReleaseResult, ResultExt};
use crate::utils::path_to_git_format;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Identity and date overrides that `git commit` reads from the environment
const IDENTITY_VARS: [&str; 7] = [
  "GIT_AUTHOR_NAME",
  "GIT_AUTHOR_EMAIL",
  "GIT_AUTHOR_DATE",
  "GIT_COMMITTER_NAME",
  "GIT_COMMITTER_EMAIL",
  "GIT_COMMITTER_DATE",
  "EMAIL",
];

/// Git backend using system git (zero crate dependencies)
pub struct SystemGit {
  /// Directory git commands run in
  pub(crate) repo_path: PathBuf,
}

impl SystemGit {
  /// Open the git repository containing `path`
  ///
  /// This performs ONE subprocess call to check that `path` is inside a work tree.
  pub fn open(path: &Path) -> ReleaseResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--show-toplevel"])
      .output()
      .context("Failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(ReleaseError::Git(GitError::RepoNotFound {
          path: path.to_path_buf(),
        }));
      }
      return Err(ReleaseError::message(format!("Failed to open git repository: {}", stderr)));
    }

    tracing::debug!(
      work_tree = %String::from_utf8_lossy(&output.stdout).trim(),
      "opened repository"
    );
    Ok(Self {
      repo_path: path.to_path_buf(),
    })
  }

  /// Get HEAD commit SHA
  pub fn head_commit(&self) -> ReleaseResult<String> {
    let output = self.run(&["rev-parse", "HEAD"], "Failed to get HEAD commit")?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Stage the given paths
  pub fn stage(&self, paths: &[PathBuf]) -> ReleaseResult<()> {
    if paths.is_empty() {
      return Ok(());
    }

    let mut args = vec!["add".to_string(), "--".to_string()];
    args.extend(paths.iter().map(|p| path_to_git_format(p)));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    self.run(&args, "Failed to stage files")?;
    Ok(())
  }

  /// Commit exactly `paths` with a summary line and a body paragraph
  ///
  /// Anything else already staged in the index is left out of the commit.
  /// Returns the new HEAD SHA.
  pub fn commit_paths(&self, summary: &str, body: &str, paths: &[PathBuf]) -> ReleaseResult<String> {
    let mut args = vec![
      "commit".to_string(),
      "--no-verify".to_string(),
      "-m".to_string(),
      summary.to_string(),
    ];
    if !body.is_empty() {
      args.push("-m".to_string());
      args.push(body.to_string());
    }
    args.push("--".to_string());
    args.extend(paths.iter().map(|p| path_to_git_format(p)));

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    self.run(&args, "Failed to create commit")?;
    self.head_commit()
  }

  /// Run one git command and turn a non-zero exit into `GitError::CommandFailed`
  fn run(&self, args: &[&str], context: &str) -> ReleaseResult<Output> {
    tracing::debug!(repo = %self.repo_path.display(), "git {}", args.join(" "));

    let output = self.git_cmd().args(args).output().context(context)?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      let stdout = String::from_utf8_lossy(&output.stdout);
      let detail = if stderr.trim().is_empty() { stdout } else { stderr };
      return Err(ReleaseError::Git(GitError::CommandFailed {
        command: format!("git {}", args.first().copied().unwrap_or_default()),
        stderr: detail.trim().to_string(),
      }));
    }

    Ok(output)
  }

  /// Create a safe git command with isolated environment
  ///
  /// - Sets working directory to repo path
  /// - Clears environment variables
  /// - Whitelists PATH, HOME and the commit identity variables
  /// - Adds safe configuration overrides
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");

    cmd.arg("-C").arg(&self.repo_path);

    // Isolated environment (don't trust global config)
    cmd.env_clear();
    for key in ["PATH", "HOME"].into_iter().chain(IDENTITY_VARS) {
      if let Some(value) = std::env::var_os(key) {
        cmd.env(key, value);
      }
    }

    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false"); // Don't escape non-ASCII

    cmd
  }
}
