//! Test helpers for integration tests

use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Base config of every test factory: no lockfile sync
pub const NO_INSTALL: &str = "[install]\nenabled = false\n";

/// A site factory repository with git history
pub struct TestFactory {
  _root: TempDir,
  pub path: PathBuf,
}

impl TestFactory {
  /// Create an empty factory: git repository with a README, an empty `sites/`
  /// and a `release.toml` that turns lockfile sync off
  pub fn new() -> Result<Self> {
    let root = TempDir::new()?;
    let path = root.path().to_path_buf();

    git(&path, &["init", "--initial-branch=main"])?;
    git(&path, &["config", "user.name", "Test User"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "commit.gpgsign", "false"])?;

    std::fs::create_dir_all(path.join("sites"))?;
    std::fs::write(path.join("README.md"), "# Site factory\n")?;
    std::fs::write(path.join("release.toml"), NO_INSTALL)?;

    git(&path, &["add", "."])?;
    git(&path, &["commit", "-m", "Initial factory setup"])?;

    Ok(Self { _root: root, path })
  }

  /// Add a site pinned to `version` in both its Python and frontend manifests
  pub fn add_site(&self, name: &str, version: &str) -> Result<PathBuf> {
    let site = self.path.join("sites").join(name);
    std::fs::create_dir_all(site.join("requirements"))?;
    std::fs::create_dir_all(site.join("src/frontend"))?;

    std::fs::write(
      site.join("requirements/base.txt"),
      format!("# Base requirements\ndjango==4.2.7\nrichie=={}\n", version),
    )?;
    std::fs::write(
      site.join("src/frontend/package.json"),
      format!(
        r#"{{
  "name": "{}",
  "private": true,
  "dependencies": {{
    "richie-education": "{}"
  }}
}}
"#,
        name, version
      ),
    )?;
    std::fs::write(
      site.join("CHANGELOG.md"),
      "# Changelog\n\n## [Unreleased]\n\n## [1.0.0] - 2024-01-10\n\n### Added\n\n- First release\n",
    )?;

    Ok(site)
  }

  pub fn write_config(&self, content: &str) -> Result<()> {
    std::fs::write(self.path.join("release.toml"), content)?;
    Ok(())
  }

  /// Commit everything, returning the new HEAD
  pub fn commit(&self, message: &str) -> Result<String> {
    git(&self.path, &["add", "."])?;
    git(&self.path, &["commit", "-m", message])?;

    let output = git(&self.path, &["rev-parse", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  pub fn read_file(&self, path: &str) -> Result<String> {
    Ok(std::fs::read_to_string(self.path.join(path))?)
  }

  pub fn requirements(&self, site: &str) -> Result<String> {
    self.read_file(&format!("sites/{}/requirements/base.txt", site))
  }

  /// Subjects of the last `n` commits, newest first
  pub fn git_log(&self, n: usize) -> Result<Vec<String>> {
    let output = git(&self.path, &["log", &format!("-{}", n), "--format=%s"])?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(String::from)
        .collect(),
    )
  }

  pub fn commit_count(&self) -> Result<usize> {
    let output = git(&self.path, &["rev-list", "--count", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().parse()?)
  }

  /// Files touched by a commit, sorted
  pub fn commit_files(&self, rev: &str) -> Result<Vec<String>> {
    let output = git(&self.path, &["show", "--name-only", "--format=", rev])?;
    let mut files: Vec<String> = String::from_utf8_lossy(&output.stdout)
      .lines()
      .filter(|line| !line.is_empty())
      .map(String::from)
      .collect();
    files.sort();
    Ok(files)
  }

  /// `git status --porcelain` output
  pub fn status(&self) -> Result<String> {
    let output = git(&self.path, &["status", "--porcelain"])?;
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
  }
}

/// Run git command in a directory
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git")
    .current_dir(cwd)
    .args(args)
    .output()
    .context("Failed to run git command")?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    anyhow::bail!("Git command failed: git {}\n{}", args.join(" "), stderr);
  }

  Ok(output)
}

/// Run site-release and return its output, whatever the exit status
pub fn site_release(cwd: &Path, args: &[&str]) -> Result<Output> {
  site_release_with_env(cwd, args, &[])
}

/// Run site-release with extra environment variables
pub fn site_release_with_env(cwd: &Path, args: &[&str], envs: &[(&str, &OsStr)]) -> Result<Output> {
  let bin = env!("CARGO_BIN_EXE_site-release");

  Command::new(bin)
    .current_dir(cwd)
    .args(args)
    .env_remove("RUST_LOG")
    .envs(envs.iter().copied())
    .output()
    .context("Failed to run site-release")
}

/// Run site-release, failing when it exits non-zero
pub fn run_site_release(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = site_release(cwd, args)?;

  if !output.status.success() {
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    anyhow::bail!(
      "site-release command failed: site-release {}\nstdout: {}\nstderr: {}",
      args.join(" "),
      stdout,
      stderr
    );
  }

  Ok(output)
}
