//! Per-site upgrade plan: compute every edit first, then write
//!
//! A plan is computed purely from the files on disk. Nothing is written until
//! every manifest of the site was located, parsed and edited successfully, so a
//! broken manifest never leaves a site half upgraded.

use crate::changelog;
use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult, ResultExt};
use crate::manifest;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// One file touched by a plan
#[derive(Debug, Clone, Serialize)]
pub struct FileChange {
  /// Path relative to the repository root
  pub path: PathBuf,
  /// `requirements`, `package-json`, `toml` or `changelog`
  pub kind: String,
  /// Version pinned before the upgrade (manifests with an exact pin only)
  #[serde(skip_serializing_if = "Option::is_none")]
  pub previous: Option<String>,
  #[serde(skip)]
  absolute: PathBuf,
  #[serde(skip)]
  original: String,
  #[serde(skip)]
  updated: String,
}

impl FileChange {
  pub fn is_changed(&self) -> bool {
    self.original != self.updated
  }
}

/// All edits needed to move one site to a version
#[derive(Debug, Clone)]
pub struct SitePlan {
  pub site: String,
  pub version: String,
  pub files: Vec<FileChange>,
}

impl SitePlan {
  /// Read and edit every configured file of `site` in memory
  pub fn prepare(ctx: &ReleaseContext, site: &str, version: &str) -> ReleaseResult<Self> {
    let site_dir = ctx.site_dir(site);
    let mut plan = Self {
      site: site.to_string(),
      version: version.to_string(),
      files: Vec::new(),
    };

    for entry in &ctx.config.manifests {
      for path in manifest::locate(site, &site_dir, &entry.path)? {
        let relative = ctx.relative(&path).to_path_buf();
        let content = plan.current_content(&path)?;
        let edit = entry.kind.set_version(&relative, &content, &entry.package, version)?;

        tracing::debug!(
          site,
          path = %relative.display(),
          package = %entry.package,
          changed = edit.is_changed(),
          "planned manifest edit"
        );
        plan.record(path, relative, entry.kind.to_string(), content, edit.updated, edit.previous);
      }
    }

    let changelog_config = &ctx.config.changelog;
    if changelog_config.enabled {
      let path = site_dir.join(&changelog_config.path);
      let relative = ctx.relative(&path).to_path_buf();
      if path.is_file() {
        let content = plan.current_content(&path)?;
        let updated = changelog::upsert_entry(&content, &changelog_config.section, &changelog_config.entry, version);
        plan.record(path, relative, "changelog".to_string(), content, updated, None);
      } else {
        tracing::warn!(site, path = %relative.display(), "changelog not found, skipping entry");
      }
    }

    plan.warn_on_downgrade();
    Ok(plan)
  }

  /// Content a file will have once earlier edits of this plan are applied
  fn current_content(&self, path: &Path) -> ReleaseResult<String> {
    if let Some(change) = self.files.iter().find(|change| change.absolute == path) {
      return Ok(change.updated.clone());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
  }

  /// Add a file edit, folding it into an earlier edit of the same file
  fn record(
    &mut self,
    absolute: PathBuf,
    path: PathBuf,
    kind: String,
    content: String,
    updated: String,
    previous: Option<String>,
  ) {
    if let Some(change) = self.files.iter_mut().find(|change| change.absolute == absolute) {
      change.updated = updated;
      if change.previous.is_none() {
        change.previous = previous;
      }
      return;
    }

    self.files.push(FileChange {
      path,
      kind,
      previous,
      absolute,
      original: content,
      updated,
    });
  }

  fn warn_on_downgrade(&self) {
    let Ok(target) = semver::Version::parse(&self.version) else {
      return;
    };
    for previous in self.previous_versions() {
      if let Ok(current) = semver::Version::parse(&previous)
        && target < current
      {
        tracing::warn!(site = %self.site, from = %current, to = %target, "downgrading");
      }
    }
  }

  /// Distinct versions pinned before the upgrade
  pub fn previous_versions(&self) -> BTreeSet<String> {
    self.files.iter().filter_map(|change| change.previous.clone()).collect()
  }

  pub fn has_changes(&self) -> bool {
    self.files.iter().any(FileChange::is_changed)
  }

  pub fn changed_files(&self) -> impl Iterator<Item = &FileChange> {
    self.files.iter().filter(|change| change.is_changed())
  }

  /// Write every changed file
  ///
  /// If a write fails, files already written by this call are restored to
  /// their original content before the error is returned. Returns the
  /// written paths, relative to the repository root.
  pub fn apply(&self) -> ReleaseResult<Vec<PathBuf>> {
    let mut written: Vec<&FileChange> = Vec::new();

    for change in self.changed_files() {
      tracing::debug!(site = %self.site, path = %change.path.display(), "writing");
      if let Err(err) = fs::write(&change.absolute, &change.updated) {
        for done in written.iter().rev() {
          if let Err(restore) = fs::write(&done.absolute, &done.original) {
            tracing::warn!(path = %done.path.display(), error = %restore, "failed to restore file");
          }
        }
        return Err(ReleaseError::from(err).context(format!("Failed to write {}", change.path.display())));
      }
      written.push(change);
    }

    Ok(written.into_iter().map(|change| change.path.clone()).collect())
  }
}
