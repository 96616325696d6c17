//! Structured editing of dependency manifests
//!
//! Each supported format is parsed, the pinned version of one package is set,
//! and the document is written back in its original style:
//!
//! - **requirements**: pip requirements files (`richie==2.17.0`)
//! - **package-json**: npm `package.json` (`"richie-education": "2.17.0"`)
//! - **toml**: `pyproject.toml` (PEP 621 arrays and Poetry tables)
//!
//! Editing is pure: `ManifestKind::set_version` takes the current content and
//! returns the new content. Reading and writing files is the caller's job.

pub mod package_json;
pub mod requirements;
pub mod toml;

use crate::core::error::{ManifestError, ReleaseResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Manifest file format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ManifestKind {
  Requirements,
  PackageJson,
  Toml,
}

impl fmt::Display for ManifestKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ManifestKind::Requirements => write!(f, "requirements"),
      ManifestKind::PackageJson => write!(f, "package-json"),
      ManifestKind::Toml => write!(f, "toml"),
    }
  }
}

/// Outcome of setting a version in one manifest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEdit {
  pub original: String,
  pub updated: String,
  /// Version pinned before the edit, when it was an exact pin
  pub previous: Option<String>,
}

impl ManifestEdit {
  pub(crate) fn new(original: &str, updated: String, previous: Option<String>) -> Self {
    Self {
      original: original.to_string(),
      updated,
      previous,
    }
  }

  pub(crate) fn unchanged(original: &str, previous: Option<String>) -> Self {
    Self::new(original, original.to_string(), previous)
  }

  pub fn is_changed(&self) -> bool {
    self.original != self.updated
  }
}

impl ManifestKind {
  /// Set `package` to `version` in `content`
  ///
  /// `path` is only used for error messages. A manifest that does not mention
  /// the package at all is an error, never a silent no-op.
  pub fn set_version(&self, path: &Path, content: &str, package: &str, version: &str) -> ReleaseResult<ManifestEdit> {
    let edited = match self {
      ManifestKind::Requirements => Ok(requirements::set_version(content, package, version)),
      ManifestKind::PackageJson => package_json::set_version(content, package, version),
      ManifestKind::Toml => toml::set_version(content, package, version),
    };

    match edited {
      Ok(Some(edit)) => Ok(edit),
      Ok(None) => Err(
        ManifestError::DependencyNotFound {
          path: path.to_path_buf(),
          package: package.to_string(),
        }
        .into(),
      ),
      Err(reason) => Err(
        ManifestError::Parse {
          path: path.to_path_buf(),
          reason,
        }
        .into(),
      ),
    }
  }
}

/// Resolve a manifest path (possibly a glob) inside a site directory
///
/// Returns the matching files sorted by path. Matching nothing is an error.
pub fn locate(site: &str, site_dir: &Path, pattern: &str) -> ReleaseResult<Vec<PathBuf>> {
  let not_found = || ManifestError::NotFound {
    site: site.to_string(),
    path: site_dir.join(pattern),
  };

  if !pattern.contains(['*', '?', '[']) {
    let path = site_dir.join(pattern);
    return if path.is_file() { Ok(vec![path]) } else { Err(not_found().into()) };
  }

  let full_pattern = site_dir.join(pattern);
  let mut matches: Vec<PathBuf> = glob::glob(&full_pattern.to_string_lossy())?
    .filter_map(Result::ok)
    .filter(|p| p.is_file())
    .collect();
  matches.sort();

  if matches.is_empty() {
    return Err(not_found().into());
  }
  Ok(matches)
}
