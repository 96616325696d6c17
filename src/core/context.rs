//! Release context - build once, pass everywhere
//!
//! Replaces ambient process state (current directory, environment variables)
//! with one explicit value: the repository root and the loaded configuration.
//! `main` builds it, and every operation receives it by reference.

use crate::core::config::FactoryConfig;
use crate::core::error::{ConfigError, ReleaseResult};
use std::path::{Path, PathBuf};

/// Everything an upgrade run needs to know about the repository
#[derive(Debug, Clone)]
pub struct ReleaseContext {
  /// Repository root directory (absolute path)
  pub root: PathBuf,

  /// Configuration (release.toml or defaults)
  pub config: FactoryConfig,
}

impl ReleaseContext {
  /// Build the context from a root directory, loading release.toml if present
  pub fn build(root: &Path) -> ReleaseResult<Self> {
    let config = FactoryConfig::load(root)?;
    Ok(Self::with_config(root, config))
  }

  /// Build the context from an already loaded configuration
  pub fn with_config(root: &Path, config: FactoryConfig) -> Self {
    Self {
      root: root.to_path_buf(),
      config,
    }
  }

  /// Absolute path of the sites root
  pub fn sites_root(&self) -> PathBuf {
    self.root.join(&self.config.sites_root)
  }

  /// Absolute path of one site directory
  pub fn site_dir(&self, site: &str) -> PathBuf {
    self.sites_root().join(site)
  }

  /// Sites root, or an error when it does not exist
  pub fn require_sites_root(&self) -> ReleaseResult<PathBuf> {
    let sites_root = self.sites_root();
    if !sites_root.is_dir() {
      return Err(ConfigError::SitesRootMissing { path: sites_root }.into());
    }
    Ok(sites_root)
  }

  /// Path relative to the repository root, for display and git pathspecs
  pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
    path.strip_prefix(&self.root).unwrap_or(path)
  }
}
