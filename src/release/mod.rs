//! Upgrading sites to a new Richie release
//!
//! # Flow
//!
//! For every resolved site, in order:
//!
//! 1. [`plan::SitePlan::prepare`] edits manifests and the changelog in memory
//! 2. the plan is written (all files or none)
//! 3. the [`collaborators::Installer`] syncs lockfiles
//! 4. with `--build`, the [`collaborators::Builder`] verifies the site
//! 5. with `--commit`, the [`collaborators::Recorder`] commits exactly the
//!    touched files as one commit
//!
//! The run stops at the first failing site. See [`orchestrator::Orchestrator`].

pub mod collaborators;
pub mod orchestrator;
pub mod plan;
pub mod report;

pub use orchestrator::Orchestrator;

use crate::core::error::{ConfigError, ReleaseResult};

/// One invocation of the upgrade
#[derive(Debug, Clone)]
pub struct UpgradeRequest {
  /// Target version, written verbatim into every manifest
  pub version: String,
  /// Explicit sites; empty means every site
  pub sites: Vec<String>,
  pub build: bool,
  pub commit: bool,
  pub dry_run: bool,
}

impl UpgradeRequest {
  /// Reject versions that cannot be written into a manifest
  ///
  /// Any non-empty token free of whitespace and manifest syntax characters
  /// is accepted. A version that is not semver only disables the downgrade
  /// warning.
  pub fn validate(&self) -> ReleaseResult<()> {
    let invalid = |reason: &str| -> ReleaseResult<()> {
      Err(
        ConfigError::InvalidVersion {
          version: self.version.clone(),
          reason: reason.to_string(),
        }
        .into(),
      )
    };

    if self.version.is_empty() {
      return invalid("version must not be empty");
    }
    if self.version.chars().any(|c| c.is_whitespace() || c.is_control()) {
      return invalid("version must not contain whitespace");
    }
    if self.version.contains(['"', '\'', ',', ';', '#']) {
      return invalid("version must not contain quotes, commas, semicolons or '#'");
    }
    Ok(())
  }
}
