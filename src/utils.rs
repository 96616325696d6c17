//! Utility functions for path handling and template expansion

use std::path::Path;

/// Values substituted into command arguments and message templates
#[derive(Debug, Clone, Copy)]
pub struct Placeholders<'a> {
  pub site: &'a str,
  pub version: &'a str,
  /// Site directory relative to the repository root
  pub site_dir: &'a str,
}

impl Placeholders<'_> {
  /// Replace `{site}`, `{version}` and `{site_dir}` in `template`
  ///
  /// Unknown `{...}` sequences are left untouched so that literal braces in
  /// commands survive.
  pub fn expand(&self, template: &str) -> String {
    template
      .replace("{site_dir}", self.site_dir)
      .replace("{site}", self.site)
      .replace("{version}", self.version)
  }
}

/// Convert a path to Git format (always forward slashes)
///
/// Git expects paths with forward slashes, even on Windows.
/// This function converts backslashes to forward slashes for use in Git commands.
pub fn path_to_git_format(path: &Path) -> String {
  #[cfg(target_os = "windows")]
  {
    path.to_string_lossy().replace('\\', "/")
  }
  #[cfg(not(target_os = "windows"))]
  {
    path.to_string_lossy().to_string()
  }
}
