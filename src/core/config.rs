use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use crate::manifest::ManifestKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Configuration for site-release
/// Searched in order: release.toml, .release.toml, .config/release.toml
///
/// Every field is optional. Missing fields fall back to the layout of a
/// site factory: `sites/<site>/requirements/base.txt` pinning `richie` and
/// `sites/<site>/src/frontend/package.json` pinning `richie-education`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FactoryConfig {
  /// Directory holding one subdirectory per site (relative to the repository root)
  pub sites_root: PathBuf,

  /// Manifests rewritten in every site
  pub manifests: Vec<ManifestConfig>,

  /// Lockfiles staged alongside the manifests when recording (relative to the site)
  pub lockfiles: Vec<PathBuf>,

  pub changelog: ChangelogConfig,

  /// Lockfile sync step run in every site
  pub install: InstallConfig,

  /// Verification step run with `--build`
  pub build: CommandConfig,

  pub commit: CommitConfig,
}

/// One manifest file of a site
///
/// ```toml
/// [[manifests]]
/// path = "requirements/base.txt"
/// kind = "requirements"
/// package = "richie"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestConfig {
  /// Path relative to the site directory, glob patterns allowed
  pub path: String,
  pub kind: ManifestKind,
  /// Dependency name as written in the manifest
  pub package: String,
}

/// Keep-a-Changelog maintenance
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
  pub enabled: bool,
  /// Path relative to the site directory
  pub path: PathBuf,
  /// Entry text, `{version}` is substituted
  pub entry: String,
  /// Subsection of `## [Unreleased]` receiving the entry
  pub section: String,
}

impl Default for ChangelogConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      path: PathBuf::from("CHANGELOG.md"),
      entry: "Upgrade to Richie {version}".to_string(),
      section: "Changed".to_string(),
    }
  }
}

/// An external command given as an argument vector
///
/// Placeholders `{site}`, `{version}` and `{site_dir}` are expanded in every
/// argument, environment value and in `workdir`. Nothing goes through a shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
  pub command: Vec<String>,
  #[serde(default)]
  pub env: BTreeMap<String, String>,
  /// Working directory relative to the repository root (default: the root)
  #[serde(default)]
  pub workdir: Option<String>,
}

impl CommandConfig {
  fn validate(&self, source: &Path, field: &str) -> ReleaseResult<()> {
    match self.command.first() {
      Some(program) if !program.trim().is_empty() => Ok(()),
      _ => Err(missing(source, format!("{}.command", field))),
    }
  }
}

/// Lockfile sync step
///
/// Runs `yarn install` in the site frontend unless configured otherwise.
/// `enabled = false` turns lockfile sync off.
///
/// ```toml
/// [install]
/// command = ["yarn", "install", "--frozen-lockfile"]
/// workdir = "{site_dir}/src/frontend"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstallConfig {
  #[serde(default = "default_enabled")]
  pub enabled: bool,
  #[serde(default)]
  pub command: Vec<String>,
  #[serde(default)]
  pub env: BTreeMap<String, String>,
  /// Working directory relative to the repository root (default: the root)
  #[serde(default)]
  pub workdir: Option<String>,
}

impl InstallConfig {
  /// The command to run, or `None` when lockfile sync is turned off
  pub fn step(&self) -> Option<CommandConfig> {
    self.enabled.then(|| CommandConfig {
      command: self.command.clone(),
      env: self.env.clone(),
      workdir: self.workdir.clone(),
    })
  }
}

impl Default for InstallConfig {
  fn default() -> Self {
    Self {
      enabled: true,
      command: vec!["yarn".to_string(), "install".to_string()],
      env: BTreeMap::new(),
      workdir: Some("{site_dir}/src/frontend".to_string()),
    }
  }
}

fn default_enabled() -> bool {
  true
}

/// Commit message templates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitConfig {
  /// Summary line, must mention `{site}` and `{version}`
  pub summary: String,
  /// Body of the commit, `{version}` is substituted
  pub release_notes_url: String,
}

impl Default for CommitConfig {
  fn default() -> Self {
    Self {
      summary: "⬆️({site}) upgrade richie to {version}".to_string(),
      release_notes_url: "https://github.com/openfun/richie/releases/tag/v{version}".to_string(),
    }
  }
}

fn default_manifests() -> Vec<ManifestConfig> {
  vec![
    ManifestConfig {
      path: "requirements/base.txt".to_string(),
      kind: ManifestKind::Requirements,
      package: "richie".to_string(),
    },
    ManifestConfig {
      path: "src/frontend/package.json".to_string(),
      kind: ManifestKind::PackageJson,
      package: "richie-education".to_string(),
    },
  ]
}

fn default_build() -> CommandConfig {
  CommandConfig {
    command: vec!["make".to_string(), "build".to_string()],
    env: BTreeMap::from([("RICHIE_SITE".to_string(), "{site}".to_string())]),
    workdir: None,
  }
}

impl Default for FactoryConfig {
  fn default() -> Self {
    Self {
      sites_root: PathBuf::from("sites"),
      manifests: default_manifests(),
      lockfiles: vec![PathBuf::from("src/frontend/yarn.lock")],
      changelog: ChangelogConfig::default(),
      install: InstallConfig::default(),
      build: default_build(),
      commit: CommitConfig::default(),
    }
  }
}

impl FactoryConfig {
  /// Find config file in search order: release.toml, .release.toml, .config/release.toml
  pub fn find_config_path(path: &Path) -> Option<PathBuf> {
    let candidates = vec![
      path.join("release.toml"),
      path.join(".release.toml"),
      path.join(".config").join("release.toml"),
    ];

    candidates.into_iter().find(|p| p.exists())
  }

  /// Load config (searches multiple locations), or the defaults when none exists
  pub fn load(path: &Path) -> ReleaseResult<Self> {
    let Some(config_path) = Self::find_config_path(path) else {
      tracing::debug!(root = %path.display(), "no release.toml found, using defaults");
      return Ok(Self::default());
    };

    let content = fs::read_to_string(&config_path)
      .with_context(|| format!("Failed to read config from {}", config_path.display()))?;
    let config = Self::parse(&content).map_err(|reason| ConfigError::Invalid {
      path: config_path.clone(),
      reason,
    })?;

    config.validate(&config_path)?;

    tracing::debug!(path = %config_path.display(), "loaded configuration");
    Ok(config)
  }

  fn parse(content: &str) -> Result<Self, String> {
    toml_edit::de::from_str(content).map_err(|e| e.to_string())
  }

  /// Validate the configuration read from `source`
  pub fn validate(&self, source: &Path) -> ReleaseResult<()> {
    if self.manifests.is_empty() {
      return Err(missing(source, "manifests (at least one [[manifests]] entry)"));
    }

    for (index, manifest) in self.manifests.iter().enumerate() {
      if manifest.path.trim().is_empty() {
        return Err(missing(source, format!("manifests[{}].path", index)));
      }
      if manifest.package.trim().is_empty() {
        return Err(missing(source, format!("manifests[{}].package", index)));
      }
    }

    if let Some(install) = self.install.step() {
      install.validate(source, "install")?;
    }
    self.build.validate(source, "build")?;

    if !self.commit.summary.contains("{site}") || !self.commit.summary.contains("{version}") {
      return Err(
        ConfigError::Invalid {
          path: source.to_path_buf(),
          reason: "commit.summary must contain both {site} and {version}".to_string(),
        }
        .into(),
      );
    }

    if self.changelog.enabled && self.changelog.section.trim().is_empty() {
      return Err(missing(source, "changelog.section"));
    }

    Ok(())
  }
}

fn missing(source: &Path, field: impl Into<String>) -> ReleaseError {
  ConfigError::MissingField {
    path: source.to_path_buf(),
    field: field.into(),
  }
  .into()
}
