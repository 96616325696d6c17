//! Error types for site-release with contextual messages and exit codes
//!
//! Every failure is categorised so that `main` can pick a process exit code and
//! print a hint telling the user what to do next. Propagation is fail-fast:
//! nothing in the crate retries or compensates.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for site-release
///
/// Usage errors (missing VERSION, unknown flag) are reported by clap with its
/// own exit code 2 before any of these apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, unknown site, invalid version)
  User = 1,
  /// System error (git, I/O)
  System = 2,
  /// Manifest content does not match expectations
  Validation = 3,
  /// An installer or builder collaborator failed
  Collaborator = 4,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for site-release
#[derive(Debug)]
pub enum ReleaseError {
  /// Configuration and request errors
  Config(ConfigError),

  /// Manifest lookup and editing errors
  Manifest(ManifestError),

  /// Git operation errors
  Git(GitError),

  /// External command (installer/builder) errors
  Command(CommandError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl ReleaseError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    ReleaseError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  ///
  /// Categorised errors already carry their own context and are returned as-is.
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      ReleaseError::Message { message, context, help } => ReleaseError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      ReleaseError::Io(err) => ReleaseError::Message {
        message: format!("I/O error: {}", err),
        context: Some(ctx_str),
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      ReleaseError::Config(_) => ExitCode::User,
      ReleaseError::Manifest(_) => ExitCode::Validation,
      ReleaseError::Git(_) => ExitCode::System,
      ReleaseError::Command(_) => ExitCode::Collaborator,
      ReleaseError::Io(_) => ExitCode::System,
      ReleaseError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      ReleaseError::Config(e) => e.help_message(),
      ReleaseError::Manifest(e) => e.help_message(),
      ReleaseError::Git(e) => e.help_message(),
      ReleaseError::Command(e) => e.help_message(),
      ReleaseError::Message { help, .. } => help.clone(),
      ReleaseError::Io(_) => None,
    }
  }
}

impl fmt::Display for ReleaseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ReleaseError::Config(e) => write!(f, "{}", e),
      ReleaseError::Manifest(e) => write!(f, "{}", e),
      ReleaseError::Git(e) => write!(f, "{}", e),
      ReleaseError::Command(e) => write!(f, "{}", e),
      ReleaseError::Io(e) => write!(f, "I/O error: {}", e),
      ReleaseError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for ReleaseError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ReleaseError::Io(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for ReleaseError {
  fn from(err: io::Error) -> Self {
    ReleaseError::Io(err)
  }
}

impl From<serde_json::Error> for ReleaseError {
  fn from(err: serde_json::Error) -> Self {
    ReleaseError::message(format!("JSON error: {}", err))
  }
}

impl From<glob::PatternError> for ReleaseError {
  fn from(err: glob::PatternError) -> Self {
    ReleaseError::message(format!("Invalid glob pattern: {}", err))
  }
}

impl From<ConfigError> for ReleaseError {
  fn from(err: ConfigError) -> Self {
    ReleaseError::Config(err)
  }
}

impl From<ManifestError> for ReleaseError {
  fn from(err: ManifestError) -> Self {
    ReleaseError::Manifest(err)
  }
}

impl From<GitError> for ReleaseError {
  fn from(err: GitError) -> Self {
    ReleaseError::Git(err)
  }
}

impl From<CommandError> for ReleaseError {
  fn from(err: CommandError) -> Self {
    ReleaseError::Command(err)
  }
}

/// Configuration and request errors
#[derive(Debug)]
pub enum ConfigError {
  /// release.toml could not be understood
  Invalid { path: PathBuf, reason: String },

  /// Missing or empty required field
  MissingField { path: PathBuf, field: String },

  /// The sites root does not exist
  SitesRootMissing { path: PathBuf },

  /// Nothing to upgrade under the sites root
  NoSites { sites_root: PathBuf },

  /// Requested site is not a directory under the sites root
  SiteNotFound { name: String, sites_root: PathBuf },

  /// Version argument cannot be written into a manifest
  InvalidVersion { version: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::Invalid { .. } | ConfigError::MissingField { .. } => {
        Some("Check release.toml against the documented format, or remove it to use the defaults.".to_string())
      }
      ConfigError::SitesRootMissing { .. } => {
        Some("Run from the repository root, pass --root, or set `sites_root` in release.toml.".to_string())
      }
      ConfigError::SiteNotFound { sites_root, .. } => Some(format!(
        "Sites are the directories under {}. Omit the site list to upgrade all of them.",
        sites_root.display()
      )),
      ConfigError::InvalidVersion { .. } => Some("Pass the version exactly as it should appear, e.g. 2.18.0".to_string()),
      ConfigError::NoSites { .. } => None,
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::Invalid { path, reason } => {
        write!(f, "Invalid configuration in {}: {}", path.display(), reason)
      }
      ConfigError::MissingField { path, field } => {
        write!(f, "Missing required field in {}: {}", path.display(), field)
      }
      ConfigError::SitesRootMissing { path } => {
        write!(f, "Sites root not found: {}", path.display())
      }
      ConfigError::NoSites { sites_root } => {
        write!(f, "No sites found under {}", sites_root.display())
      }
      ConfigError::SiteNotFound { name, sites_root } => {
        write!(f, "Site '{}' not found under {}", name, sites_root.display())
      }
      ConfigError::InvalidVersion { version, reason } => {
        write!(f, "Invalid version '{}': {}", version, reason)
      }
    }
  }
}

/// Manifest lookup and editing errors
#[derive(Debug)]
pub enum ManifestError {
  /// A configured manifest does not exist for this site
  NotFound { site: String, path: PathBuf },

  /// The manifest exists but cannot be parsed
  Parse { path: PathBuf, reason: String },

  /// The manifest does not reference the dependency being upgraded
  DependencyNotFound { path: PathBuf, package: String },
}

impl ManifestError {
  fn help_message(&self) -> Option<String> {
    match self {
      ManifestError::NotFound { .. } => {
        Some("Every site must provide each manifest listed under [[manifests]] in release.toml.".to_string())
      }
      ManifestError::DependencyNotFound { package, .. } => Some(format!(
        "Pin '{}' in the manifest first, or adjust the `package` of this manifest in release.toml.",
        package
      )),
      ManifestError::Parse { .. } => None,
    }
  }
}

impl fmt::Display for ManifestError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ManifestError::NotFound { site, path } => {
        write!(f, "Manifest for site '{}' not found: {}", site, path.display())
      }
      ManifestError::Parse { path, reason } => {
        write!(f, "Failed to parse {}: {}", path.display(), reason)
      }
      ManifestError::DependencyNotFound { path, package } => {
        write!(f, "'{}' is not declared in {}", package, path.display())
      }
    }
  }
}

/// Git operation errors
#[derive(Debug)]
pub enum GitError {
  /// Git command failed
  CommandFailed { command: String, stderr: String },

  /// Repository not found
  RepoNotFound { path: PathBuf },
}

impl GitError {
  fn help_message(&self) -> Option<String> {
    match self {
      GitError::RepoNotFound { path } => Some(format!(
        "--commit needs a git repository. Initialize one or check the path: {}",
        path.display()
      )),
      GitError::CommandFailed { stderr, .. } => {
        if stderr.contains("Please tell me who you are") {
          Some("Configure git user.name and user.email before using --commit.".to_string())
        } else {
          None
        }
      }
    }
  }
}

impl fmt::Display for GitError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      GitError::CommandFailed { command, stderr } => {
        write!(f, "Git command failed: {}\n{}", command, stderr)
      }
      GitError::RepoNotFound { path } => {
        write!(f, "Git repository not found at: {}", path.display())
      }
    }
  }
}

/// External command errors
#[derive(Debug)]
pub enum CommandError {
  /// The program could not be started at all
  Spawn {
    step: String,
    program: String,
    reason: String,
  },

  /// The program ran and reported failure
  Failed {
    step: String,
    site: String,
    command: String,
    code: Option<i32>,
  },
}

impl CommandError {
  fn help_message(&self) -> Option<String> {
    match self {
      CommandError::Spawn { program, .. } => Some(format!(
        "Make sure '{}' is installed and on PATH, or change the command in release.toml.",
        program
      )),
      CommandError::Failed { .. } => Some("See the command output above for details.".to_string()),
    }
  }
}

impl fmt::Display for CommandError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      CommandError::Spawn { step, program, reason } => {
        write!(f, "Failed to start {} command '{}': {}", step, program, reason)
      }
      CommandError::Failed {
        step,
        site,
        command,
        code,
      } => match code {
        Some(code) => write!(
          f,
          "{} failed for site '{}' (exit code {}): {}",
          step, site, code, command
        ),
        None => write!(f, "{} failed for site '{}' (terminated by signal): {}", step, site, command),
      },
    }
  }
}

/// Result type alias for site-release
pub type ReleaseResult<T> = Result<T, ReleaseError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<ReleaseError>,
{
  fn context(self, ctx: impl Into<String>) -> ReleaseResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> ReleaseResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &ReleaseError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}
