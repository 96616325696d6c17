//! External collaborators of the orchestrator
//!
//! The orchestrator never shells out directly. It talks to three seams:
//!
//! - [`Installer`]: brings lockfiles in line with the edited manifests
//! - [`Builder`]: verifies a site after the upgrade (`--build`)
//! - [`Recorder`]: persists the upgrade as one commit per site (`--commit`)
//!
//! The default implementations run configured argument vectors
//! ([`CommandStep`]) and system git ([`GitRecorder`]). Tests swap in fakes.

use crate::core::config::{CommandConfig, CommitConfig};
use crate::core::context::ReleaseContext;
use crate::core::error::{CommandError, ReleaseResult};
use crate::core::vcs::SystemGit;
use crate::utils::{Placeholders, path_to_git_format};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// The site a collaborator is asked to act on
#[derive(Debug, Clone)]
pub struct SiteTarget {
  pub name: String,
  pub version: String,
  /// Site directory relative to the repository root, git style
  pub site_dir: String,
}

impl SiteTarget {
  pub fn new(ctx: &ReleaseContext, site: &str, version: &str) -> Self {
    let dir = ctx.site_dir(site);
    Self {
      name: site.to_string(),
      version: version.to_string(),
      site_dir: path_to_git_format(ctx.relative(&dir)),
    }
  }

  pub fn placeholders(&self) -> Placeholders<'_> {
    Placeholders {
      site: &self.name,
      version: &self.version,
      site_dir: &self.site_dir,
    }
  }
}

/// Keeps lockfiles consistent with manifests
pub trait Installer {
  fn install(&self, target: &SiteTarget) -> ReleaseResult<()>;
}

/// Builds or verifies one site
pub trait Builder {
  fn build(&self, target: &SiteTarget) -> ReleaseResult<()>;
}

/// Records one site's upgrade in version control
pub trait Recorder {
  /// Commit exactly `files` (relative to the repository root), returning the commit id
  fn record(&self, target: &SiteTarget, files: &[PathBuf]) -> ReleaseResult<String>;
}

/// Installer used when lockfile sync is turned off (`[install] enabled = false`)
pub struct SkipInstall;

impl Installer for SkipInstall {
  fn install(&self, target: &SiteTarget) -> ReleaseResult<()> {
    tracing::debug!(site = %target.name, "lockfile sync turned off, skipping install");
    Ok(())
  }
}

/// A configured external command, run once per site
///
/// The child's stdout is forwarded to our stderr so that stdout stays
/// reserved for the report (and parseable with `--json`).
pub struct CommandStep {
  step: &'static str,
  config: CommandConfig,
  root: PathBuf,
}

impl CommandStep {
  pub fn new(step: &'static str, config: CommandConfig, root: &Path) -> Self {
    Self {
      step,
      config,
      root: root.to_path_buf(),
    }
  }

  /// The argument vector and working directory for `target`
  pub fn resolve(&self, target: &SiteTarget) -> (Vec<String>, PathBuf) {
    let values = target.placeholders();
    let argv = self.config.command.iter().map(|arg| values.expand(arg)).collect();
    let workdir = match &self.config.workdir {
      Some(dir) => self.root.join(values.expand(dir)),
      None => self.root.clone(),
    };
    (argv, workdir)
  }

  fn run(&self, target: &SiteTarget) -> ReleaseResult<()> {
    let (argv, workdir) = self.resolve(target);
    let Some((program, args)) = argv.split_first() else {
      return Err(
        CommandError::Spawn {
          step: self.step.to_string(),
          program: String::new(),
          reason: "empty command".to_string(),
        }
        .into(),
      );
    };

    if !workdir.is_dir() {
      return Err(
        CommandError::Spawn {
          step: self.step.to_string(),
          program: program.clone(),
          reason: format!("working directory {} does not exist", workdir.display()),
        }
        .into(),
      );
    }

    let values = target.placeholders();
    let mut cmd = Command::new(program);
    cmd
      .args(args)
      .current_dir(&workdir)
      .stdin(Stdio::null())
      .stdout(std::io::stderr());
    for (key, value) in &self.config.env {
      cmd.env(key, values.expand(value));
    }

    let command_line = argv.join(" ");
    tracing::debug!(
      step = self.step,
      site = %target.name,
      workdir = %workdir.display(),
      "running {}",
      command_line
    );

    let status = cmd.status().map_err(|e| CommandError::Spawn {
      step: self.step.to_string(),
      program: program.clone(),
      reason: e.to_string(),
    })?;

    if !status.success() {
      return Err(
        CommandError::Failed {
          step: self.step.to_string(),
          site: target.name.clone(),
          command: command_line,
          code: status.code(),
        }
        .into(),
      );
    }

    Ok(())
  }
}

impl Installer for CommandStep {
  fn install(&self, target: &SiteTarget) -> ReleaseResult<()> {
    self.run(target)
  }
}

impl Builder for CommandStep {
  fn build(&self, target: &SiteTarget) -> ReleaseResult<()> {
    self.run(target)
  }
}

/// Commit message for one site upgrade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitMessage {
  pub summary: String,
  pub body: String,
}

impl CommitMessage {
  pub fn render(config: &CommitConfig, target: &SiteTarget) -> Self {
    let values = target.placeholders();
    Self {
      summary: values.expand(&config.summary),
      body: values.expand(&config.release_notes_url),
    }
  }
}

/// Records upgrades with system git
///
/// The repository is opened on first use so that runs without `--commit`
/// work outside a git checkout.
pub struct GitRecorder {
  root: PathBuf,
  commit: CommitConfig,
}

impl GitRecorder {
  pub fn new(root: &Path, commit: CommitConfig) -> Self {
    Self {
      root: root.to_path_buf(),
      commit,
    }
  }
}

impl Recorder for GitRecorder {
  fn record(&self, target: &SiteTarget, files: &[PathBuf]) -> ReleaseResult<String> {
    let git = SystemGit::open(&self.root)?;
    let message = CommitMessage::render(&self.commit, target);

    git.stage(files)?;
    let sha = git.commit_paths(&message.summary, &message.body, files)?;
    tracing::debug!(site = %target.name, sha = %sha, "recorded upgrade");
    Ok(sha)
  }
}
