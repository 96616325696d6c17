//! Sequential, fail-fast upgrade of a set of sites
//!
//! For each site in order: edit manifests and changelog, sync lockfiles,
//! optionally build, optionally commit. The first failure stops the run.
//! Sites already processed keep their upgraded state and later sites are left
//! untouched.

use crate::core::context::ReleaseContext;
use crate::core::error::{ConfigError, ReleaseError, ReleaseResult, ResultExt};
use crate::release::UpgradeRequest;
use crate::release::collaborators::{
  Builder, CommandStep, GitRecorder, Installer, Recorder, SiteTarget, SkipInstall,
};
use crate::release::plan::SitePlan;
use crate::release::report::{ReleaseReport, SiteOutcome};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;

/// A finished run: the report plus the error that stopped it, if any
#[derive(Debug)]
pub struct RunOutcome {
  pub report: ReleaseReport,
  pub error: Option<ReleaseError>,
}

pub struct Orchestrator<'a> {
  ctx: &'a ReleaseContext,
  installer: Box<dyn Installer + 'a>,
  builder: Box<dyn Builder + 'a>,
  recorder: Box<dyn Recorder + 'a>,
  quiet: bool,
}

impl<'a> Orchestrator<'a> {
  /// Orchestrator backed by the configured commands and system git
  pub fn new(ctx: &'a ReleaseContext) -> Self {
    let config = &ctx.config;
    let installer: Box<dyn Installer> = match config.install.step() {
      Some(install) => Box::new(CommandStep::new("install", install, &ctx.root)),
      None => Box::new(SkipInstall),
    };
    Self::with_collaborators(
      ctx,
      installer,
      Box::new(CommandStep::new("build", config.build.clone(), &ctx.root)),
      Box::new(GitRecorder::new(&ctx.root, config.commit.clone())),
    )
  }

  pub fn with_collaborators(
    ctx: &'a ReleaseContext,
    installer: Box<dyn Installer + 'a>,
    builder: Box<dyn Builder + 'a>,
    recorder: Box<dyn Recorder + 'a>,
  ) -> Self {
    Self {
      ctx,
      installer,
      builder,
      recorder,
      quiet: false,
    }
  }

  /// Suppress progress lines on stdout (used for `--json`)
  pub fn quiet(mut self, quiet: bool) -> Self {
    self.quiet = quiet;
    self
  }

  /// Sites to process, in run order
  ///
  /// Explicit names are deduplicated (first occurrence wins) and each must be
  /// a directory under the sites root. With no names, every non-hidden
  /// subdirectory of the sites root is used, sorted by name.
  pub fn resolve_sites(&self, requested: &[String]) -> ReleaseResult<Vec<String>> {
    let sites_root = self.ctx.require_sites_root()?;

    if requested.is_empty() {
      let mut sites = Vec::new();
      let entries = fs::read_dir(&sites_root)
        .with_context(|| format!("Failed to list sites in {}", sites_root.display()))?;
      for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') || !entry.path().is_dir() {
          continue;
        }
        sites.push(name);
      }
      sites.sort();

      if sites.is_empty() {
        return Err(ConfigError::NoSites { sites_root }.into());
      }
      return Ok(sites);
    }

    let mut seen = HashSet::new();
    let mut sites = Vec::new();
    for name in requested {
      if !seen.insert(name.as_str()) {
        continue;
      }
      let plain_name = !name.is_empty() && name != "." && name != ".." && !name.contains(['/', '\\']);
      if !plain_name || !sites_root.join(name).is_dir() {
        return Err(
          ConfigError::SiteNotFound {
            name: name.clone(),
            sites_root,
          }
          .into(),
        );
      }
      sites.push(name.clone());
    }
    Ok(sites)
  }

  /// Upgrade one site end to end
  pub fn upgrade_site(&self, request: &UpgradeRequest, site: &str) -> ReleaseResult<SiteOutcome> {
    let plan = SitePlan::prepare(self.ctx, site, &request.version)?;
    let target = SiteTarget::new(self.ctx, site, &request.version);
    let mut outcome = SiteOutcome::from_plan(&plan, false);

    let written = plan.apply()?;
    if !written.is_empty() {
      self.progress(&format!("   ✏️  Updated {} file(s)", written.len()));
    }

    self.installer.install(&target)?;

    if request.build {
      self.progress(&format!("   🔨 Building {}", site));
      self.builder.build(&target)?;
      outcome.built = true;
    }

    if request.commit {
      if plan.has_changes() {
        let files = self.commit_paths(&plan);
        let sha = self.recorder.record(&target, &files)?;
        self.progress(&format!("   📝 Committed {}", &sha[..sha.len().min(8)]));
        outcome.commit = Some(sha);
      } else {
        tracing::info!(site, "nothing changed, no commit");
      }
    }

    Ok(outcome)
  }

  /// Files to commit for a site: changed manifests and changelog, plus any
  /// configured lockfile that exists
  fn commit_paths(&self, plan: &SitePlan) -> Vec<PathBuf> {
    let mut paths: Vec<PathBuf> = plan.changed_files().map(|change| change.path.clone()).collect();
    let site_dir = self.ctx.site_dir(&plan.site);
    for lockfile in &self.ctx.config.lockfiles {
      let path = site_dir.join(lockfile);
      let relative = self.ctx.relative(&path).to_path_buf();
      if path.is_file() && !paths.contains(&relative) {
        paths.push(relative);
      }
    }
    paths
  }

  /// Upgrade every requested site, stopping at the first failure
  ///
  /// Errors found before any site is touched (bad version, unknown site,
  /// missing sites root) are returned as `Err`. A failure while processing
  /// a site is reported in the returned [`RunOutcome`].
  pub fn run(&self, request: &UpgradeRequest) -> ReleaseResult<RunOutcome> {
    request.validate()?;
    let sites = self.resolve_sites(&request.sites)?;

    if request.dry_run {
      return self.plan(request, &sites).map(|report| RunOutcome { report, error: None });
    }

    let mut report = ReleaseReport::new(&request.version, false);
    let mut error = None;

    for site in &sites {
      if error.is_some() {
        report.sites.push(SiteOutcome::skipped(site));
        continue;
      }

      self.progress(&format!("📦 {} → Richie {}", site, request.version));
      match self.upgrade_site(request, site) {
        Ok(outcome) => {
          tracing::info!(site = %site, status = %outcome.status, "site done");
          report.sites.push(outcome);
        }
        Err(err) => {
          tracing::error!(site = %site, error = %err, "upgrade failed");
          report.sites.push(SiteOutcome::failed(site, &err));
          error = Some(err);
        }
      }
    }

    Ok(RunOutcome { report, error })
  }

  /// Compute plans for `sites` without touching anything
  fn plan(&self, request: &UpgradeRequest, sites: &[String]) -> ReleaseResult<ReleaseReport> {
    let mut report = ReleaseReport::new(&request.version, true);
    for site in sites {
      let plan = SitePlan::prepare(self.ctx, site, &request.version)?;
      report.sites.push(SiteOutcome::from_plan(&plan, true));
    }
    Ok(report)
  }

  fn progress(&self, line: &str) {
    if !self.quiet {
      println!("{}", line);
    }
  }
}
