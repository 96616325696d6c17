//! Upgrade command: pin a Richie version across sites

use crate::core::context::ReleaseContext;
use crate::core::error::ReleaseResult;
use crate::release::{Orchestrator, UpgradeRequest};

/// Run the upgrade and print the per-site report
///
/// The report is printed even when a site fails, so the caller can see which
/// sites were upgraded, which one broke and which were never attempted. The
/// failure is then returned for the exit code.
pub fn run_upgrade(ctx: &ReleaseContext, request: UpgradeRequest, json: bool) -> ReleaseResult<()> {
  tracing::debug!(
    version = %request.version,
    sites = ?request.sites,
    build = request.build,
    commit = request.commit,
    dry_run = request.dry_run,
    "starting upgrade"
  );

  let orchestrator = Orchestrator::new(ctx).quiet(json);
  let outcome = orchestrator.run(&request)?;

  if json {
    println!("{}", outcome.report.to_json()?);
  } else {
    print!("{}", outcome.report.render_text());
    if outcome.report.dry_run {
      println!("\n💡 Dry run: nothing was written. Re-run without --dry-run to apply.");
    }
  }

  match outcome.error {
    Some(err) => Err(err),
    None => Ok(()),
  }
}
