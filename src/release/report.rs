//! Per-site outcome of an upgrade run

use crate::release::plan::{FileChange, SitePlan};
use serde::Serialize;
use std::fmt;

/// What happened to one site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SiteStatus {
  /// Files were rewritten
  Upgraded,
  /// Already at the requested version, nothing written
  Unchanged,
  /// Dry run: files would be rewritten
  Planned,
  /// An upgrade step failed
  Failed,
  /// Not attempted because an earlier site failed
  Skipped,
}

impl fmt::Display for SiteStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let label = match self {
      SiteStatus::Upgraded => "upgraded",
      SiteStatus::Unchanged => "unchanged",
      SiteStatus::Planned => "would upgrade",
      SiteStatus::Failed => "failed",
      SiteStatus::Skipped => "skipped",
    };
    write!(f, "{}", label)
  }
}

#[derive(Debug, Clone, Serialize)]
pub struct SiteOutcome {
  pub site: String,
  pub status: SiteStatus,
  /// Versions pinned before the run
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub previous_versions: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub files: Vec<FileChange>,
  pub built: bool,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub commit: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub error: Option<String>,
}

impl SiteOutcome {
  /// Outcome for a prepared plan, before any collaborator ran
  pub fn from_plan(plan: &SitePlan, dry_run: bool) -> Self {
    let status = match (plan.has_changes(), dry_run) {
      (false, _) => SiteStatus::Unchanged,
      (true, true) => SiteStatus::Planned,
      (true, false) => SiteStatus::Upgraded,
    };
    Self {
      site: plan.site.clone(),
      status,
      previous_versions: plan.previous_versions().into_iter().collect(),
      files: plan.changed_files().cloned().collect(),
      built: false,
      commit: None,
      error: None,
    }
  }

  pub fn failed(site: &str, error: impl fmt::Display) -> Self {
    Self {
      error: Some(error.to_string()),
      ..Self::bare(site, SiteStatus::Failed)
    }
  }

  pub fn skipped(site: &str) -> Self {
    Self::bare(site, SiteStatus::Skipped)
  }

  fn bare(site: &str, status: SiteStatus) -> Self {
    Self {
      site: site.to_string(),
      status,
      previous_versions: Vec::new(),
      files: Vec::new(),
      built: false,
      commit: None,
      error: None,
    }
  }

  fn icon(&self) -> &'static str {
    match self.status {
      SiteStatus::Upgraded => "✅",
      SiteStatus::Unchanged => "➖",
      SiteStatus::Planned => "📝",
      SiteStatus::Failed => "❌",
      SiteStatus::Skipped => "⏭️",
    }
  }
}

/// Outcome of a whole run, one entry per resolved site in run order
#[derive(Debug, Clone, Serialize)]
pub struct ReleaseReport {
  pub version: String,
  pub dry_run: bool,
  pub sites: Vec<SiteOutcome>,
}

impl ReleaseReport {
  pub fn new(version: &str, dry_run: bool) -> Self {
    Self {
      version: version.to_string(),
      dry_run,
      sites: Vec::new(),
    }
  }

  pub fn count(&self, status: SiteStatus) -> usize {
    self.sites.iter().filter(|outcome| outcome.status == status).count()
  }

  /// Human readable summary
  pub fn render_text(&self) -> String {
    let mut out = String::new();
    let title = if self.dry_run { "Dry run" } else { "Summary" };
    out.push_str(&format!("\n📋 {} for Richie {}\n", title, self.version));

    for outcome in &self.sites {
      let mut line = format!("  {} {}: {}", outcome.icon(), outcome.site, outcome.status);
      if !outcome.previous_versions.is_empty()
        && matches!(outcome.status, SiteStatus::Upgraded | SiteStatus::Planned)
      {
        line.push_str(&format!(" ({} → {})", outcome.previous_versions.join(", "), self.version));
      }
      if outcome.built {
        line.push_str(", built");
      }
      if let Some(sha) = &outcome.commit {
        line.push_str(&format!(", committed {}", &sha[..sha.len().min(8)]));
      }
      if let Some(error) = &outcome.error {
        line.push_str(&format!("\n      {}", error));
      }
      out.push_str(&line);
      out.push('\n');

      if self.dry_run {
        for change in &outcome.files {
          out.push_str(&format!("      • {}\n", change.path.display()));
        }
      }
    }

    out.push_str(&format!(
      "\n   {} upgraded, {} unchanged, {} failed, {} skipped\n",
      self.count(SiteStatus::Upgraded) + self.count(SiteStatus::Planned),
      self.count(SiteStatus::Unchanged),
      self.count(SiteStatus::Failed),
      self.count(SiteStatus::Skipped),
    ));
    out
  }

  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }
}
