//! Integration tests for manifest and changelog upgrades

use crate::helpers::{TestFactory, run_site_release, site_release};
use anyhow::Result;

#[test]
fn test_upgrade_rewrites_manifests_and_changelog() -> Result<()> {
  let factory = TestFactory::new()?;
  factory.add_site("siteA", "2.17.0")?;
  factory.commit("Add siteA")?;

  run_site_release(&factory.path, &["2.18.0", "siteA"])?;

  assert_eq!(
    factory.requirements("siteA")?,
    "# Base requirements\ndjango==4.2.7\nrichie==2.18.0\n"
  );

  let package = factory.read_file("sites/siteA/src/frontend/package.json")?;
  assert!(package.contains(r#""richie-education": "2.18.0""#));
  assert!(package.starts_with("{\n  \"name\": \"siteA\",\n  \"private\": true,"));

  let changelog = factory.read_file("sites/siteA/CHANGELOG.md")?;
  assert!(changelog.contains("## [Unreleased]\n\n### Changed\n\n- Upgrade to Richie 2.18.0\n\n## [1.0.0]"));

  Ok(())
}

#[test]
fn test_second_run_leaves_files_identical() -> Result<()> {
  let factory = TestFactory::new()?;
  factory.add_site("siteA", "2.17.0")?;
  factory.commit("Add siteA")?;

  run_site_release(&factory.path, &["2.18.0"])?;
  let requirements = factory.requirements("siteA")?;
  let package = factory.read_file("sites/siteA/src/frontend/package.json")?;
  let changelog = factory.read_file("sites/siteA/CHANGELOG.md")?;

  let output = run_site_release(&factory.path, &["2.18.0"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("siteA: unchanged"), "stdout: {}", stdout);

  assert_eq!(factory.requirements("siteA")?, requirements);
  assert_eq!(factory.read_file("sites/siteA/src/frontend/package.json")?, package);
  assert_eq!(factory.read_file("sites/siteA/CHANGELOG.md")?, changelog);

  Ok(())
}

#[test]
fn test_all_sites_are_resolved_in_name_order() -> Result<()> {
  let factory = TestFactory::new()?;
  factory.add_site("zeta", "2.17.0")?;
  factory.add_site("alpha", "2.17.0")?;
  factory.add_site("mid", "2.16.0")?;
  std::fs::create_dir_all(factory.path.join("sites/.cache"))?;
  factory.commit("Add sites")?;

  let output = run_site_release(&factory.path, &["2.18.0", "--json"])?;
  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;

  let sites: Vec<&str> = report["sites"]
    .as_array()
    .unwrap()
    .iter()
    .map(|site| site["site"].as_str().unwrap())
    .collect();
  assert_eq!(sites, vec!["alpha", "mid", "zeta"]);
  assert!(report["sites"].as_array().unwrap().iter().all(|s| s["status"] == "upgraded"));
  assert_eq!(report["sites"][1]["previous_versions"][0], "2.16.0");

  for site in ["alpha", "mid", "zeta"] {
    assert!(factory.requirements(site)?.contains("richie==2.18.0"));
  }

  Ok(())
}

#[test]
fn test_dry_run_writes_nothing() -> Result<()> {
  let factory = TestFactory::new()?;
  factory.add_site("siteA", "2.17.0")?;
  factory.commit("Add siteA")?;

  let output = run_site_release(&factory.path, &["2.18.0", "--dry-run", "--commit", "--build"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert!(stdout.contains("siteA: would upgrade"), "stdout: {}", stdout);
  assert!(stdout.contains("sites/siteA/requirements/base.txt"));
  assert_eq!(factory.status()?, "");
  assert_eq!(factory.commit_count()?, 2);

  Ok(())
}

#[test]
fn test_missing_manifest_fails_without_touching_the_site() -> Result<()> {
  let factory = TestFactory::new()?;
  factory.add_site("siteA", "2.17.0")?;
  std::fs::remove_file(factory.path.join("sites/siteA/src/frontend/package.json"))?;
  factory.commit("Add siteA")?;

  let output = site_release(&factory.path, &["2.18.0"])?;
  assert_eq!(output.status.code(), Some(3));

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("package.json"), "stderr: {}", stderr);
  assert_eq!(factory.status()?, "");

  Ok(())
}

#[test]
fn test_custom_config_and_root_flag() -> Result<()> {
  let factory = TestFactory::new()?;
  let site = factory.path.join("apps/portal");
  std::fs::create_dir_all(&site)?;
  std::fs::write(
    site.join("pyproject.toml"),
    "[project]\nname = \"portal\"\ndependencies = [\n  \"richie[sentry]==2.17.0\",  # cms\n]\n",
  )?;
  factory.write_config(
    r#"
sites_root = "apps"

[[manifests]]
path = "pyproject.toml"
kind = "toml"
package = "richie"

[changelog]
enabled = false

[install]
enabled = false
"#,
  )?;
  factory.commit("Add portal")?;

  let elsewhere = tempfile::TempDir::new()?;
  let root = factory.path.to_string_lossy().to_string();
  run_site_release(elsewhere.path(), &["2.18.0", "--root", &root])?;

  assert_eq!(
    factory.read_file("apps/portal/pyproject.toml")?,
    "[project]\nname = \"portal\"\ndependencies = [\n  \"richie[sentry]==2.18.0\",  # cms\n]\n"
  );

  Ok(())
}
