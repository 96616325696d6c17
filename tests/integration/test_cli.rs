//! Integration tests for argument handling and exit codes

use crate::helpers::{TestFactory, site_release};
use anyhow::Result;

#[test]
fn test_help_exits_zero() -> Result<()> {
  let factory = TestFactory::new()?;
  let output = site_release(&factory.path, &["--help"])?;

  assert!(output.status.success());
  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("--build"));
  assert!(stdout.contains("--commit"));
  assert_eq!(factory.status()?, "");

  Ok(())
}

#[test]
fn test_missing_version_is_a_usage_error() -> Result<()> {
  let factory = TestFactory::new()?;
  factory.add_site("alpha", "2.17.0")?;
  factory.commit("Add site")?;

  let output = site_release(&factory.path, &[])?;
  assert_eq!(output.status.code(), Some(2));
  assert!(String::from_utf8_lossy(&output.stderr).contains("<VERSION>"));

  let output = site_release(&factory.path, &[""])?;
  assert_eq!(output.status.code(), Some(1));

  assert!(factory.requirements("alpha")?.contains("richie==2.17.0"));
  assert_eq!(factory.status()?, "");

  Ok(())
}

#[test]
fn test_unknown_site_fails_before_any_change() -> Result<()> {
  let factory = TestFactory::new()?;
  factory.add_site("alpha", "2.17.0")?;
  factory.commit("Add site")?;

  let output = site_release(&factory.path, &["2.18.0", "alpha", "nosuch"])?;
  assert_eq!(output.status.code(), Some(1));

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("nosuch"), "stderr: {}", stderr);
  assert_eq!(factory.status()?, "");

  Ok(())
}

#[test]
fn test_invalid_config_is_reported() -> Result<()> {
  let factory = TestFactory::new()?;
  factory.add_site("alpha", "2.17.0")?;
  factory.write_config("[commit]\nsummary = \"upgrade richie\"\n")?;

  let output = site_release(&factory.path, &["2.18.0"])?;
  assert_eq!(output.status.code(), Some(1));
  assert!(String::from_utf8_lossy(&output.stderr).contains("release.toml"));
  assert!(factory.requirements("alpha")?.contains("richie==2.17.0"));

  Ok(())
}

#[test]
fn test_json_report_is_the_only_stdout() -> Result<()> {
  let factory = TestFactory::new()?;
  factory.add_site("alpha", "2.17.0")?;
  factory.commit("Add site")?;

  let output = site_release(&factory.path, &["2.18.0", "--json", "--commit"])?;
  assert!(output.status.success());

  let report: serde_json::Value = serde_json::from_slice(&output.stdout)?;
  assert_eq!(report["version"], "2.18.0");
  assert_eq!(report["dry_run"], false);
  assert_eq!(report["sites"][0]["site"], "alpha");
  assert_eq!(report["sites"][0]["status"], "upgraded");
  assert_eq!(report["sites"][0]["commit"].as_str().map(str::len), Some(40));

  Ok(())
}
