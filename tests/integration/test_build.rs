//! Integration tests for `--build` and fail-fast behaviour

use crate::helpers::{TestFactory, run_site_release, site_release};
use anyhow::Result;

const RECORDING_BUILD: &str = r#"
[install]
enabled = false

[build]
command = ["sh", "-c", "echo {site} >> build.log"]
"#;

#[test]
fn test_build_runs_once_per_site_in_order() -> Result<()> {
  let factory = TestFactory::new()?;
  factory.add_site("beta", "2.17.0")?;
  factory.add_site("alpha", "2.17.0")?;
  factory.write_config(RECORDING_BUILD)?;
  factory.commit("Add sites")?;

  let output = run_site_release(&factory.path, &["2.18.0", "--build"])?;
  let stdout = String::from_utf8_lossy(&output.stdout);

  assert_eq!(factory.read_file("build.log")?, "alpha\nbeta\n");
  assert!(stdout.contains("alpha: upgraded (2.17.0 → 2.18.0), built"), "stdout: {}", stdout);

  Ok(())
}

#[test]
fn test_builder_not_invoked_without_flag() -> Result<()> {
  let factory = TestFactory::new()?;
  factory.add_site("alpha", "2.17.0")?;
  factory.write_config(RECORDING_BUILD)?;
  factory.commit("Add site")?;

  run_site_release(&factory.path, &["2.18.0"])?;

  assert!(!factory.path.join("build.log").exists());
  assert!(factory.requirements("alpha")?.contains("richie==2.18.0"));

  Ok(())
}

#[test]
fn test_build_env_receives_site_name() -> Result<()> {
  let factory = TestFactory::new()?;
  factory.add_site("alpha", "2.17.0")?;
  factory.write_config(
    r#"
[install]
enabled = false

[build]
command = ["sh", "-c", "echo \"$RICHIE_SITE $RICHIE_VERSION\" > build.log"]
env = { RICHIE_SITE = "{site}", RICHIE_VERSION = "{version}" }
workdir = "{site_dir}"
"#,
  )?;
  factory.commit("Add site")?;

  run_site_release(&factory.path, &["2.18.0", "--build"])?;
  assert_eq!(factory.read_file("sites/alpha/build.log")?, "alpha 2.18.0\n");

  Ok(())
}

#[test]
fn test_failing_build_stops_the_run() -> Result<()> {
  let factory = TestFactory::new()?;
  for site in ["alpha", "beta", "gamma"] {
    factory.add_site(site, "2.17.0")?;
  }
  factory.write_config(
    r#"
[install]
enabled = false

[build]
command = ["sh", "-c", "echo {site} >> build.log; test {site} != beta"]
"#,
  )?;
  factory.commit("Add sites")?;
  let before = factory.commit_count()?;

  let output = site_release(&factory.path, &["2.18.0", "--build", "--commit"])?;
  assert_eq!(output.status.code(), Some(4));

  let stdout = String::from_utf8_lossy(&output.stdout);
  assert!(stdout.contains("alpha: upgraded"), "stdout: {}", stdout);
  assert!(stdout.contains("beta: failed"), "stdout: {}", stdout);
  assert!(stdout.contains("gamma: skipped"), "stdout: {}", stdout);

  let stderr = String::from_utf8_lossy(&output.stderr);
  assert!(stderr.contains("build failed for site 'beta' (exit code 1)"), "stderr: {}", stderr);

  // alpha is upgraded and committed
  assert_eq!(factory.commit_count()?, before + 1);
  assert_eq!(factory.git_log(1)?, vec!["⬆️(alpha) upgrade richie to 2.18.0"]);

  // beta keeps its edited manifests, uncommitted
  assert!(factory.requirements("beta")?.contains("richie==2.18.0"));

  // gamma is untouched and never built
  assert!(factory.requirements("gamma")?.contains("richie==2.17.0"));
  assert_eq!(factory.read_file("build.log")?, "alpha\nbeta\n");

  Ok(())
}
