mod changelog;
mod commands;
mod core;
mod manifest;
mod release;
mod utils;

use clap::Parser;
use crate::core::context::ReleaseContext;
use crate::core::error::{ReleaseError, ReleaseResult, print_error};
use crate::release::UpgradeRequest;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Pin a new Richie release in every site of a site factory
#[derive(Parser)]
#[command(name = "site-release")]
#[command(version, about, long_about = None)]
#[command(styles = get_styles())]
struct Cli {
  /// Richie version to pin, e.g. 2.18.0
  #[arg(value_name = "VERSION")]
  target_version: String,

  /// Sites to upgrade (default: every site under the sites root)
  #[arg(value_name = "SITE")]
  sites: Vec<String>,

  /// Build each site after upgrading it
  #[arg(short, long)]
  build: bool,

  /// Commit each site's upgrade separately
  #[arg(short, long)]
  commit: bool,

  /// Show what would change without writing anything
  #[arg(long)]
  dry_run: bool,

  /// Print the report as JSON
  #[arg(long)]
  json: bool,

  /// Repository root (default: current directory)
  #[arg(long, value_name = "DIR")]
  root: Option<PathBuf>,

  /// Enable debug logging
  #[arg(short, long)]
  verbose: bool,
}

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let root = match resolve_root(cli.root.as_deref()) {
    Ok(root) => root,
    Err(e) => handle_error(e),
  };

  let ctx = match ReleaseContext::build(&root) {
    Ok(ctx) => ctx,
    Err(e) => handle_error(e),
  };

  let request = UpgradeRequest {
    version: cli.target_version,
    sites: cli.sites,
    build: cli.build,
    commit: cli.commit,
    dry_run: cli.dry_run,
  };

  if let Err(err) = commands::run_upgrade(&ctx, request, cli.json) {
    handle_error(err);
  }
}

/// Diagnostics go to stderr: `warn` by default, `debug` with `-v`, `RUST_LOG` honoured
fn init_tracing(verbose: bool) {
  let mut filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::WARN.into())
    .from_env_lossy();
  if verbose {
    filter = filter.add_directive(LevelFilter::DEBUG.into());
  }

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .init();
}

fn resolve_root(root: Option<&Path>) -> ReleaseResult<PathBuf> {
  let root = match root {
    Some(dir) => std::path::absolute(dir)?,
    None => std::env::current_dir()?,
  };
  if !root.is_dir() {
    return Err(ReleaseError::with_help(
      format!("Repository root {} is not a directory", root.display()),
      "Pass an existing directory with --root, or run from the repository root.",
    ));
  }
  Ok(root)
}

fn handle_error(err: ReleaseError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
