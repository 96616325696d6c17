//! CLI commands for site-release
//!
//! - **upgrade**: pin a Richie version in every site, then optionally build and commit
//!
//! Commands accept `&ReleaseContext` so the configuration is loaded once.

pub mod upgrade;

pub use upgrade::run_upgrade;
