//! Core building blocks shared by every operation
//!
//! - **config**: release.toml parsing, defaults and validation
//! - **context**: repository root plus configuration, built once in `main`
//! - **error**: error taxonomy with contextual help and exit codes
//! - **vcs**: git operations (SystemGit)

pub mod config;
pub mod context;
pub mod error;
pub mod vcs;
