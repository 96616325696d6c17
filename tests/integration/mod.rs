//! Integration tests for site-release
//!
//! Each test builds a throwaway site factory repository and drives the
//! compiled binary against it.

mod helpers;
mod test_build;
mod test_cli;
mod test_upgrade;
