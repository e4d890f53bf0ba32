//! Integration test suite for instllr
//!
//! End-to-end runs of the install and uninstall pipelines against an in-memory release
//! source and a recording host, with every host path under a temporary directory, plus
//! tests of the `instllr` binary itself.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **install**: First installs, payload layouts, vhosts and failure modes
//! - **upgrade**: Upgrades, no-op reinstalls, downgrades and pruning
//! - **dependencies**: Host executable resolution and environment checks
//! - **uninstall**: Unit, vhost and ledger removal
//! - **cli**: Exit status and diagnostics of the binary

mod common;

mod cli;
#[cfg(unix)]
mod dependencies;
mod install;
mod uninstall;
mod upgrade;
