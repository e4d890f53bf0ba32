//! Command-line interface for instllr.
//!
//! # Commands
//!
//! - `install <owner>/<repo>[:<tag>]` - Install or upgrade a GitHub release as a service
//! - `uninstall <owner>/<repo>[:<tag>]` - Stop and unregister a service
//!
//! # Global Options
//!
//! - `--verbose` - Debug logging
//! - `--quiet` - No logging, only progress lines and errors
//! - `--config` - Path to the host configuration file
//!
//! # Example
//!
//! ```bash
//! # Latest release, served on api.example.com through nginx
//! instllr install acme/api --host api.example.com --port 8080 \
//!     --env DATABASE_URL=postgres://localhost/api
//!
//! # A tagged release of a worker-only service
//! instllr install acme/jobs:v2.3.0 --env-file /etc/jobs.env
//!
//! instllr uninstall acme/api --host api.example.com
//! ```
//!
//! Any failure exits with status 1 after a single `error: ...` line on stderr.

pub mod common;
mod install;
mod uninstall;


use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

pub use install::InstallCommand;
pub use uninstall::UninstallCommand;

/// Settings derived from the global flags.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Log filter directive; `RUST_LOG` takes precedence when set
    pub log_level: String,
    /// Host configuration file
    pub config_path: Option<PathBuf>,
}

impl CliConfig {
    /// Install the global `tracing` subscriber. Later calls are no-ops.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}

/// Install GitHub release tarballs as managed systemd services.
#[derive(Parser)]
#[command(
    name = "instllr",
    about = "Install GitHub release tarballs as managed systemd services",
    version,
    long_about = "instllr downloads a .tar.xz release asset from GitHub, checks the host \
                  dependencies declared in its instllr.json, installs it into a versioned \
                  directory and registers it as a systemd service, optionally behind nginx."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable logging
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the host configuration file (default: ~/.instllr/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install or upgrade a service from a GitHub release
    Install(InstallCommand),

    /// Stop and unregister a service
    Uninstall(UninstallCommand),
}

impl Cli {
    /// Set up logging and run the selected command.
    ///
    /// # Errors
    ///
    /// Returns the command's error.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        config.init_logging();
        self.execute_with_config(config).await
    }

    /// Translate the global flags.
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "off"
        } else {
            "warn"
        };

        CliConfig {
            log_level: log_level.to_string(),
            config_path: self.config.clone(),
        }
    }

    /// Run the selected command with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns the command's error.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        match self.command {
            Commands::Install(cmd) => cmd.execute(config.config_path.as_deref()).await,
            Commands::Uninstall(cmd) => cmd.execute(config.config_path.as_deref()).await,
        }
    }
}
