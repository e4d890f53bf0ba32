//! Install or upgrade a service from a GitHub release.
//!
//! ```bash
//! instllr install acme/api:v1.4.0 --host api.example.com --port 8080 \
//!     --env-file /etc/api.env --env LOG_LEVEL=info
//! ```
//!
//! The GitHub token comes from `--gh-token`, then `gh_token` in the host configuration,
//! then `GH_TOKEN`. Public repositories need none.

use anyhow::Result;
use clap::Args;
use std::path::{Path, PathBuf};

use super::common::{collect_app_env, load_config, parse_env_entry};
use crate::github::{GitHubClient, ServiceLocator};
use crate::host::SystemHost;
use crate::orchestrator::{InstallOptions, Installer};

/// Arguments of `instllr install`.
#[derive(Args, Debug)]
pub struct InstallCommand {
    /// Release to install: `<owner>/<repo>` for the latest release or `<owner>/<repo>:<tag>`
    pub locator: ServiceLocator,

    /// Public hostname to serve through nginx (requires --port)
    #[arg(long, requires = "port")]
    pub host: Option<String>,

    /// Service name used for the unit, system user and home directory (default: repo name)
    #[arg(long)]
    pub service_name: Option<String>,

    /// Local port the application listens on, exported as PORT
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Pick the release asset whose name starts with this prefix
    #[arg(long)]
    pub asset: Option<String>,

    /// Application environment variable, NAME=VALUE (repeatable)
    #[arg(short, long = "env", value_name = "NAME=VALUE", value_parser = parse_env_entry)]
    pub env: Vec<String>,

    /// File of NAME=VALUE lines added before any --env
    #[arg(long)]
    pub env_file: Option<PathBuf>,

    /// GitHub token for private repositories
    #[arg(long)]
    pub gh_token: Option<String>,
}

impl InstallCommand {
    /// Build the orchestrator options from the arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the env file cannot be read or parsed.
    pub async fn options(&self) -> Result<InstallOptions> {
        let mut options = InstallOptions::new(self.locator.clone());
        if let Some(name) = &self.service_name {
            options.service_name.clone_from(name);
        }
        options.host.clone_from(&self.host);
        options.port = self.port;
        options.asset_filter.clone_from(&self.asset);
        options.app_env = collect_app_env(self.env_file.as_deref(), &self.env).await?;
        Ok(options)
    }

    /// Run the install against the local host.
    ///
    /// # Errors
    ///
    /// Returns the first fatal install error.
    pub async fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path).await?;
        let options = self.options().await?;

        let token = config.resolve_token(self.gh_token.as_deref());
        if token.is_none() {
            tracing::debug!("No GitHub token configured, using anonymous API access");
        }
        let client = GitHubClient::new(&config.github_api_url, token)?;
        let host = SystemHost::new();

        let report = Installer::new(&config, &client, &host).install(&options).await?;
        tracing::info!(
            "{} {} installed at {} ({} stages)",
            report.service,
            report.version,
            report.install_dir.display(),
            report.log.completed().len()
        );
        Ok(())
    }
}
