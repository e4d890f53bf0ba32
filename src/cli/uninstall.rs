//! Stop and unregister a service.
//!
//! Units, the vhost and the version record are removed. Install directories and the
//! system user stay on disk.

use anyhow::Result;
use clap::Args;
use std::path::Path;

use super::common::load_config;
use crate::github::{GitHubClient, ServiceLocator};
use crate::host::SystemHost;
use crate::orchestrator::{Installer, UninstallOptions};

/// Arguments of `instllr uninstall`.
#[derive(Args, Debug)]
pub struct UninstallCommand {
    /// Repository the service was installed from, `<owner>/<repo>`
    pub locator: ServiceLocator,

    /// Public hostname whose nginx vhost should be removed
    #[arg(long)]
    pub host: Option<String>,

    /// Service name given at install time (default: repo name)
    #[arg(long)]
    pub service_name: Option<String>,
}

impl UninstallCommand {
    /// Build the orchestrator options from the arguments.
    #[must_use]
    pub fn options(&self) -> UninstallOptions {
        let mut options = UninstallOptions::new(self.locator.clone());
        if let Some(name) = &self.service_name {
            options.service_name.clone_from(name);
        }
        options.host.clone_from(&self.host);
        options
    }

    /// Run the uninstall against the local host.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the install lock is unavailable.
    pub async fn execute(self, config_path: Option<&Path>) -> Result<()> {
        let config = load_config(config_path).await?;
        // Uninstall never talks to GitHub; the client only satisfies the installer's source.
        let client = GitHubClient::new(&config.github_api_url, None)?;
        let host = SystemHost::new();

        let report = Installer::new(&config, &client, &host).uninstall(&self.options()).await?;
        if report.warnings > 0 {
            tracing::warn!(
                "{} service-manager calls failed while uninstalling {}",
                report.warnings,
                report.service
            );
        }
        Ok(())
    }
}
