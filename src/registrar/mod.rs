//! Service registrar: unit files, proxy vhosts and service lifecycle.
//!
//! Rendering is idempotent; every write replaces whatever file of the same name existed.
//! Lifecycle calls go through [`Host`] and are advisory: a unit that does not exist yet can
//! fail to stop without affecting the install.

pub mod templates;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config::GlobalConfig;
use crate::host::{Advisory, Host, ServiceAction};
use crate::utils;

pub use templates::{UnitSpec, VhostSpec, render_unit, render_vhost};

/// Writes unit and vhost files and drives the service manager.
pub struct ServiceRegistrar<'a, H: Host> {
    config: &'a GlobalConfig,
    host: &'a H,
}

impl<'a, H: Host> ServiceRegistrar<'a, H> {
    /// Registrar writing below the directories of `config`.
    pub const fn new(config: &'a GlobalConfig, host: &'a H) -> Self {
        Self {
            config,
            host,
        }
    }

    /// Render and write the unit file for `spec.app_name`.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or writing fails.
    pub async fn write_unit(&self, spec: &UnitSpec) -> Result<PathBuf> {
        let path = self.config.unit_path(&spec.app_name);
        let content = render_unit(spec)?;
        write_file(&path, content).await?;
        tracing::info!("Wrote unit {}", path.display());
        Ok(path)
    }

    /// Render and write the vhost for `host`, creating its log directory.
    ///
    /// A missing certificate directory is only warned about.
    ///
    /// # Errors
    ///
    /// Returns an error if the log directory cannot be created or the file cannot be written.
    pub async fn write_vhost(&self, host: &str, port: u16) -> Result<PathBuf> {
        let log_dir = self.config.nginx_log_dir(host);
        tokio::fs::create_dir_all(&log_dir)
            .await
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

        let cert_dir = self.config.cert_dir(host);
        if !tokio::fs::try_exists(&cert_dir).await.unwrap_or(false) {
            tracing::warn!(
                "No TLS certificate directory for {host} at {}; nginx will not serve it until one is issued",
                cert_dir.display()
            );
        }

        let spec = VhostSpec {
            host: host.to_string(),
            port,
            log_dir: log_dir.display().to_string(),
            cert_dir: cert_dir.display().to_string(),
        };
        let path = self.config.vhost_path(host);
        write_file(&path, render_vhost(&spec)?).await?;
        tracing::info!("Wrote vhost {}", path.display());
        Ok(path)
    }

    /// Stop every unit. Returns the number of failed calls.
    pub async fn stop_units(&self, units: &[String]) -> usize {
        let mut failures = 0;
        for unit in units {
            failures += count_failure(self.host.service(ServiceAction::Stop, unit).await);
        }
        failures
    }

    /// Reload the service manager, enable and start every unit, and restart the proxy when
    /// `restart_proxy` is set. Returns the number of failed calls.
    pub async fn activate(&self, units: &[String], restart_proxy: bool) -> usize {
        let mut failures = count_failure(self.host.reload_units().await);
        for unit in units {
            failures += count_failure(self.host.service(ServiceAction::Enable, unit).await);
            failures += count_failure(self.host.service(ServiceAction::Start, unit).await);
        }
        if restart_proxy {
            failures += count_failure(self.host.restart_proxy().await);
        }
        failures
    }

    /// Stop and disable every unit. Returns the number of failed calls.
    pub async fn deactivate(&self, units: &[String]) -> usize {
        let mut failures = 0;
        for unit in units {
            failures += count_failure(self.host.service(ServiceAction::Stop, unit).await);
            failures += count_failure(self.host.service(ServiceAction::Disable, unit).await);
        }
        failures
    }

    /// Delete unit files, ignoring any that are already gone.
    pub async fn remove_units(&self, units: &[String]) {
        for unit in units {
            remove_file_best_effort(&self.config.unit_path(unit)).await;
        }
    }

    /// Delete the vhost of `host`.
    pub async fn remove_vhost(&self, host: &str) {
        remove_file_best_effort(&self.config.vhost_path(host)).await;
    }

    /// Reload the service manager after unit files changed.
    pub async fn reload(&self) -> usize {
        count_failure(self.host.reload_units().await)
    }

    /// Restart the reverse proxy.
    pub async fn restart_proxy(&self) -> usize {
        count_failure(self.host.restart_proxy().await)
    }
}

fn count_failure(outcome: Advisory) -> usize {
    usize::from(!outcome.is_success())
}

async fn write_file(path: &Path, content: String) -> Result<()> {
    let target = path.to_path_buf();
    tokio::task::spawn_blocking(move || utils::atomic_write(&target, content.as_bytes()))
        .await
        .context("Failed to spawn blocking task for write")?
}

async fn remove_file_best_effort(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::info!("Removed {}", path.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("{} already absent", path.display());
        }
        Err(e) => tracing::warn!("Failed to remove {}: {e}", path.display()),
    }
}
