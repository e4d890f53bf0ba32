//! Install and uninstall pipelines.
//!
//! An install is a straight line of stages. Each one runs to completion before the next
//! starts, and the first failure ends the run:
//!
//! ```text
//! FetchRelease → CheckInstalledVersion → DownloadAndExtract → LoadManifest → ResolveDeps
//!   → CheckEnv → StopExisting → StageAndRun → Chown → RenderUnits → RenderProxy
//!   → StoreVersion → PruneOld → ReloadAndActivate
//! ```
//!
//! Nothing is retried and nothing is undone. Stages before `StopExisting` only read; from
//! there on a failure leaves the host partially upgraded, and the [`InstallLog`] says how
//! far it got. Service-manager calls are advisory and never end the run.
//!
//! The whole run holds the per-service [`InstallLock`](crate::ledger::InstallLock).

pub mod log;

pub use log::{InstallLog, InstallStage};

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::PathBuf;
use tempfile::TempDir;

use crate::config::GlobalConfig;
use crate::core::InstllrError;
use crate::deps::{self, DependencyResolver, ResolvedDependencies};
use crate::github::{self, ReleaseSource, ServiceLocator};
use crate::host::{Host, Ownership};
use crate::installer::{self, ArchiveInstaller};
use crate::ledger::VersionLedger;
use crate::manifest::{self, AppManifest};
use crate::registrar::{ServiceRegistrar, UnitSpec};

/// What to install and how to expose it.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Release to install
    pub locator: ServiceLocator,
    /// Service name: unit name, system user and home directory
    pub service_name: String,
    /// Public hostname fronted by nginx, `None` for internal services
    pub host: Option<String>,
    /// Local port the application listens on
    pub port: Option<u16>,
    /// Asset-name prefix used to pick the release asset
    pub asset_filter: Option<String>,
    /// `NAME=value` application environment
    pub app_env: Vec<String>,
}

impl InstallOptions {
    /// Options for `locator` with the repository name as service name.
    #[must_use]
    pub fn new(locator: ServiceLocator) -> Self {
        Self {
            service_name: locator.repo.clone(),
            locator,
            host: None,
            port: None,
            asset_filter: None,
            app_env: Vec::new(),
        }
    }

    /// Unit environment of the primary service: the application environment plus
    /// `PORT=<port>` when a port is set and `PORT` is not already given.
    #[must_use]
    pub fn primary_env(&self) -> Vec<String> {
        let mut env = self.app_env.clone();
        if let Some(port) = self.port
            && !env.iter().any(|entry| entry.starts_with("PORT="))
        {
            env.push(format!("PORT={port}"));
        }
        env
    }

    fn validate(&self) -> Result<(), InstllrError> {
        if self.service_name.trim().is_empty() || self.service_name.contains('/') {
            return Err(InstllrError::ConfigError {
                message: format!("invalid service name '{}'", self.service_name),
            });
        }
        if self.host.is_some() && self.port.is_none() {
            return Err(InstllrError::ConfigError {
                message: "a port is required when a host is given".to_string(),
            });
        }
        Ok(())
    }
}

/// What to remove.
#[derive(Debug, Clone)]
pub struct UninstallOptions {
    /// Repository the service was installed from
    pub locator: ServiceLocator,
    /// Service name
    pub service_name: String,
    /// Public hostname whose vhost should be removed
    pub host: Option<String>,
}

impl UninstallOptions {
    /// Options for `locator` with the repository name as service name.
    #[must_use]
    pub fn new(locator: ServiceLocator) -> Self {
        Self {
            service_name: locator.repo.clone(),
            locator,
            host: None,
        }
    }
}

/// Outcome of a successful install.
#[derive(Debug, Clone)]
pub struct InstallReport {
    /// Service name
    pub service: String,
    /// Installed release tag
    pub version: String,
    /// Version that was live before, `None` on a first install
    pub previous_version: Option<String>,
    /// New install directory
    pub install_dir: PathBuf,
    /// Registered units, primary first
    pub units: Vec<String>,
    /// Written vhost, if any
    pub vhost: Option<PathBuf>,
    /// Removed version directories
    pub pruned: Vec<PathBuf>,
    /// Advisory operations that failed
    pub warnings: usize,
    /// Completed stages
    pub log: InstallLog,
}

/// Outcome of an uninstall.
#[derive(Debug, Clone)]
pub struct UninstallReport {
    /// Service name
    pub service: String,
    /// Version that was live, if the ledger knew it
    pub removed_version: Option<String>,
    /// Units that were stopped and deleted
    pub units: Vec<String>,
    /// Advisory operations that failed
    pub warnings: usize,
}

/// Runs install and uninstall against a release source and a host.
pub struct Installer<'a, R: ReleaseSource, H: Host> {
    config: &'a GlobalConfig,
    source: &'a R,
    host: &'a H,
    ledger: VersionLedger,
}

impl<'a, R: ReleaseSource, H: Host> Installer<'a, R, H> {
    /// Installer using `config` for every host path.
    pub fn new(config: &'a GlobalConfig, source: &'a R, host: &'a H) -> Self {
        Self {
            config,
            source,
            host,
            ledger: VersionLedger::new(&config.ledger_dir),
        }
    }

    /// The version ledger in use.
    pub const fn ledger(&self) -> &VersionLedger {
        &self.ledger
    }

    /// Install or upgrade a service.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error, annotated with the stage that raised it.
    pub async fn install(&self, options: &InstallOptions) -> Result<InstallReport> {
        options.validate()?;
        let service = options.service_name.as_str();
        let _lock = self.ledger.lock(service).await?;

        let registrar = ServiceRegistrar::new(self.config, self.host);
        let installer = ArchiveInstaller::new(self.config.effective_path());
        let mut log = InstallLog::new();
        let mut warnings = 0;

        println!("{} {} as {}", "Installing".green().bold(), options.locator, service);

        let release =
            log.run(InstallStage::FetchRelease, self.source.fetch_release(&options.locator)).await?;
        let tag = release.tag.clone();

        let previous_version = log
            .run(InstallStage::CheckInstalledVersion, async {
                github::validate_tag(&tag)?;
                self.ledger.check_installed_version(service, &tag).await
            })
            .await?;
        match &previous_version {
            Some(installed) => println!("{} {service} {installed} → {tag}", "Upgrading".cyan()),
            None => println!("{} {service} {tag}", "Installing release".cyan()),
        }

        let workspace = TempDir::new().context("Failed to create download directory")?;
        let payload = log
            .run(InstallStage::DownloadAndExtract, async {
                let asset = release.select_asset(options.asset_filter.as_deref())?;
                println!("{} {}", "Downloading asset:".cyan(), asset.name);
                let archive = self.source.download_asset(asset, workspace.path()).await?;

                let extract_dir = workspace.path().join("payload");
                tokio::fs::create_dir_all(&extract_dir).await?;
                installer::extract(&archive, &extract_dir).await?;
                manifest::payload_root(&extract_dir)
            })
            .await?;

        let manifest = log.run(InstallStage::LoadManifest, AppManifest::load(&payload)).await?;
        let units = manifest.unit_names(service);

        let deps = log
            .run(
                InstallStage::ResolveDeps,
                DependencyResolver::from_config(self.config).resolve(&manifest.requires),
            )
            .await?;

        log.run(InstallStage::CheckEnv, async {
            Ok(deps::check_env(&manifest.env.required_vars, &options.app_env)?)
        })
        .await?;

        warnings += registrar.stop_units(&units).await;
        log.record(InstallStage::StopExisting);

        let service_home = self.config.service_home(service);
        let install_dir = service_home.join(options.locator.version_dir_name(&tag));
        log.run(InstallStage::StageAndRun, async {
            println!("{} {}", "Staging into".cyan(), install_dir.display());
            installer.stage(&payload, &install_dir).await?;
            installer.run_install_steps(&manifest.install_steps, &install_dir, &deps).await
        })
        .await?;

        let owner = log
            .run(
                InstallStage::Chown,
                installer.apply_ownership(self.host, service, &service_home, &install_dir),
            )
            .await?;

        log.run(InstallStage::RenderUnits, async {
            for spec in self.unit_specs(options, &manifest, &deps, &install_dir, owner) {
                registrar.write_unit(&spec).await?;
            }
            Ok(())
        })
        .await?;

        let vhost = match (&options.host, options.port) {
            (Some(host), Some(port)) => {
                Some(log.run(InstallStage::RenderProxy, registrar.write_vhost(host, port)).await?)
            }
            _ => None,
        };

        log.run(InstallStage::StoreVersion, self.ledger.store_version(service, &tag)).await?;

        let pruned = log
            .run(
                InstallStage::PruneOld,
                self.ledger.remove_old_versions(&service_home, &options.locator, &tag),
            )
            .await?;

        warnings += registrar.activate(&units, vhost.is_some()).await;
        log.record(InstallStage::ReloadAndActivate);

        if warnings > 0 {
            println!(
                "{} {service} {tag} ({warnings} service-manager calls failed, see warnings)",
                "Installed".yellow().bold()
            );
        } else {
            println!("{} {service} {tag}", "Installed".green().bold());
        }

        Ok(InstallReport {
            service: service.to_string(),
            version: tag,
            previous_version,
            install_dir,
            units,
            vhost,
            pruned,
            warnings,
            log,
        })
    }

    fn unit_specs(
        &self,
        options: &InstallOptions,
        manifest: &AppManifest,
        deps: &ResolvedDependencies,
        install_dir: &std::path::Path,
        owner: Ownership,
    ) -> Vec<UnitSpec> {
        let service = &options.service_name;
        let working_dir = install_dir.display().to_string();

        let primary = UnitSpec {
            app_name: service.clone(),
            exec_start: deps.command_line(&manifest.run).join(" "),
            env: options.primary_env(),
            working_dir: working_dir.clone(),
            uid: owner.uid,
            gid: owner.gid,
        };

        let workers = manifest.workers.iter().map(|worker| UnitSpec {
            app_name: worker.unit_name(service),
            exec_start: deps.command_line(&worker.run).join(" "),
            env: options.app_env.clone(),
            working_dir: working_dir.clone(),
            uid: owner.uid,
            gid: owner.gid,
        });

        std::iter::once(primary).chain(workers).collect()
    }

    /// Stop, disable and delete a service's units, vhost and version record.
    ///
    /// Every step is best-effort; install directories are left in place.
    ///
    /// # Errors
    ///
    /// Returns an error only if the install lock cannot be taken.
    pub async fn uninstall(&self, options: &UninstallOptions) -> Result<UninstallReport> {
        let service = options.service_name.as_str();
        let _lock = self.ledger.lock(service).await?;
        let registrar = ServiceRegistrar::new(self.config, self.host);

        println!("{} {service}", "Uninstalling".green().bold());

        let removed_version = self.ledger.installed_version(service).await.unwrap_or_else(|e| {
            tracing::warn!("Could not read the version record of {service}: {e:#}");
            None
        });
        let units = self.installed_units(options, removed_version.as_deref()).await;

        let mut warnings = registrar.deactivate(&units).await;
        registrar.remove_units(&units).await;
        if let Some(host) = &options.host {
            registrar.remove_vhost(host).await;
        }
        if let Err(e) = self.ledger.remove(service).await {
            tracing::warn!("Could not remove the version record of {service}: {e:#}");
        }
        warnings += registrar.reload().await;
        if options.host.is_some() {
            warnings += registrar.restart_proxy().await;
        }

        println!("{} {service}", "Uninstalled".green().bold());

        Ok(UninstallReport {
            service: service.to_string(),
            removed_version,
            units,
            warnings,
        })
    }

    /// The service unit plus the worker units of the installed version's manifest.
    async fn installed_units(&self, options: &UninstallOptions, version: Option<&str>) -> Vec<String> {
        let service = &options.service_name;
        let Some(version) = version else {
            return vec![service.clone()];
        };

        let install_dir = self
            .config
            .service_home(service)
            .join(options.locator.version_dir_name(version));
        match AppManifest::load(&install_dir).await {
            Ok(manifest) => manifest.unit_names(service),
            Err(e) => {
                tracing::debug!("No manifest for workers in {}: {e:#}", install_dir.display());
                vec![service.clone()]
            }
        }
    }
}
