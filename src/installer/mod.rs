//! Archive installer: turn an extracted payload into a versioned install directory.
//!
//! A release is installed into `<services_root>/<service>/<owner>-<repo>-<tag>`:
//!
//! 1. An existing directory for the same version is removed (re-installing a version
//!    recreates it from scratch).
//! 2. The payload tree is copied in with file modes preserved.
//! 3. The manifest's `install` steps run in order inside the directory, with inherited
//!    stdout/stderr. The first failing step aborts; earlier steps are not undone.
//! 4. The directory is handed to the service's system user.

pub mod archive;

use anyhow::{Context, Result};
use colored::Colorize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::deps::ResolvedDependencies;
use crate::host::{Host, Ownership, SystemCommand};
use crate::utils;

pub use archive::{extract, extract_tar_xz};

/// Stages payloads and runs install steps.
#[derive(Debug, Clone, Default)]
pub struct ArchiveInstaller {
    search_path: Option<OsString>,
}

impl ArchiveInstaller {
    /// Installer whose install steps see `search_path` as `PATH` when given.
    #[must_use]
    pub const fn new(search_path: Option<OsString>) -> Self {
        Self {
            search_path,
        }
    }

    /// Replace `target` with a copy of `payload`.
    ///
    /// # Errors
    ///
    /// Returns an error if the old directory cannot be removed or the copy fails.
    pub async fn stage(&self, payload: &Path, target: &Path) -> Result<()> {
        let (payload, target): (PathBuf, PathBuf) = (payload.to_path_buf(), target.to_path_buf());

        tokio::task::spawn_blocking(move || -> Result<()> {
            if target.exists() {
                tracing::warn!("Replacing existing install directory {}", target.display());
                utils::remove_dir_all(&target)?;
            }
            utils::ensure_dir(&target)?;
            utils::copy_tree(&payload, &target)
                .with_context(|| format!("Failed to stage payload into {}", target.display()))
        })
        .await
        .context("Failed to spawn blocking task for staging")?
    }

    /// Run every install step in `target`, substituting resolved dependency paths.
    ///
    /// # Errors
    ///
    /// Returns [`crate::core::InstllrError::CommandFailed`] for the first step that fails.
    pub async fn run_install_steps(
        &self,
        steps: &[Vec<String>],
        target: &Path,
        deps: &ResolvedDependencies,
    ) -> Result<()> {
        for (index, step) in steps.iter().enumerate() {
            let argv = deps.command_line(step);
            println!("{} {}", format!("Install step {}:", index + 1).cyan(), argv.join(" "));

            let mut cmd = SystemCommand::from_argv(&argv)?.current_dir(target).inherit_stdio();
            if let Some(path) = &self.search_path {
                cmd = cmd.env("PATH", path.clone());
            }
            cmd.execute().await.with_context(|| format!("Install step {} failed", index + 1))?;
        }
        Ok(())
    }

    /// Make sure the service user exists and give it its home and the install directory.
    ///
    /// The home is created by [`stage`](Self::stage) before the user exists, so it is
    /// handed over explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if the user cannot be created or ownership cannot be changed.
    pub async fn apply_ownership<H: Host>(
        &self,
        host: &H,
        service: &str,
        home: &Path,
        target: &Path,
    ) -> Result<Ownership> {
        let owner = host.ensure_user(service, home).await?;
        host.chown(home, owner)
            .await
            .with_context(|| format!("Failed to hand {} to {service}", home.display()))?;
        host.chown_recursive(target, owner)
            .await
            .with_context(|| format!("Failed to hand {} to {service}", target.display()))?;
        Ok(owner)
    }
}
