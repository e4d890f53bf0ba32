//! [`Host`] implementation backed by the real system tools.

use anyhow::{Context, Result};
use std::path::Path;

use super::{Advisory, Host, Ownership, ServiceAction, SystemCommand};

/// The local machine: `id`, `useradd`, `chown(2)` and `systemctl`.
#[derive(Debug, Clone, Default)]
pub struct SystemHost;

impl SystemHost {
    /// Create the host handle.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    async fn id(flag: &str, name: &str) -> Result<u32> {
        let raw = SystemCommand::new("id").args([flag, name]).output_trimmed().await?;
        raw.parse().with_context(|| format!("Unexpected output from id {flag} {name}: '{raw}'"))
    }
}

impl Host for SystemHost {
    async fn ensure_user(&self, name: &str, home: &Path) -> Result<Ownership> {
        if Self::id("-u", name).await.is_err() {
            tracing::info!("Creating system user {name}");
            SystemCommand::new("useradd")
                .arg("--system")
                .arg("--home-dir")
                .arg(home.display().to_string())
                .args(["--create-home", "--shell", "/usr/sbin/nologin"])
                .arg(name)
                .execute()
                .await
                .with_context(|| format!("Failed to create user {name}"))?;
        }

        let ownership = Ownership {
            uid: Self::id("-u", name).await?,
            gid: Self::id("-g", name).await?,
        };
        tracing::debug!("User {name} is {}:{}", ownership.uid, ownership.gid);
        Ok(ownership)
    }

    async fn chown(&self, path: &Path, owner: Ownership) -> Result<()> {
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || chown_one(&path, owner))
            .await
            .context("Failed to spawn blocking task for chown")?
    }

    async fn chown_recursive(&self, path: &Path, owner: Ownership) -> Result<()> {
        let root = path.to_path_buf();
        tokio::task::spawn_blocking(move || chown_tree(&root, owner))
            .await
            .context("Failed to spawn blocking task for chown")?
    }

    async fn service(&self, action: ServiceAction, unit: &str) -> Advisory {
        SystemCommand::new("systemctl").args([action.verb(), unit]).execute_advisory().await
    }

    async fn reload_units(&self) -> Advisory {
        SystemCommand::new("systemctl").arg("daemon-reload").execute_advisory().await
    }

    async fn restart_proxy(&self) -> Advisory {
        SystemCommand::new("systemctl").args(["restart", "nginx"]).execute_advisory().await
    }
}

#[cfg(unix)]
fn chown_tree(root: &Path, owner: Ownership) -> Result<()> {
    use std::os::unix::fs::{chown, lchown};

    for entry in walkdir::WalkDir::new(root).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        let path = entry.path();
        let result = if entry.path_is_symlink() {
            lchown(path, Some(owner.uid), Some(owner.gid))
        } else {
            chown(path, Some(owner.uid), Some(owner.gid))
        };
        result.with_context(|| format!("Failed to chown {}", path.display()))?;
    }
    Ok(())
}

#[cfg(unix)]
fn chown_one(path: &Path, owner: Ownership) -> Result<()> {
    std::os::unix::fs::chown(path, Some(owner.uid), Some(owner.gid))
        .with_context(|| format!("Failed to chown {}", path.display()))
}

#[cfg(not(unix))]
fn chown_one(path: &Path, _owner: Ownership) -> Result<()> {
    anyhow::bail!("Changing ownership of {} is only supported on Unix", path.display())
}

#[cfg(not(unix))]
fn chown_tree(root: &Path, _owner: Ownership) -> Result<()> {
    anyhow::bail!("Changing ownership of {} is only supported on Unix", root.display())
}
