//! Per-service install lock.
//!
//! Two instllr processes touching the same service would race on its install directory and
//! version record. Every install and uninstall holds an exclusive [`fs4`] lock on
//! `<ledger_dir>/.locks/<service>.lock` for its whole duration; a second invocation waits
//! until the first one finishes. Different services never block each other.

use anyhow::{Context, Result};
use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Held while an install or uninstall of one service is in progress. Released on drop.
#[derive(Debug)]
pub struct InstallLock {
    file: File,
    path: PathBuf,
}

impl InstallLock {
    /// Block until the lock for `service` is ours.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock directory or file cannot be created, or locking fails.
    pub async fn acquire(ledger_dir: &Path, service: &str) -> Result<Self> {
        let locks_dir = ledger_dir.join(".locks");
        tokio::fs::create_dir_all(&locks_dir).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::PermissionDenied {
                anyhow::anyhow!(
                    "Permission denied: cannot create locks directory at {}",
                    locks_dir.display()
                )
            } else {
                anyhow::anyhow!("Failed to create directory {}: {}", locks_dir.display(), e)
            }
        })?;

        let lock_path = locks_dir.join(format!("{service}.lock"));
        let lock_path_clone = lock_path.clone();
        let service = service.to_string();

        let file = tokio::task::spawn_blocking(move || -> Result<File> {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&lock_path_clone)
                .with_context(|| {
                    format!("Failed to open lock file: {}", lock_path_clone.display())
                })?;

            if !file.try_lock_exclusive().unwrap_or(false) {
                tracing::info!("Waiting for another instllr run on {service} to finish");
                file.lock_exclusive()
                    .with_context(|| format!("Failed to acquire install lock for {service}"))?;
            }

            Ok(file)
        })
        .await
        .context("Failed to spawn blocking task for lock acquisition")??;

        tracing::debug!("Acquired install lock {}", lock_path.display());
        Ok(Self {
            file,
            path: lock_path,
        })
    }
}

impl Drop for InstallLock {
    fn drop(&mut self) {
        #[allow(unstable_name_collisions)]
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to unlock {}: {}", self.path.display(), e);
        }
    }
}
