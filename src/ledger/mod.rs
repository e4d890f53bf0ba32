//! Version ledger: which release tag is live for each service.
//!
//! The ledger directory holds one file per service name whose content is exactly the
//! installed release tag. It is created by the first successful install, overwritten by each
//! upgrade and deleted by uninstall. Every install consults it before changing anything, so
//! re-installing the live version or downgrading aborts early.
//!
//! The ledger also prunes superseded version directories from a service home after an
//! upgrade, and provides the per-service [`InstallLock`].
//!
//! ```text
//! /var/lib/instllr/versions/
//! ├── .locks/
//! │   └── api.lock
//! ├── api            # "1.2.0"
//! └── web            # "v3.0.1"
//! ```

pub mod lock;

pub use lock::InstallLock;

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};

use crate::core::InstllrError;
use crate::github::ServiceLocator;
use crate::utils;
use crate::version::VersionComparator;

/// Installed-version records for every service on this host.
#[derive(Debug, Clone)]
pub struct VersionLedger {
    dir: PathBuf,
    comparator: VersionComparator,
}

impl VersionLedger {
    /// Ledger stored in `dir`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            comparator: VersionComparator::default(),
        }
    }

    /// Ledger directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Record file of a service.
    #[must_use]
    pub fn record_path(&self, service: &str) -> PathBuf {
        self.dir.join(service)
    }

    /// Take the install lock for a service.
    ///
    /// # Errors
    ///
    /// See [`InstallLock::acquire`].
    pub async fn lock(&self, service: &str) -> Result<InstallLock> {
        InstallLock::acquire(&self.dir, service).await
    }

    /// The live version of a service, `None` if it was never installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be read.
    pub async fn installed_version(&self, service: &str) -> Result<Option<String>> {
        let path = self.record_path(service);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let version = content.trim();
                Ok((!version.is_empty()).then(|| version.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", path.display())),
        }
    }

    /// Decide whether `release_tag` may be installed over the live version.
    ///
    /// Returns the live version, `None` on a first install.
    ///
    /// # Errors
    ///
    /// - [`InstllrError::DowngradeRejected`] if `release_tag` is older than the live version
    /// - [`InstllrError::AlreadyInstalled`] if `release_tag` is exactly the live version
    /// - [`InstllrError::VersionFormatMismatch`] if the two tags have different arity
    pub async fn check_installed_version(
        &self,
        service: &str,
        release_tag: &str,
    ) -> Result<Option<String>> {
        let Some(installed) = self.installed_version(service).await? else {
            return Ok(None);
        };

        if self.comparator.compare(release_tag, &installed)?.is_lt() {
            return Err(InstllrError::DowngradeRejected {
                service: service.to_string(),
                installed,
                requested: release_tag.to_string(),
            }
            .into());
        }

        if release_tag == installed {
            return Err(InstllrError::AlreadyInstalled {
                service: service.to_string(),
                version: installed,
            }
            .into());
        }

        Ok(Some(installed))
    }

    /// Record `release_tag` as the live version of a service.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    pub async fn store_version(&self, service: &str, release_tag: &str) -> Result<()> {
        let path = self.record_path(service);
        let content = release_tag.to_string();
        tokio::task::spawn_blocking(move || utils::atomic_write(&path, content.as_bytes()))
            .await
            .context("Failed to spawn blocking task for ledger write")??;
        tracing::debug!("Recorded {service} = {release_tag}");
        Ok(())
    }

    /// Delete the record of a service. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the record exists but cannot be removed.
    pub async fn remove(&self, service: &str) -> Result<bool> {
        let path = self.record_path(service);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
        }
    }

    /// Delete every version directory of `locator`'s repository in `service_home` whose tag is
    /// older than `release_tag`. Returns the removed directories.
    ///
    /// The directory of `release_tag` and any newer one are kept. A directory whose tag has a
    /// different arity than `release_tag` cannot be ordered; it is kept and a warning logged.
    ///
    /// # Errors
    ///
    /// Returns an error if `service_home` cannot be listed or a directory cannot be removed.
    pub async fn remove_old_versions(
        &self,
        service_home: &Path,
        locator: &ServiceLocator,
        release_tag: &str,
    ) -> Result<Vec<PathBuf>> {
        let prefix = locator.dir_prefix();
        let mut removed = Vec::new();

        let mut entries = tokio::fs::read_dir(service_home)
            .await
            .with_context(|| format!("Failed to read directory: {}", service_home.display()))?;

        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(tag) = name.strip_prefix(&prefix) else {
                continue;
            };
            if tag == release_tag {
                continue;
            }

            match self.comparator.compare(tag, release_tag) {
                Ok(ordering) if ordering.is_lt() => {
                    let path = entry.path();
                    println!("{} {}", "Removing old version:".yellow(), path.display());
                    utils::remove_dir_all(&path)?;
                    removed.push(path);
                }
                Ok(_) => tracing::debug!("Keeping {name}, not older than {release_tag}"),
                // Unlike the ledger check, an arity mismatch here is not fatal: the
                // directory is kept with a warning and the install goes on.
                Err(e) => tracing::warn!("Keeping {name}: {e}"),
            }
        }

        removed.sort();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn error_of(err: &anyhow::Error) -> &InstllrError {
        err.downcast_ref::<InstllrError>().unwrap()
    }

    #[tokio::test]
    async fn test_first_install_proceeds() {
        let temp = TempDir::new().unwrap();
        let ledger = VersionLedger::new(temp.path());

        assert_eq!(ledger.check_installed_version("svc", "1.2.0").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_same_version_is_noop() {
        let temp = TempDir::new().unwrap();
        let ledger = VersionLedger::new(temp.path());
        ledger.store_version("svc", "1.2.0").await.unwrap();

        let err = ledger.check_installed_version("svc", "1.2.0").await.unwrap_err();
        assert!(matches!(error_of(&err), InstllrError::AlreadyInstalled { .. }));
    }

    #[tokio::test]
    async fn test_downgrade_rejected() {
        let temp = TempDir::new().unwrap();
        let ledger = VersionLedger::new(temp.path());
        ledger.store_version("svc", "1.2.0").await.unwrap();

        let err = ledger.check_installed_version("svc", "1.1.0").await.unwrap_err();
        match error_of(&err) {
            InstllrError::DowngradeRejected {
                installed,
                requested,
                ..
            } => {
                assert_eq!(installed, "1.2.0");
                assert_eq!(requested, "1.1.0");
            }
            other => panic!("Expected DowngradeRejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_upgrade_returns_previous() {
        let temp = TempDir::new().unwrap();
        let ledger = VersionLedger::new(temp.path());
        ledger.store_version("svc", "1.2.0").await.unwrap();

        assert_eq!(
            ledger.check_installed_version("svc", "1.3.0").await.unwrap().as_deref(),
            Some("1.2.0")
        );
    }

    #[tokio::test]
    async fn test_record_is_exactly_the_tag() {
        let temp = TempDir::new().unwrap();
        let ledger = VersionLedger::new(temp.path());
        ledger.store_version("svc", "v2.0.0").await.unwrap();

        assert_eq!(std::fs::read_to_string(temp.path().join("svc")).unwrap(), "v2.0.0");
        assert!(ledger.remove("svc").await.unwrap());
        assert!(!ledger.remove("svc").await.unwrap());
        assert_eq!(ledger.installed_version("svc").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_remove_old_versions() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().join("home");
        for dir in ["acme-svc-1.0.0", "acme-svc-1.1.0", "acme-svc-1.2.0", "other-svc-0.1.0"] {
            std::fs::create_dir_all(home.join(dir)).unwrap();
        }
        std::fs::write(home.join("acme-svc-0.9.0"), "a file, not a version").unwrap();

        let ledger = VersionLedger::new(temp.path().join("ledger"));
        let locator = ServiceLocator::tagged("acme", "svc", "1.2.0");
        let removed = ledger.remove_old_versions(&home, &locator, "1.2.0").await.unwrap();

        assert_eq!(removed, vec![home.join("acme-svc-1.0.0"), home.join("acme-svc-1.1.0")]);
        assert!(home.join("acme-svc-1.2.0").is_dir());
        assert!(home.join("other-svc-0.1.0").is_dir());
        assert!(home.join("acme-svc-0.9.0").is_file());
    }

    #[tokio::test]
    async fn test_prune_keeps_newer_and_unorderable() {
        let temp = TempDir::new().unwrap();
        let home = temp.path().to_path_buf();
        for dir in ["acme-svc-1.3.0", "acme-svc-1.2", "acme-svc-1.2.0"] {
            std::fs::create_dir_all(home.join(dir)).unwrap();
        }

        let ledger = VersionLedger::new(temp.path().join("ledger"));
        let locator = ServiceLocator::tagged("acme", "svc", "1.2.0");
        let removed = ledger.remove_old_versions(&home, &locator, "1.2.0").await.unwrap();

        assert!(removed.is_empty());
        assert!(home.join("acme-svc-1.3.0").is_dir());
        assert!(home.join("acme-svc-1.2").is_dir());
    }
}
