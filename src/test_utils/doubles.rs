//! In-memory stand-ins for the host and GitHub.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::InstllrError;
use crate::github::{Release, ReleaseAsset, ReleaseSource, ServiceLocator};
use crate::host::{Advisory, Host, Ownership, ServiceAction};

/// Records host calls as strings such as `"useradd api"`, `"stop api"` or
/// `"daemon-reload"`.
///
/// `ensure_user` creates the home directory and reports the ids of the current process, so
/// installs work without root.
#[derive(Debug, Default)]
pub struct RecordingHost {
    calls: Mutex<Vec<String>>,
    fail_services: bool,
}

impl RecordingHost {
    /// A host where every call succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A host where every service-manager call fails.
    #[must_use]
    pub fn failing_services() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_services: true,
        }
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    /// Forget recorded calls.
    pub fn clear(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, call: String) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn outcome(&self, call: String) -> Advisory {
        self.record(call.clone());
        if self.fail_services {
            Advisory::Failed {
                command: call,
                reason: "service manager unavailable".to_string(),
            }
        } else {
            Advisory::Succeeded
        }
    }
}

impl Host for RecordingHost {
    async fn ensure_user(&self, name: &str, home: &Path) -> Result<Ownership> {
        self.record(format!("useradd {name}"));
        tokio::fs::create_dir_all(home)
            .await
            .with_context(|| format!("Failed to create {}", home.display()))?;

        owner_of(home).await
    }

    async fn chown(&self, path: &Path, owner: Ownership) -> Result<()> {
        self.record(format!("chown {}:{} {}", owner.uid, owner.gid, path.display()));
        Ok(())
    }

    async fn chown_recursive(&self, path: &Path, owner: Ownership) -> Result<()> {
        self.record(format!("chown -R {}:{} {}", owner.uid, owner.gid, path.display()));
        Ok(())
    }

    async fn service(&self, action: ServiceAction, unit: &str) -> Advisory {
        self.outcome(format!("{action} {unit}"))
    }

    async fn reload_units(&self) -> Advisory {
        self.outcome("daemon-reload".to_string())
    }

    async fn restart_proxy(&self) -> Advisory {
        self.outcome("restart nginx".to_string())
    }
}

#[cfg(unix)]
async fn owner_of(path: &Path) -> Result<Ownership> {
    use std::os::unix::fs::MetadataExt;
    let metadata = tokio::fs::metadata(path).await?;
    Ok(Ownership {
        uid: metadata.uid(),
        gid: metadata.gid(),
    })
}

#[cfg(not(unix))]
async fn owner_of(_path: &Path) -> Result<Ownership> {
    Ok(Ownership {
        uid: 0,
        gid: 0,
    })
}

/// Serves releases from memory. The most recently added release is `latest`.
#[derive(Debug, Default)]
pub struct StaticReleaseSource {
    releases: Vec<(Release, Vec<u8>)>,
}

impl StaticReleaseSource {
    /// A source without releases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a release `tag` carrying one asset `asset_name` with `payload` as content.
    #[must_use]
    pub fn with_release(mut self, tag: &str, asset_name: &str, payload: Vec<u8>) -> Self {
        let id = self.releases.len() as u64 + 1;
        let release = Release {
            id,
            tag: tag.to_string(),
            name: Some(tag.to_string()),
            assets: vec![ReleaseAsset {
                id,
                name: asset_name.to_string(),
                url: format!("https://api.github.test/assets/{id}"),
            }],
        };
        self.releases.push((release, payload));
        self
    }
}

impl ReleaseSource for StaticReleaseSource {
    async fn fetch_release(&self, locator: &ServiceLocator) -> Result<Release> {
        let found = if locator.is_latest() {
            self.releases.last()
        } else {
            self.releases.iter().find(|(release, _)| release.tag == locator.tag)
        };

        found.map(|(release, _)| release.clone()).ok_or_else(|| {
            InstllrError::UnexpectedStatus {
                url: format!("https://api.github.test/repos/{}/{}", locator.owner, locator.repo),
                status: 404,
            }
            .into()
        })
    }

    async fn download_asset(&self, asset: &ReleaseAsset, dir: &Path) -> Result<PathBuf> {
        let (_, payload) = self
            .releases
            .iter()
            .find(|(release, _)| release.assets.iter().any(|a| a.id == asset.id))
            .ok_or_else(|| InstllrError::UnexpectedStatus {
                url: asset.url.clone(),
                status: 404,
            })?;

        let path = dir.join(&asset.name);
        tokio::fs::write(&path, payload).await?;
        Ok(path)
    }
}
