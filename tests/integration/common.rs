//! Shared setup for the integration tests.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use instllr::config::GlobalConfig;
use instllr::github::ServiceLocator;
use instllr::orchestrator::{InstallOptions, InstallReport, Installer};
use instllr::test_utils::{
    PayloadBuilder, RecordingHost, StaticReleaseSource, init_test_logging, rooted_config,
};

pub const ASSET: &str = "svc-linux-x64.tar.xz";

/// A temporary host with its configuration and recording host.
pub struct TestHost {
    pub temp: TempDir,
    pub config: GlobalConfig,
    pub host: RecordingHost,
}

impl TestHost {
    pub fn new() -> Self {
        init_test_logging(None);
        let temp = TempDir::new().unwrap();
        let config = rooted_config(temp.path());
        Self {
            temp,
            config,
            host: RecordingHost::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn install_dir(&self, service: &str, tag: &str) -> PathBuf {
        self.config.service_home(service).join(format!("acme-svc-{tag}"))
    }

    pub fn unit(&self, unit: &str) -> String {
        std::fs::read_to_string(self.config.unit_path(unit)).unwrap()
    }

    pub async fn install(
        &self,
        source: &StaticReleaseSource,
        options: &InstallOptions,
    ) -> anyhow::Result<InstallReport> {
        Installer::new(&self.config, source, &self.host).install(options).await
    }
}

pub fn locator(tag: &str) -> ServiceLocator {
    if tag.is_empty() {
        ServiceLocator::latest("acme", "svc")
    } else {
        ServiceLocator::tagged("acme", "svc", tag)
    }
}

pub fn options(tag: &str) -> InstallOptions {
    InstallOptions::new(locator(tag))
}

/// Payload running `app --serve` that ships a marker file naming its version.
pub fn simple_payload(version: &str) -> Vec<u8> {
    PayloadBuilder::new(r#"{ "run": ["app", "--serve"] }"#)
        .executable("app", "#!/bin/sh\nexit 0\n")
        .file("VERSION", version)
        .build()
        .unwrap()
}

pub fn source_with(tags: &[&str]) -> StaticReleaseSource {
    tags.iter().fold(StaticReleaseSource::new(), |source, tag| {
        source.with_release(tag, ASSET, simple_payload(tag))
    })
}
