//! Release payloads and host configuration for tests.

use anyhow::Result;
use std::path::Path;

use crate::config::GlobalConfig;
use crate::manifest::MANIFEST_FILE;

/// Configuration with every host path below `root` and an unreachable GitHub API.
#[must_use]
pub fn rooted_config(root: &Path) -> GlobalConfig {
    GlobalConfig {
        gh_token: None,
        github_api_url: "http://127.0.0.1:9".to_string(),
        services_root: root.join("home"),
        ledger_dir: root.join("var/lib/instllr/versions"),
        systemd_dir: root.join("etc/systemd/system"),
        nginx_sites_dir: root.join("etc/nginx/sites-enabled"),
        nginx_log_root: root.join("var/log/nginx"),
        certs_root: root.join("etc/letsencrypt/live"),
        search_path: Vec::new(),
    }
}

/// Builds a `.tar.xz` release payload in memory.
///
/// ```rust,ignore
/// let bytes = PayloadBuilder::new(r#"{ "run": ["app", "--serve"] }"#)
///     .executable("app", "#!/bin/sh\nexit 0\n")
///     .nested("app-1.0.0")
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct PayloadBuilder {
    entries: Vec<(String, Vec<u8>, u32)>,
    prefix: Option<String>,
}

impl PayloadBuilder {
    /// A payload whose `instllr.json` is `manifest`.
    #[must_use]
    pub fn new(manifest: &str) -> Self {
        Self {
            entries: vec![(MANIFEST_FILE.to_string(), manifest.as_bytes().to_vec(), 0o644)],
            prefix: None,
        }
    }

    /// A payload without a manifest.
    #[must_use]
    pub const fn without_manifest() -> Self {
        Self {
            entries: Vec::new(),
            prefix: None,
        }
    }

    /// Add a regular file with mode 0644.
    #[must_use]
    pub fn file(self, path: &str, content: &str) -> Self {
        self.entry(path, content, 0o644)
    }

    /// Add an executable file with mode 0755.
    #[must_use]
    pub fn executable(self, path: &str, content: &str) -> Self {
        self.entry(path, content, 0o755)
    }

    /// Pack every entry under a single top-level directory.
    #[must_use]
    pub fn nested(mut self, dir: &str) -> Self {
        self.prefix = Some(dir.to_string());
        self
    }

    fn entry(mut self, path: &str, content: &str, mode: u32) -> Self {
        self.entries.push((path.to_string(), content.as_bytes().to_vec(), mode));
        self
    }

    /// Produce the compressed archive.
    ///
    /// # Errors
    ///
    /// Returns an error if an entry cannot be appended.
    pub fn build(&self) -> Result<Vec<u8>> {
        let encoder = xz2::write::XzEncoder::new(Vec::new(), 6);
        let mut builder = tar::Builder::new(encoder);

        for (path, content, mode) in &self.entries {
            let path = match &self.prefix {
                Some(prefix) => format!("{prefix}/{path}"),
                None => path.clone(),
            };
            let mut header = tar::Header::new_gnu();
            header.set_entry_type(tar::EntryType::Regular);
            header.set_size(content.len() as u64);
            header.set_mode(*mode);
            header.set_cksum();
            builder.append_data(&mut header, path, content.as_slice())?;
        }

        Ok(builder.into_inner()?.finish()?)
    }
}
