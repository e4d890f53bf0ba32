//! Host-wide configuration for instllr.
//!
//! [`GlobalConfig`] is read once per invocation. It carries the release API credential and
//! the directories the installer mutates: service homes, version records, unit files,
//! proxy vhosts, proxy logs, and the TLS certificate root that is checked for each host.
//!
//! # Examples
//!
//! ```rust,no_run
//! use instllr::config::GlobalConfig;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GlobalConfig::load(None).await?;
//! println!("services live under {}", config.services_root.display());
//! println!("unit for api: {}", config.unit_path("api").display());
//! # Ok(())
//! # }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::core::InstllrError;

fn default_github_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_services_root() -> PathBuf {
    PathBuf::from("/home")
}

fn default_ledger_dir() -> PathBuf {
    PathBuf::from("/var/lib/instllr/versions")
}

fn default_systemd_dir() -> PathBuf {
    PathBuf::from("/etc/systemd/system")
}

fn default_nginx_sites_dir() -> PathBuf {
    PathBuf::from("/etc/nginx/sites-enabled")
}

fn default_nginx_log_root() -> PathBuf {
    PathBuf::from("/var/log/nginx")
}

fn default_certs_root() -> PathBuf {
    PathBuf::from("/etc/letsencrypt/live")
}

/// Host configuration loaded from `config.toml`.
///
/// Every field is optional in the file. Unknown keys are rejected so a misspelled
/// directory setting fails loudly instead of silently writing to the default location.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    /// Bearer token for the GitHub API.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gh_token: Option<String>,

    /// Base URL of the GitHub REST API.
    #[serde(default = "default_github_api_url")]
    pub github_api_url: String,

    /// Parent directory of every service home (`<services_root>/<service>`).
    #[serde(default = "default_services_root")]
    pub services_root: PathBuf,

    /// Directory holding one installed-version record per service.
    #[serde(default = "default_ledger_dir")]
    pub ledger_dir: PathBuf,

    /// Directory systemd loads unit files from.
    #[serde(default = "default_systemd_dir")]
    pub systemd_dir: PathBuf,

    /// Directory nginx includes vhost files from.
    #[serde(default = "default_nginx_sites_dir")]
    pub nginx_sites_dir: PathBuf,

    /// Parent of the per-host nginx log directories.
    #[serde(default = "default_nginx_log_root")]
    pub nginx_log_root: PathBuf,

    /// Parent of the per-host TLS certificate directories.
    #[serde(default = "default_certs_root")]
    pub certs_root: PathBuf,

    /// Extra directories searched before `PATH` for dependencies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub search_path: Vec<PathBuf>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            gh_token: None,
            github_api_url: default_github_api_url(),
            services_root: default_services_root(),
            ledger_dir: default_ledger_dir(),
            systemd_dir: default_systemd_dir(),
            nginx_sites_dir: default_nginx_sites_dir(),
            nginx_log_root: default_nginx_log_root(),
            certs_root: default_certs_root(),
            search_path: Vec::new(),
        }
    }
}

impl GlobalConfig {
    /// Load the configuration from `path`, or from the default location.
    ///
    /// A file that does not exist yields [`GlobalConfig::default`].
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        if path.exists() {
            Self::load_from(&path).await
        } else {
            tracing::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Load the configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not valid TOML for this schema.
    pub async fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content).map_err(|e| {
            InstllrError::ConfigError {
                message: format!("{}: {}", path.display(), e.message()),
            }
            .into()
        })
    }

    /// Default config location: `INSTLLR_CONFIG_PATH`, else `~/.instllr/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn default_path() -> Result<PathBuf> {
        if let Ok(path) = std::env::var("INSTLLR_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let home = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Unable to determine home directory"))?;
        Ok(home.join(".instllr").join("config.toml"))
    }

    /// Pick the GitHub token: command line, then config file, then `GH_TOKEN`.
    #[must_use]
    pub fn resolve_token(&self, cli_token: Option<&str>) -> Option<String> {
        cli_token
            .map(str::to_string)
            .or_else(|| self.gh_token.clone())
            .or_else(|| std::env::var("GH_TOKEN").ok())
            .filter(|token| !token.is_empty())
    }

    /// Home directory of a service, e.g. `/home/api`.
    #[must_use]
    pub fn service_home(&self, service: &str) -> PathBuf {
        self.services_root.join(service)
    }

    /// Unit file of a service-manager unit, e.g. `/etc/systemd/system/api.service`.
    #[must_use]
    pub fn unit_path(&self, unit: &str) -> PathBuf {
        self.systemd_dir.join(format!("{unit}.service"))
    }

    /// Vhost file for a public host, e.g. `/etc/nginx/sites-enabled/api.example.com.conf`.
    #[must_use]
    pub fn vhost_path(&self, host: &str) -> PathBuf {
        self.nginx_sites_dir.join(format!("{host}.conf"))
    }

    /// Log directory for a public host.
    #[must_use]
    pub fn nginx_log_dir(&self, host: &str) -> PathBuf {
        self.nginx_log_root.join(host)
    }

    /// Expected TLS certificate directory for a public host.
    #[must_use]
    pub fn cert_dir(&self, host: &str) -> PathBuf {
        self.certs_root.join(host)
    }

    /// `search_path` followed by the process `PATH`, ready for `which_in` or `Command::env`.
    #[must_use]
    pub fn effective_path(&self) -> Option<OsString> {
        let mut dirs: Vec<PathBuf> = self.search_path.clone();
        if let Some(path) = std::env::var_os("PATH") {
            dirs.extend(std::env::split_paths(&path));
        }
        if dirs.is_empty() {
            return None;
        }
        std::env::join_paths(dirs).ok()
    }
}
