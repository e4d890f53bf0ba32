//! instllr - install GitHub releases as managed systemd services
//!
//! instllr takes a `<owner>/<repo>[:<tag>]` locator, downloads the release's `.tar.xz`
//! asset, checks the host executables the application declares, installs the payload into
//! a versioned directory under the service's home and registers it with systemd. An nginx
//! vhost is written when the service is public. Upgrades replace the units in place,
//! record the new version and prune older install directories.
//!
//! # Release Payload
//!
//! Every payload carries an `instllr.json` at its root (or inside a single top-level
//! directory):
//!
//! ```json
//! {
//!   "require": [{ "app": "node", "version": ["node", "--version"], "minVersion": "18.0.0" }],
//!   "install": [["npm", "ci", "--omit=dev"]],
//!   "run": ["node", "server.js"],
//!   "env": { "require": ["DATABASE_URL"] },
//!   "workers": [{ "name": "queue", "run": ["node", "worker.js"] }]
//! }
//! ```
//!
//! # Host Layout
//!
//! | Path | Content |
//! |------|---------|
//! | `/home/<service>/<owner>-<repo>-<tag>/` | Install directory |
//! | `/etc/systemd/system/<unit>.service` | Service and worker units |
//! | `/etc/nginx/sites-enabled/<host>.conf` | Vhost of a public service |
//! | `/var/lib/instllr/versions/<service>` | Installed version record |
//!
//! Every path is configurable in `~/.instllr/config.toml`, see [`config::GlobalConfig`].
//!
//! # Modules
//!
//! ## Pipeline
//! - [`orchestrator`] - Install and uninstall pipelines with a stage log
//! - [`installer`] - Archive extraction, payload staging and install steps
//! - [`registrar`] - systemd units, nginx vhosts and service activation
//! - [`ledger`] - Installed-version records, install locks and pruning
//!
//! ## Inputs
//! - [`github`] - Release locators, release metadata and asset downloads
//! - [`manifest`] - `instllr.json` parsing and validation
//! - [`deps`] - Host executable resolution and environment checks
//!
//! ## Supporting Modules
//! - [`cli`] - Command-line interface
//! - [`config`] - Host configuration
//! - [`core`] - Error types and user-facing diagnostics
//! - [`host`] - User accounts, ownership and service-manager calls
//! - [`utils`] - File system helpers
//! - [`version`] - Version string comparison
//!
//! # Library Use
//!
//! ```rust,no_run
//! use instllr::config::GlobalConfig;
//! use instllr::github::{GitHubClient, ServiceLocator};
//! use instllr::host::SystemHost;
//! use instllr::orchestrator::{InstallOptions, Installer};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let config = GlobalConfig::load(None).await?;
//! let client = GitHubClient::new(&config.github_api_url, config.resolve_token(None))?;
//! let host = SystemHost::new();
//!
//! let mut options = InstallOptions::new("acme/api:v1.4.0".parse::<ServiceLocator>()?);
//! options.host = Some("api.example.com".to_string());
//! options.port = Some(8080);
//!
//! let report = Installer::new(&config, &client, &host).install(&options).await?;
//! println!("{} {} in {}", report.service, report.version, report.install_dir.display());
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod core;

pub mod github;
pub mod manifest;

pub mod deps;
pub mod host;
pub mod installer;
pub mod ledger;
pub mod orchestrator;
pub mod registrar;

pub mod utils;
pub mod version;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
