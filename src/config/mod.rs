//! Configuration management for instllr
//!
//! instllr has a single, host-wide configuration file. It holds the GitHub credential and
//! every filesystem location the installer writes to, so a host with a non-standard layout
//! (different nginx include directory, services outside `/home`) only needs a config file.
//!
//! # Modules
//!
//! - `global` - Loading, defaults and path helpers for the host configuration
//!
//! # Configuration File (`~/.instllr/config.toml`)
//!
//! **Location:**
//! - `--config <path>` when given
//! - `INSTLLR_CONFIG_PATH` when set
//! - `~/.instllr/config.toml` otherwise
//!
//! A missing file is not an error; every field has a default.
//!
//! ```toml
//! gh_token = "ghp_xxxxxxxxxxxx"
//! services_root = "/srv"
//! nginx_sites_dir = "/etc/nginx/conf.d"
//! search_path = ["/opt/node-18/bin"]
//! ```
//!
//! # Credential Precedence
//!
//! 1. `--gh-token` on the command line
//! 2. `gh_token` in the config file
//! 3. `GH_TOKEN` in the environment
//!
//! The file is written with `0600` permissions on Unix since it may contain the token.

pub mod global;

pub use global::GlobalConfig;
