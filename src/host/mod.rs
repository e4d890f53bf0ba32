//! Everything instllr changes on the host outside its own files.
//!
//! The [`Host`] trait is the seam between the install pipeline and live OS state: the user
//! database, file ownership and the service manager. [`SystemHost`] implements it with
//! `id`, `useradd`, `chown` and `systemctl`; tests use a recording implementation instead.
//!
//! Service-manager calls return [`Advisory`] rather than `Result`. The unit being stopped or
//! disabled may legitimately not exist yet, so those failures are logged and never abort.
//!
//! # Module Organization
//!
//! - [`command`] - [`SystemCommand`] builder with critical and advisory execution
//! - [`system`] - [`SystemHost`], the real implementation

pub mod command;
pub mod system;

pub use command::{Advisory, CommandOutput, SystemCommand};
pub use system::SystemHost;

use anyhow::Result;
use std::fmt;
use std::future::Future;
use std::path::Path;

/// Numeric owner of a service's files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ownership {
    /// User id
    pub uid: u32,
    /// Group id
    pub gid: u32,
}

/// Service-manager action applied to one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAction {
    /// Stop the unit
    Stop,
    /// Start the unit
    Start,
    /// Enable the unit at boot
    Enable,
    /// Disable the unit at boot
    Disable,
}

impl ServiceAction {
    /// `systemctl` verb for this action.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Stop => "stop",
            Self::Start => "start",
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// OS user database, file ownership and service manager.
pub trait Host {
    /// Make sure a system user named `name` exists, creating it with `home` as its home
    /// directory if needed, and return its ids.
    fn ensure_user(&self, name: &str, home: &Path) -> impl Future<Output = Result<Ownership>>;

    /// Change the owner of `path` itself, leaving its contents alone.
    fn chown(&self, path: &Path, owner: Ownership) -> impl Future<Output = Result<()>>;

    /// Recursively change the owner of `path`.
    fn chown_recursive(&self, path: &Path, owner: Ownership) -> impl Future<Output = Result<()>>;

    /// Apply an action to a unit.
    fn service(&self, action: ServiceAction, unit: &str) -> impl Future<Output = Advisory>;

    /// Make the service manager re-read unit files.
    fn reload_units(&self) -> impl Future<Output = Advisory>;

    /// Restart the reverse proxy.
    fn restart_proxy(&self) -> impl Future<Output = Advisory>;
}
