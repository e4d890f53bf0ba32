//! Release fetching from GitHub.
//!
//! The installer only needs two capabilities from the release host, expressed by the
//! [`ReleaseSource`] trait: fetch the metadata of one release, and download one of its assets
//! to disk. [`GitHubClient`] implements them over the GitHub REST API; tests substitute an
//! in-memory source.
//!
//! # Module Organization
//!
//! - [`locator`] - `<owner>/<repo>[:<tag>]` parsing
//! - [`release`] - Release metadata and asset selection
//! - [`client`] - The HTTP implementation

pub mod client;
pub mod locator;
pub mod release;

pub use client::GitHubClient;
pub use locator::{ServiceLocator, validate_tag};
pub use release::{Release, ReleaseAsset};

use anyhow::Result;
use std::future::Future;
use std::path::{Path, PathBuf};

/// Where releases come from.
pub trait ReleaseSource {
    /// Fetch the release a locator points at (the latest one when it has no tag).
    fn fetch_release(&self, locator: &ServiceLocator) -> impl Future<Output = Result<Release>>;

    /// Download an asset into `dir`, returning the path of the written file.
    fn download_asset(
        &self,
        asset: &ReleaseAsset,
        dir: &Path,
    ) -> impl Future<Output = Result<PathBuf>>;
}
