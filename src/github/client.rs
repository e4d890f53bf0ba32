//! `reqwest`-backed [`ReleaseSource`] talking to the GitHub REST API.

use anyhow::{Context, Result};
use colored::Colorize;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use super::{Release, ReleaseAsset, ReleaseSource, ServiceLocator};
use crate::core::InstllrError;

const API_VERSION: &str = "2022-11-28";

/// GitHub releases client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GitHubClient {
    /// Create a client for `api_url` (normally `https://api.github.com`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("instllr/", env!("CARGO_PKG_VERSION"))),
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    /// Release endpoint for a locator.
    #[must_use]
    pub fn release_url(&self, locator: &ServiceLocator) -> String {
        let selector = if locator.is_latest() {
            "latest".to_string()
        } else {
            format!("tags/{}", locator.tag)
        };
        format!("{}/repos/{}/{}/releases/{selector}", self.api_url, locator.owner, locator.repo)
    }

    fn get(&self, url: &str, accept: &'static str) -> reqwest::RequestBuilder {
        let request = self.http.get(url).header(ACCEPT, accept);
        match &self.token {
            Some(token) => request.header(AUTHORIZATION, format!("Bearer {token}")),
            None => request,
        }
    }

    async fn send(&self, url: &str, accept: &'static str) -> Result<reqwest::Response> {
        tracing::debug!(target: "github", "GET {url}");
        let response =
            self.get(url, accept).send().await.map_err(|e| InstllrError::NetworkError {
                operation: format!("GET {url}"),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(InstllrError::UnexpectedStatus {
                url: url.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        Ok(response)
    }
}

impl ReleaseSource for GitHubClient {
    async fn fetch_release(&self, locator: &ServiceLocator) -> Result<Release> {
        let url = self.release_url(locator);
        println!("{} {}", "Fetching GitHub release:".cyan(), url);

        let response = self.send(&url, "application/vnd.github+json").await?;
        let release: Release = response.json().await.map_err(|e| InstllrError::NetworkError {
            operation: format!("decoding release from {url}"),
            reason: e.to_string(),
        })?;

        tracing::debug!(
            target: "github",
            "Release {} ({} assets)",
            release.tag,
            release.assets.len()
        );
        Ok(release)
    }

    async fn download_asset(&self, asset: &ReleaseAsset, dir: &Path) -> Result<PathBuf> {
        let file_name = Path::new(&asset.name)
            .file_name()
            .map_or_else(|| format!("asset-{}", asset.id), |n| n.to_string_lossy().into_owned());
        let path = dir.join(file_name);

        let mut response = self.send(&asset.url, "application/octet-stream").await?;
        let mut file = tokio::fs::File::create(&path)
            .await
            .with_context(|| format!("Failed to create {}", path.display()))?;

        let mut written = 0usize;
        while let Some(chunk) = response.chunk().await.map_err(|e| InstllrError::NetworkError {
            operation: format!("downloading {}", asset.name),
            reason: e.to_string(),
        })? {
            file.write_all(&chunk)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            written += chunk.len();
        }
        file.flush().await?;

        tracing::debug!(target: "github", "Downloaded {} ({written} bytes)", asset.name);
        Ok(path)
    }
}
