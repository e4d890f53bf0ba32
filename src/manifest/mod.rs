//! Application manifest (`instllr.json`) parsing and validation.
//!
//! Every release payload ships an `instllr.json` at its root describing what the host must
//! provide and how to run the application:
//!
//! ```json
//! {
//!   "require": [
//!     { "app": "node", "version": ["node", "--version"], "minVersion": "16.0.0" }
//!   ],
//!   "install": ["npm ci --omit=dev"],
//!   "run": ["node", "server.js"],
//!   "env": { "require": ["DATABASE_URL"] },
//!   "workers": [{ "name": "queue", "run": ["node", "worker.js"] }]
//! }
//! ```
//!
//! # Schema Tolerance
//!
//! Manifests written for older instllr releases are still accepted:
//!
//! - `run`, worker `run` and each `install` step may be a single command string
//!   (`"node server.js"`) or an argv list (`["node", "server.js"]`), see [`CommandSpec`]
//! - `minVersion` may be omitted; the version is then reported but not checked
//! - `require`, `install`, `env` and `workers` may all be omitted
//!
//! Parsing happens in two steps: serde reads the tolerant raw shape, then
//! [`AppManifest::from_raw`] validates field by field and reports a named
//! [`ManifestErrorKind`](crate::core::ManifestErrorKind) on failure.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::InstllrError;

mod validation;


/// File name of the manifest inside the release payload.
pub const MANIFEST_FILE: &str = "instllr.json";

/// A command given either as one string or as an argv list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandSpec {
    /// `["node", "server.js"]`
    Argv(Vec<String>),
    /// `"node server.js"`, split on whitespace
    Line(String),
}

impl Default for CommandSpec {
    fn default() -> Self {
        Self::Argv(Vec::new())
    }
}

impl CommandSpec {
    /// The command as argv, with empty tokens dropped.
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        match self {
            Self::Argv(tokens) => {
                tokens.iter().filter(|t| !t.trim().is_empty()).cloned().collect()
            }
            Self::Line(line) => line.split_whitespace().map(str::to_string).collect(),
        }
    }
}

/// Raw `require[]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRequirement {
    /// Executable name
    #[serde(default)]
    pub app: String,
    /// Version command argv
    #[serde(default)]
    pub version: CommandSpec,
    /// Minimum accepted version
    #[serde(default)]
    pub min_version: Option<String>,
}

/// Raw `env` block.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawEnv {
    /// Variables that must be supplied to the application
    #[serde(default)]
    pub require: Vec<String>,
}

/// Raw `workers[]` entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWorker {
    /// Worker name
    #[serde(default)]
    pub name: String,
    /// Worker command
    #[serde(default)]
    pub run: CommandSpec,
}

/// `instllr.json` exactly as written, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawManifest {
    /// Host executables the application needs
    #[serde(default)]
    pub require: Vec<RawRequirement>,
    /// Steps run in the install directory after the payload is staged
    #[serde(default)]
    pub install: Vec<CommandSpec>,
    /// Command of the primary service
    #[serde(default)]
    pub run: CommandSpec,
    /// Application environment requirements
    #[serde(default)]
    pub env: RawEnv,
    /// Auxiliary processes registered as separate units
    #[serde(default)]
    pub workers: Vec<RawWorker>,
}

/// A host executable the application depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    /// Executable name looked up on the search path
    pub app: String,
    /// Command printing the version; `version_command[0] == app`
    pub version_command: Vec<String>,
    /// Minimum accepted version, `None` when the manifest omits it
    pub min_version: Option<String>,
}

/// Environment variables the application expects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvSpec {
    /// Names that must appear as `NAME=` in the application environment
    pub required_vars: Vec<String>,
}

/// An auxiliary process sharing the install directory of the primary service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerSpec {
    /// Worker name; its unit is `<name>-<service>`
    pub name: String,
    /// Worker argv
    pub run: Vec<String>,
}

impl WorkerSpec {
    /// Unit name of this worker for the given service.
    #[must_use]
    pub fn unit_name(&self, service: &str) -> String {
        format!("{}-{service}", self.name)
    }
}

/// Validated application manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppManifest {
    /// Host executables to resolve before installing
    pub requires: Vec<Requirement>,
    /// Install steps as argv, run in order
    pub install_steps: Vec<Vec<String>>,
    /// Primary service argv, never empty
    pub run: Vec<String>,
    /// Required application environment
    pub env: EnvSpec,
    /// Worker processes
    pub workers: Vec<WorkerSpec>,
}

impl AppManifest {
    /// Parse and validate manifest JSON. `file` only labels errors.
    ///
    /// # Errors
    ///
    /// - [`InstllrError::ManifestParseError`] for malformed JSON or wrong field types
    /// - [`InstllrError::ManifestInvalid`] when a validation rule fails
    pub fn from_json(content: &str, file: &str) -> Result<Self, InstllrError> {
        let raw: RawManifest =
            serde_json::from_str(content).map_err(|e| InstllrError::ManifestParseError {
                file: file.to_string(),
                reason: e.to_string(),
            })?;
        Self::from_raw(raw)
    }

    /// Load `instllr.json` from a payload directory.
    ///
    /// # Errors
    ///
    /// Returns [`InstllrError::ManifestNotFound`] when the file is absent, plus every error of
    /// [`from_json`](Self::from_json).
    pub async fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILE);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(InstllrError::ManifestNotFound {
                dir: dir.display().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to open {}", path.display()))?;

        Ok(Self::from_json(&content, &path.display().to_string())?)
    }

    /// Names of every unit this manifest registers for `service`: the service itself first,
    /// then one per worker.
    #[must_use]
    pub fn unit_names(&self, service: &str) -> Vec<String> {
        std::iter::once(service.to_string())
            .chain(self.workers.iter().map(|w| w.unit_name(service)))
            .collect()
    }
}

/// Find the directory holding `instllr.json` inside an extracted archive.
///
/// Tarballs are often packed with a single top-level directory. When the manifest is not at
/// `extract_dir` itself and `extract_dir` contains exactly one directory and nothing else,
/// that directory is the payload root.
///
/// # Errors
///
/// Returns an error if `extract_dir` cannot be listed.
pub fn payload_root(extract_dir: &Path) -> Result<PathBuf> {
    if extract_dir.join(MANIFEST_FILE).exists() {
        return Ok(extract_dir.to_path_buf());
    }

    let entries: Vec<_> = std::fs::read_dir(extract_dir)
        .with_context(|| format!("Failed to read directory: {}", extract_dir.display()))?
        .collect::<std::io::Result<_>>()?;

    if let [only] = entries.as_slice()
        && only.file_type()?.is_dir()
    {
        tracing::debug!("Using nested payload root {}", only.path().display());
        return Ok(only.path());
    }

    Ok(extract_dir.to_path_buf())
}
