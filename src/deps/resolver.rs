//! Dependency resolution: locate each required executable and check its version.

use anyhow::Result;
use colored::Colorize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::ResolvedDependencies;
use crate::config::GlobalConfig;
use crate::core::InstllrError;
use crate::host::SystemCommand;
use crate::manifest::Requirement;
use crate::version::VersionComparator;

/// Checks manifest requirements against the host.
#[derive(Debug, Clone, Default)]
pub struct DependencyResolver {
    search_path: Option<OsString>,
    comparator: VersionComparator,
}

impl DependencyResolver {
    /// Resolver searching `search_path` (a `PATH`-style list), or the process `PATH` when `None`.
    #[must_use]
    pub fn new(search_path: Option<OsString>) -> Self {
        Self {
            search_path,
            comparator: VersionComparator::default(),
        }
    }

    /// Resolver using the configured `search_path` followed by `PATH`.
    #[must_use]
    pub fn from_config(config: &GlobalConfig) -> Self {
        Self::new(config.effective_path())
    }

    /// Absolute path of an executable on the search path.
    ///
    /// # Errors
    ///
    /// Returns [`InstllrError::DependencyNotFound`] if it is not there.
    pub fn locate(&self, app: &str) -> Result<PathBuf, InstllrError> {
        let search_path = self.search_path.clone().or_else(|| std::env::var_os("PATH"));
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));

        which::which_in(app, search_path, cwd).map_err(|_| InstllrError::DependencyNotFound {
            app: app.to_string(),
        })
    }

    /// Run a requirement's version command through the resolved path and return its trimmed
    /// stdout.
    ///
    /// # Errors
    ///
    /// Returns [`InstllrError::CommandFailed`] if the command exits non-zero.
    pub async fn query_version(&self, requirement: &Requirement, path: &Path) -> Result<String> {
        let mut cmd = SystemCommand::new(path.display().to_string())
            .args(requirement.version_command.iter().skip(1).cloned())
            .with_context(&requirement.app);
        if let Some(search_path) = &self.search_path {
            cmd = cmd.env("PATH", search_path.clone());
        }
        Ok(cmd.execute().await?.stdout.trim().to_string())
    }

    /// Verify every requirement in order, stopping at the first failure.
    ///
    /// Prints one progress line per step (found, version, OK).
    ///
    /// # Errors
    ///
    /// - [`InstllrError::DependencyNotFound`] when an executable is missing
    /// - [`InstllrError::CommandFailed`] when a version command fails
    /// - [`InstllrError::DependencyNotMet`] when a version is below `minVersion`
    /// - [`InstllrError::VersionFormatMismatch`] when the reported version and `minVersion`
    ///   have a different number of segments
    pub async fn resolve(&self, requirements: &[Requirement]) -> Result<ResolvedDependencies> {
        let mut resolved = ResolvedDependencies::new();

        for requirement in requirements {
            let app = requirement.app.as_str();
            let path = self.locate(app)?;
            println!("{} {app} found at {}", "Dependency check:".cyan(), path.display());

            let version = self.query_version(requirement, &path).await?;
            println!("{} {app} version: {version}", "Dependency check:".cyan());

            match &requirement.min_version {
                Some(min_version) => {
                    if self.comparator.compare(&version, min_version)?.is_lt() {
                        return Err(InstllrError::DependencyNotMet {
                            app: app.to_string(),
                            required: min_version.clone(),
                            found: version,
                        }
                        .into());
                    }
                    println!("{} {app} {}", "Dependency check:".cyan(), "OK".green());
                }
                None => tracing::debug!("No minVersion for {app}, version not checked"),
            }

            resolved.insert(app, path);
        }

        Ok(resolved)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    fn stub(dir: &std::path::Path, name: &str, script: &str) {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    fn requirement(app: &str, min_version: Option<&str>) -> Requirement {
        Requirement {
            app: app.to_string(),
            version_command: vec![app.to_string(), "--version".to_string()],
            min_version: min_version.map(str::to_string),
        }
    }

    fn resolver(dir: &TempDir) -> DependencyResolver {
        DependencyResolver::new(Some(dir.path().as_os_str().to_os_string()))
    }

    #[tokio::test]
    async fn test_resolves_satisfied_requirement() {
        let temp = TempDir::new().unwrap();
        stub(temp.path(), "node", "echo v18.2.0");

        let resolved =
            resolver(&temp).resolve(&[requirement("node", Some("16.0.0"))]).await.unwrap();
        assert_eq!(resolved.get("node"), Some(&temp.path().join("node")));
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let temp = TempDir::new().unwrap();
        let err = resolver(&temp).resolve(&[requirement("node", Some("16.0.0"))]).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InstllrError>(),
            Some(InstllrError::DependencyNotFound { app }) if app == "node"
        ));
    }

    #[tokio::test]
    async fn test_version_below_minimum() {
        let temp = TempDir::new().unwrap();
        stub(temp.path(), "node", "echo v14.0.0");

        let err = resolver(&temp).resolve(&[requirement("node", Some("16.0.0"))]).await.unwrap_err();
        match err.downcast_ref::<InstllrError>() {
            Some(InstllrError::DependencyNotMet {
                found,
                required,
                ..
            }) => {
                assert_eq!(found, "v14.0.0");
                assert_eq!(required, "16.0.0");
            }
            other => panic!("Expected DependencyNotMet, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failing_version_command() {
        let temp = TempDir::new().unwrap();
        stub(temp.path(), "node", "exit 1");

        let err = resolver(&temp).resolve(&[requirement("node", None)]).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InstllrError>(),
            Some(InstllrError::CommandFailed { .. })
        ));
    }

    #[tokio::test]
    async fn test_without_min_version_reports_only() {
        let temp = TempDir::new().unwrap();
        stub(temp.path(), "tool", "echo 0.0.1");

        let resolved = resolver(&temp).resolve(&[requirement("tool", None)]).await.unwrap();
        assert_eq!(resolved.len(), 1);
    }

    #[tokio::test]
    async fn test_arity_mismatch_is_fatal() {
        let temp = TempDir::new().unwrap();
        stub(temp.path(), "node", "echo 18.2");

        let err = resolver(&temp).resolve(&[requirement("node", Some("16.0.0"))]).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<InstllrError>(),
            Some(InstllrError::VersionFormatMismatch { .. })
        ));
    }
}
