//! Installation transaction log.
//!
//! Nothing an install does to the host is rolled back. [`InstallLog`] records which stages
//! completed so a failure can say exactly how far the host was changed.

use std::fmt;

/// One step of the install pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallStage {
    /// Fetch release metadata
    FetchRelease,
    /// Compare the release with the ledger
    CheckInstalledVersion,
    /// Download the asset and unpack it
    DownloadAndExtract,
    /// Read `instllr.json`
    LoadManifest,
    /// Locate and version-check required executables
    ResolveDeps,
    /// Check the application environment
    CheckEnv,
    /// Stop the running units
    StopExisting,
    /// Copy the payload and run install steps
    StageAndRun,
    /// Create the service user and hand it the install directory
    Chown,
    /// Write unit files
    RenderUnits,
    /// Write the proxy vhost
    RenderProxy,
    /// Record the new version
    StoreVersion,
    /// Delete older version directories
    PruneOld,
    /// Reload the service manager and start the units
    ReloadAndActivate,
}

impl InstallStage {
    /// Whether the stage changes host state.
    #[must_use]
    pub const fn mutates_host(self) -> bool {
        !matches!(
            self,
            Self::FetchRelease
                | Self::CheckInstalledVersion
                | Self::DownloadAndExtract
                | Self::LoadManifest
                | Self::ResolveDeps
                | Self::CheckEnv
        )
    }
}

impl fmt::Display for InstallStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FetchRelease => "FetchRelease",
            Self::CheckInstalledVersion => "CheckInstalledVersion",
            Self::DownloadAndExtract => "DownloadAndExtract",
            Self::LoadManifest => "LoadManifest",
            Self::ResolveDeps => "ResolveDeps",
            Self::CheckEnv => "CheckEnv",
            Self::StopExisting => "StopExisting",
            Self::StageAndRun => "StageAndRun",
            Self::Chown => "Chown",
            Self::RenderUnits => "RenderUnits",
            Self::RenderProxy => "RenderProxy",
            Self::StoreVersion => "StoreVersion",
            Self::PruneOld => "PruneOld",
            Self::ReloadAndActivate => "ReloadAndActivate",
        };
        f.write_str(name)
    }
}

/// Completed stages of one install.
#[derive(Debug, Clone, Default)]
pub struct InstallLog {
    completed: Vec<InstallStage>,
}

impl InstallLog {
    /// Empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a stage as done.
    pub fn record(&mut self, stage: InstallStage) {
        tracing::debug!("Stage {stage} complete");
        self.completed.push(stage);
    }

    /// Stages completed so far.
    #[must_use]
    pub fn completed(&self) -> &[InstallStage] {
        &self.completed
    }

    /// Whether any completed stage changed the host.
    #[must_use]
    pub fn host_mutated(&self) -> bool {
        self.completed.iter().any(|stage| stage.mutates_host())
    }

    /// Annotate `error` with the failing stage and log what was already done.
    pub fn fail(&self, stage: InstallStage, error: anyhow::Error) -> anyhow::Error {
        if self.host_mutated() {
            let done: Vec<String> = self.completed.iter().map(ToString::to_string).collect();
            tracing::warn!(
                "{stage} failed after {}; the host is partially updated and nothing was rolled back",
                done.join(", ")
            );
        }
        error.context(format!("{stage} failed"))
    }

    /// Await one stage: record it on success, annotate the error on failure.
    ///
    /// # Errors
    ///
    /// Returns the stage's error with the stage name as context.
    pub async fn run<T>(
        &mut self,
        stage: InstallStage,
        step: impl Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        match step.await {
            Ok(value) => {
                self.record(stage);
                Ok(value)
            }
            Err(e) => Err(self.fail(stage, e)),
        }
    }
}
