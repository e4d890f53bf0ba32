//! Field-by-field validation turning a [`RawManifest`] into an [`AppManifest`].

use std::collections::HashSet;

use crate::core::{InstllrError, ManifestErrorKind};
use crate::manifest::{AppManifest, EnvSpec, RawManifest, Requirement, WorkerSpec};

fn invalid(kind: ManifestErrorKind) -> InstllrError {
    InstllrError::ManifestInvalid {
        kind,
    }
}

impl AppManifest {
    /// Validate a raw manifest.
    ///
    /// # Validation Rules
    ///
    /// - `run` has at least one token
    /// - every requirement has a non-empty `app` and a `version` command whose first token
    ///   is that `app`
    /// - every install step has at least one token
    /// - every worker has a unique, non-empty name and a non-empty `run`
    ///
    /// An empty `minVersion` string is treated as absent.
    ///
    /// # Errors
    ///
    /// Returns [`InstllrError::ManifestInvalid`] naming the first rule that fails.
    pub fn from_raw(raw: RawManifest) -> Result<Self, InstllrError> {
        let run = raw.run.argv();
        if run.is_empty() {
            return Err(invalid(ManifestErrorKind::EmptyRun));
        }

        let mut requires = Vec::with_capacity(raw.require.len());
        for requirement in raw.require {
            let app = requirement.app.trim().to_string();
            if app.is_empty() {
                return Err(invalid(ManifestErrorKind::EmptyRequirementApp));
            }

            let version_command = requirement.version.argv();
            match version_command.first() {
                None => {
                    return Err(invalid(ManifestErrorKind::MissingVersionCommand {
                        app,
                    }));
                }
                Some(first) if *first != app => {
                    return Err(invalid(ManifestErrorKind::VersionCommandMismatch {
                        found: first.clone(),
                        app,
                    }));
                }
                Some(_) => {}
            }

            requires.push(Requirement {
                app,
                version_command,
                min_version: requirement
                    .min_version
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty()),
            });
        }

        let mut install_steps = Vec::with_capacity(raw.install.len());
        for (index, step) in raw.install.iter().enumerate() {
            let argv = step.argv();
            if argv.is_empty() {
                return Err(invalid(ManifestErrorKind::EmptyInstallStep {
                    index,
                }));
            }
            install_steps.push(argv);
        }

        let mut seen = HashSet::new();
        let mut workers = Vec::with_capacity(raw.workers.len());
        for worker in raw.workers {
            let name = worker.name.trim().to_string();
            if name.is_empty() {
                return Err(invalid(ManifestErrorKind::EmptyWorkerName));
            }
            let run = worker.run.argv();
            if run.is_empty() {
                return Err(invalid(ManifestErrorKind::EmptyWorkerRun {
                    worker: name,
                }));
            }
            if !seen.insert(name.clone()) {
                return Err(invalid(ManifestErrorKind::DuplicateWorker {
                    worker: name,
                }));
            }
            workers.push(WorkerSpec {
                name,
                run,
            });
        }

        Ok(Self {
            requires,
            install_steps,
            run,
            env: EnvSpec {
                required_vars: raw.env.require,
            },
            workers,
        })
    }
}
