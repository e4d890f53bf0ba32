//! Host dependency checks.
//!
//! Before anything on the host is touched, every `require` entry of the manifest is located
//! on the search path and its version command is run and compared with `minVersion`. The
//! resulting [`ResolvedDependencies`] is later used to put absolute paths into `run`,
//! `install` and worker commands.
//!
//! [`check_env`] verifies that the application environment supplied by the operator names
//! every variable the manifest lists under `env.require`.

pub mod resolved;
pub mod resolver;

pub use resolved::{Resolution, ResolvedDependencies};
pub use resolver::DependencyResolver;

use crate::core::InstllrError;

/// Fail unless every required name appears as a `NAME=` entry in `app_env`.
///
/// Only presence is checked, an empty value counts.
///
/// # Errors
///
/// Returns [`InstllrError::MissingEnvVar`] for the first missing name.
pub fn check_env(required: &[String], app_env: &[String]) -> Result<(), InstllrError> {
    for name in required {
        let prefix = format!("{name}=");
        if !app_env.iter().any(|entry| entry.starts_with(&prefix)) {
            return Err(InstllrError::MissingEnvVar {
                name: name.clone(),
            });
        }
    }
    Ok(())
}
