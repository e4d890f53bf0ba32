//! Error handling for instllr
//!
//! The error system follows two rules:
//! 1. **Strongly-typed errors** ([`InstllrError`]) so each pipeline stage can raise a precise
//!    failure and tests can match on it.
//! 2. **One diagnostic line** for the operator: [`user_friendly_error`] turns any error into an
//!    [`ErrorContext`] which `main` prints as a single `error: ...` line before exiting.
//!
//! # Error Categories
//!
//! - **Configuration**: [`InstllrError::ManifestNotFound`], [`InstllrError::ManifestParseError`],
//!   [`InstllrError::ManifestInvalid`], [`InstllrError::VersionFormatMismatch`],
//!   [`InstllrError::InvalidServiceLocator`], [`InstllrError::InvalidReleaseTag`],
//!   [`InstllrError::ConfigError`]
//! - **Dependencies**: [`InstllrError::DependencyNotFound`], [`InstllrError::DependencyNotMet`],
//!   [`InstllrError::MissingEnvVar`]
//! - **I/O**: [`InstllrError::NetworkError`], [`InstllrError::UnexpectedStatus`],
//!   [`InstllrError::AssetNotFound`], [`InstllrError::AmbiguousAsset`]
//! - **Subprocesses**: [`InstllrError::CommandFailed`]
//! - **State**: [`InstllrError::AlreadyInstalled`], [`InstllrError::DowngradeRejected`]
//!
//! Every error is fatal. Nothing is retried and nothing already done is undone.
//!
//! # Examples
//!
//! ```rust,no_run
//! use instllr::core::{InstllrError, user_friendly_error};
//!
//! let error = InstllrError::AlreadyInstalled {
//!     service: "api".to_string(),
//!     version: "1.2.0".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// Named manifest validation failures.
///
/// Each variant is one field-level rule of the `instllr.json` schema, so a broken manifest
/// reports exactly which rule it violates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestErrorKind {
    /// `run` is missing or has no tokens.
    EmptyRun,
    /// A `require` entry has an empty `app`.
    EmptyRequirementApp,
    /// A `require` entry has no `version` command.
    MissingVersionCommand {
        /// Requirement name
        app: String,
    },
    /// The first token of a requirement's `version` command is not the `app` itself.
    VersionCommandMismatch {
        /// Requirement name
        app: String,
        /// First token of the version command
        found: String,
    },
    /// A `workers` entry has an empty `name`.
    EmptyWorkerName,
    /// A worker's `run` is missing or has no tokens.
    EmptyWorkerRun {
        /// Worker name
        worker: String,
    },
    /// Two workers share a name.
    DuplicateWorker {
        /// Worker name
        worker: String,
    },
    /// An `install` step has no tokens.
    EmptyInstallStep {
        /// Zero-based step index
        index: usize,
    },
}

impl fmt::Display for ManifestErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRun => write!(f, "'run' must contain at least one token"),
            Self::EmptyRequirementApp => write!(f, "every 'require' entry needs a non-empty 'app'"),
            Self::MissingVersionCommand {
                app,
            } => write!(f, "no version command specified for '{app}'"),
            Self::VersionCommandMismatch {
                app,
                found,
            } => write!(f, "version command for '{app}' must start with '{app}', found '{found}'"),
            Self::EmptyWorkerName => write!(f, "every worker needs a non-empty 'name'"),
            Self::EmptyWorkerRun {
                worker,
            } => write!(f, "worker '{worker}' has an empty 'run'"),
            Self::DuplicateWorker {
                worker,
            } => write!(f, "worker '{worker}' is declared more than once"),
            Self::EmptyInstallStep {
                index,
            } => write!(f, "install step #{index} is empty"),
        }
    }
}

/// The main error type for instllr operations.
#[derive(Error, Debug, Clone)]
pub enum InstllrError {
    /// The release payload does not contain `instllr.json`.
    #[error("instllr.json not found in {dir}, aborting")]
    ManifestNotFound {
        /// Directory that was searched
        dir: String,
    },

    /// `instllr.json` is not valid JSON or does not match the schema.
    #[error("Failed to parse {file}: {reason}")]
    ManifestParseError {
        /// Manifest path
        file: String,
        /// Parser message
        reason: String,
    },

    /// `instllr.json` parsed but failed field validation.
    #[error("Invalid instllr.json: {kind}")]
    ManifestInvalid {
        /// Which rule was violated
        kind: ManifestErrorKind,
    },

    /// Two version strings split into a different number of segments.
    #[error("Incompatible version format: {left} vs {right}")]
    VersionFormatMismatch {
        /// Left-hand version
        left: String,
        /// Right-hand version
        right: String,
    },

    /// The `<owner>/<repo>[:<tag>]` argument could not be parsed.
    #[error("Invalid service '{input}': {reason}")]
    InvalidServiceLocator {
        /// Raw user input
        input: String,
        /// Why it was rejected
        reason: String,
    },

    /// A release tag cannot be used as part of a directory name.
    #[error("Release tag '{tag}' cannot be installed: {reason}")]
    InvalidReleaseTag {
        /// Tag as reported by the release source
        tag: String,
        /// Why it was rejected
        reason: String,
    },

    /// Host configuration could not be loaded or is inconsistent.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// A required executable is not on the search path.
    #[error("Dependency check: '{app}' not found in PATH")]
    DependencyNotFound {
        /// Executable name
        app: String,
    },

    /// A dependency reports a version below the required minimum.
    #[error("Dependency check: '{app}' requires at least {required}, found {found}")]
    DependencyNotMet {
        /// Executable name
        app: String,
        /// Minimum version
        required: String,
        /// Reported version
        found: String,
    },

    /// A variable listed in `env.require` was not supplied.
    #[error("Required application env variable '{name}' not found")]
    MissingEnvVar {
        /// Variable name
        name: String,
    },

    /// The HTTP request itself failed.
    #[error("Network error during {operation}: {reason}")]
    NetworkError {
        /// What was being requested
        operation: String,
        /// Transport error
        reason: String,
    },

    /// The release API answered with a non-2xx status.
    #[error("Unexpected response from GitHub API ({url}): {status}")]
    UnexpectedStatus {
        /// Requested URL
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// No release asset matched.
    #[error("No release asset found for {release}{}", .filter.as_ref().map(|f| format!(" matching '{f}'")).unwrap_or_default())]
    AssetNotFound {
        /// Release tag
        release: String,
        /// Asset-name prefix filter, if any
        filter: Option<String>,
    },

    /// More than one asset and no filter to choose between them.
    #[error("Expected exactly one release asset in {release}, found {count}")]
    AmbiguousAsset {
        /// Release tag
        release: String,
        /// Number of assets
        count: usize,
    },

    /// A subprocess exited unsuccessfully.
    #[error("Command failed: {command} ({status})")]
    CommandFailed {
        /// Command line
        command: String,
        /// Exit status description
        status: String,
        /// Captured stderr, empty when stdio was inherited
        stderr: String,
    },

    /// The release tag is already the installed version.
    #[error("{service} is already at version {version}, nothing to do")]
    AlreadyInstalled {
        /// Service name
        service: String,
        /// Installed version
        version: String,
    },

    /// The release tag is older than the installed version.
    #[error("Refusing to downgrade {service} from {installed} to {requested}")]
    DowngradeRejected {
        /// Service name
        service: String,
        /// Installed version
        installed: String,
        /// Release tag
        requested: String,
    },

    /// Anything that has no dedicated variant
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// Error context wrapper that adds an optional suggestion and details to an [`InstllrError`].
///
/// [`display`](Self::display) prints the error and suggestion as a single line on stderr.
/// Details are only emitted through `tracing` at debug level so the operator-facing output
/// stays one line long.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: InstllrError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no suggestion or details.
    #[must_use]
    pub const fn new(error: InstllrError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// The single diagnostic line, without colors.
    #[must_use]
    pub fn one_line(&self) -> String {
        let message = self.error.to_string().replace('\n', " ");
        match &self.suggestion {
            Some(suggestion) => format!("{message} ({suggestion})"),
            None => message,
        }
    }

    /// Print the diagnostic line to stderr.
    pub fn display(&self) {
        if let Some(details) = &self.details {
            tracing::debug!("{}", details);
        }

        let message = self.error.to_string().replace('\n', " ");
        match &self.suggestion {
            Some(suggestion) => eprintln!(
                "{}: {} ({})",
                "error".red().bold(),
                message,
                suggestion.yellow()
            ),
            None => eprintln!("{}: {}", "error".red().bold(), message),
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.one_line())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] suitable for the final diagnostic line.
///
/// Recognizes [`InstllrError`] anywhere in the chain (pipeline stages wrap errors with
/// context), then [`std::io::Error`], then falls back to the flattened chain.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(instllr_error) = error.chain().find_map(|e| e.downcast_ref::<InstllrError>()) {
        let ctx = create_error_context(instllr_error.clone());
        // Keep the contexts above the typed error (e.g. the failing pipeline stage) in front
        let outer: Vec<String> = error
            .chain()
            .take_while(|e| e.downcast_ref::<InstllrError>().is_none())
            .map(ToString::to_string)
            .collect();
        if !outer.is_empty() {
            return ErrorContext {
                error: InstllrError::Other {
                    message: format!("{}: {}", outer.join(": "), ctx.error),
                },
                suggestion: ctx.suggestion,
                details: ctx.details,
            };
        }
        return ctx;
    }

    if let Some(io_error) = error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
        let message = flatten_chain(&error);
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(InstllrError::Other {
                    message,
                })
                .with_suggestion("run instllr as root");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(InstllrError::Other {
                    message,
                })
                .with_details("A required file, directory or executable does not exist");
            }
            _ => {}
        }
    }

    ErrorContext::new(InstllrError::Other {
        message: flatten_chain(&error),
    })
}

fn flatten_chain(error: &anyhow::Error) -> String {
    error.chain().map(ToString::to_string).collect::<Vec<_>>().join(": ")
}

fn create_error_context(error: InstllrError) -> ErrorContext {
    match &error {
        InstllrError::ManifestNotFound {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("the release tarball must ship an instllr.json at its root"),

        InstllrError::DependencyNotFound {
            app,
        } => {
            let suggestion = format!("install '{app}' or add its directory to search_path");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        InstllrError::MissingEnvVar {
            name,
        } => {
            let suggestion = format!("pass --env {name}=... or list it in --env-file");
            ErrorContext::new(error).with_suggestion(suggestion)
        }

        InstllrError::UnexpectedStatus {
            status: 401 | 403 | 404,
            ..
        } => ErrorContext::new(error)
            .with_suggestion("check the release tag and the GitHub token (--gh-token or GH_TOKEN)"),

        InstllrError::AmbiguousAsset {
            ..
        } => ErrorContext::new(error).with_suggestion("select one with --asset <name-prefix>"),

        InstllrError::CommandFailed {
            stderr,
            ..
        } if !stderr.trim().is_empty() => {
            let details = stderr.trim().to_string();
            ErrorContext::new(error).with_details(details)
        }

        _ => ErrorContext::new(error),
    }
}
