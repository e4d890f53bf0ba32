//! Core types for instllr
//!
//! This module holds the error taxonomy shared by every pipeline stage and the conversion
//! into the single diagnostic line printed by the binary.
//!
//! - [`InstllrError`] - Enumerated error types covering every failure mode
//! - [`ManifestErrorKind`] - Named manifest validation rules
//! - [`ErrorContext`] - Operator-facing wrapper with an optional suggestion
//! - [`user_friendly_error`] - Convert any error to an [`ErrorContext`]
//!
//! # Examples
//!
//! ```rust
//! use instllr::core::{InstllrError, user_friendly_error};
//! use anyhow::Result;
//!
//! fn example_operation() -> Result<String> {
//!     Err(InstllrError::ManifestNotFound { dir: "/tmp/payload".into() }.into())
//! }
//!
//! if let Err(e) = example_operation() {
//!     let friendly = user_friendly_error(e);
//!     assert!(friendly.one_line().contains("instllr.json not found"));
//! }
//! ```

pub mod error;

pub use error::{ErrorContext, InstllrError, ManifestErrorKind, user_friendly_error};
