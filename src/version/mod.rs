//! Version comparison for release tags and dependency versions.
//!
//! Release tags, installed-version records and the output of dependency version commands
//! are all plain dot-separated strings (`v1.2.0`, `18.2.0`, `3.11.4\n`). They are compared
//! with a [`VersionComparator`] configured with a [`CompareStrategy`].
//!
//! # Module Organization
//!
//! - [`comparison`] - The comparator, its strategies and [`assert_version`]
//!
//! # Examples
//!
//! ```rust
//! use instllr::version::compare;
//! use std::cmp::Ordering;
//!
//! # fn example() -> anyhow::Result<()> {
//! assert_eq!(compare("v1.0.0", "1.0.1")?, Ordering::Less);
//! assert_eq!(compare("1.0.0", "1.0.0")?, Ordering::Equal);
//! assert!(compare("1.0", "1.0.0").is_err());
//! # Ok(())
//! # }
//! ```

pub mod comparison;

pub use comparison::{CompareStrategy, VersionComparator, assert_version, compare, normalize};
