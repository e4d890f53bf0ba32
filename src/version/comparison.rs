//! Dot-separated version comparison.
//!
//! Versions are normalized (a leading `v`, carriage returns and newlines are stripped) and
//! split on `.`. Both sides must have the same number of segments; comparing `1.0` with
//! `1.0.0` is an error, not an ordering.
//!
//! The only strategy today is [`CompareStrategy::StringSegments`]: segments are compared as
//! strings, byte-wise, in two passes:
//!
//! 1. Walk the segments. The first segment where `a < b` returns [`Ordering::Less`]. The first
//!    segment where `a > b` stops the walk.
//! 2. Walk again. Any differing segment returns [`Ordering::Greater`].
//! 3. Otherwise [`Ordering::Equal`].
//!
//! Multi-digit segments therefore order as text: `"10" < "9"`, so `1.10.0` sorts *below*
//! `1.9.0`. Installed-version records on existing hosts were written under this ordering, so
//! it is kept as-is. A numeric strategy would be a new [`CompareStrategy`] variant.

use std::cmp::Ordering;

use crate::core::InstllrError;

/// How two normalized versions are ordered segment by segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompareStrategy {
    /// Lexicographic string comparison per segment with the two-pass scan.
    #[default]
    StringSegments,
}

/// Compares dot-separated versions with a fixed [`CompareStrategy`].
#[derive(Debug, Clone, Copy, Default)]
pub struct VersionComparator {
    strategy: CompareStrategy,
}

impl VersionComparator {
    /// Create a comparator for the given strategy.
    #[must_use]
    pub const fn new(strategy: CompareStrategy) -> Self {
        Self {
            strategy,
        }
    }

    /// The strategy in use.
    #[must_use]
    pub const fn strategy(&self) -> CompareStrategy {
        self.strategy
    }

    /// Order `a` relative to `b`.
    ///
    /// # Errors
    ///
    /// Returns [`InstllrError::VersionFormatMismatch`] when the versions do not split into
    /// the same number of segments.
    pub fn compare(&self, a: &str, b: &str) -> Result<Ordering, InstllrError> {
        let left = normalize(a);
        let right = normalize(b);
        let left_segments: Vec<&str> = left.split('.').collect();
        let right_segments: Vec<&str> = right.split('.').collect();

        if left_segments.len() != right_segments.len() {
            return Err(InstllrError::VersionFormatMismatch {
                left: a.trim().to_string(),
                right: b.trim().to_string(),
            });
        }

        Ok(match self.strategy {
            CompareStrategy::StringSegments => {
                compare_string_segments(&left_segments, &right_segments)
            }
        })
    }
}

fn compare_string_segments(a: &[&str], b: &[&str]) -> Ordering {
    for (left, right) in a.iter().zip(b) {
        if left < right {
            return Ordering::Less;
        }
        if left > right {
            break;
        }
    }

    if a.iter().zip(b).any(|(left, right)| left != right) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// Strip a leading `v` and every carriage return and newline.
#[must_use]
pub fn normalize(version: &str) -> String {
    let cleaned: String = version.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    match cleaned.strip_prefix('v') {
        Some(rest) => rest.to_string(),
        None => cleaned,
    }
}

/// Compare two versions with the default strategy.
///
/// # Errors
///
/// See [`VersionComparator::compare`].
pub fn compare(a: &str, b: &str) -> Result<Ordering, InstllrError> {
    VersionComparator::default().compare(a, b)
}

/// Fail unless `version` is at least `min_version`.
///
/// # Errors
///
/// - [`InstllrError::VersionFormatMismatch`] when the schemes differ in arity
/// - [`InstllrError::DependencyNotMet`] when `version` orders below `min_version`
pub fn assert_version(app: &str, version: &str, min_version: &str) -> Result<(), InstllrError> {
    if compare(version, min_version)? == Ordering::Less {
        return Err(InstllrError::DependencyNotMet {
            app: app.to_string(),
            required: min_version.to_string(),
            found: version.trim().to_string(),
        });
    }
    Ok(())
}
