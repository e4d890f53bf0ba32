//! `<owner>/<repo>[:<tag>]` service locators.

use std::fmt;
use std::str::FromStr;

use crate::core::InstllrError;

/// Identifies a release source: a GitHub repository and an optional release tag.
///
/// An empty tag or `latest` selects the most recent release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceLocator {
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
    /// Release tag, empty for the latest release
    pub tag: String,
}

impl ServiceLocator {
    /// Locator for the latest release of `owner/repo`.
    pub fn latest(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            tag: String::new(),
        }
    }

    /// Locator for a tagged release of `owner/repo`.
    pub fn tagged(owner: impl Into<String>, repo: impl Into<String>, tag: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            tag: tag.into(),
        }
    }

    /// Whether this locator asks for the most recent release.
    #[must_use]
    pub fn is_latest(&self) -> bool {
        self.tag.is_empty() || self.tag == "latest"
    }

    /// Prefix shared by every version directory of this repository, e.g. `acme-svc-`.
    #[must_use]
    pub fn dir_prefix(&self) -> String {
        format!("{}-{}-", self.owner, self.repo)
    }

    /// Version directory name for a release tag, e.g. `acme-svc-1.2.0`.
    #[must_use]
    pub fn version_dir_name(&self, tag: &str) -> String {
        format!("{}{tag}", self.dir_prefix())
    }
}

/// Check that a release tag can name a version directory.
///
/// Tags come from the release source as well as from user input; GitHub accepts tags such
/// as `release/1.0.0` that would nest the install directory.
///
/// # Errors
///
/// Returns [`InstllrError::InvalidReleaseTag`] for an empty tag, `.`, `..`, or a tag with a
/// path separator or control character.
pub fn validate_tag(tag: &str) -> Result<(), InstllrError> {
    let invalid = |reason: &str| InstllrError::InvalidReleaseTag {
        tag: tag.to_string(),
        reason: reason.to_string(),
    };

    if tag.trim().is_empty() {
        return Err(invalid("tag is empty"));
    }
    if tag == "." || tag == ".." {
        return Err(invalid("tag is a relative path component"));
    }
    if tag.contains(['/', '\\']) {
        return Err(invalid("tag contains a path separator"));
    }
    if tag.chars().any(char::is_control) {
        return Err(invalid("tag contains a control character"));
    }
    Ok(())
}

impl fmt::Display for ServiceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_latest() {
            write!(f, "{}/{}", self.owner, self.repo)
        } else {
            write!(f, "{}/{}:{}", self.owner, self.repo, self.tag)
        }
    }
}

impl FromStr for ServiceLocator {
    type Err = InstllrError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| InstllrError::InvalidServiceLocator {
            input: input.to_string(),
            reason: reason.to_string(),
        };

        let (path, tag) = match input.split_once(':') {
            Some((path, tag)) => (path, tag.trim()),
            None => (input, ""),
        };

        let (owner, repo) =
            path.split_once('/').ok_or_else(|| invalid("expected <owner>/<repo>[:<tag>]"))?;
        let (owner, repo) = (owner.trim(), repo.trim());

        if owner.is_empty() || repo.is_empty() {
            return Err(invalid("owner and repository must not be empty"));
        }
        if repo.contains('/') {
            return Err(invalid("repository name must not contain '/'"));
        }
        if tag.contains('/') || tag.contains(':') {
            return Err(invalid("tag must not contain '/' or ':'"));
        }

        Ok(Self::tagged(owner, repo, tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_tag() {
        let locator: ServiceLocator = "acme/svc:1.2.0".parse().unwrap();
        assert_eq!(locator, ServiceLocator::tagged("acme", "svc", "1.2.0"));
        assert!(!locator.is_latest());
        assert_eq!(locator.to_string(), "acme/svc:1.2.0");
    }

    #[test]
    fn test_parse_latest_forms() {
        for input in ["acme/svc", "acme/svc:", "acme/svc:latest"] {
            let locator: ServiceLocator = input.parse().unwrap();
            assert!(locator.is_latest(), "{input} should select the latest release");
            assert_eq!(locator.to_string(), "acme/svc");
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["svc", "/svc", "acme/", "acme/svc/extra", "acme/svc:a:b"] {
            assert!(
                matches!(
                    input.parse::<ServiceLocator>(),
                    Err(InstllrError::InvalidServiceLocator { .. })
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_validate_tag() {
        for tag in ["1.2.0", "v2.0.0-rc.1", "2024_06_01"] {
            assert!(validate_tag(tag).is_ok(), "{tag} should be accepted");
        }
        for tag in ["", " ", ".", "..", "release/1.0.0", "a\\b", "1.0\n"] {
            assert!(
                matches!(validate_tag(tag), Err(InstllrError::InvalidReleaseTag { .. })),
                "{tag:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_version_dirs() {
        let locator = ServiceLocator::tagged("acme", "svc", "1.2.0");
        assert_eq!(locator.dir_prefix(), "acme-svc-");
        assert_eq!(locator.version_dir_name("1.2.0"), "acme-svc-1.2.0");
    }
}
