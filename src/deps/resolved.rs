//! Resolved executable paths and argv substitution.

use std::collections::HashMap;
use std::path::PathBuf;

/// Result of looking up the first token of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The token names a checked dependency; use its absolute path
    Resolved(PathBuf),
    /// Not a checked dependency; the literal token is used as-is
    Unresolved(String),
}

impl Resolution {
    /// The token to put in argv.
    #[must_use]
    pub fn into_token(self) -> String {
        match self {
            Self::Resolved(path) => path.display().to_string(),
            Self::Unresolved(token) => token,
        }
    }
}

/// Executable name to absolute path, one entry per verified requirement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedDependencies {
    paths: HashMap<String, PathBuf>,
}

impl ResolvedDependencies {
    /// Empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record where `app` was found.
    pub fn insert(&mut self, app: impl Into<String>, path: PathBuf) {
        self.paths.insert(app.into(), path);
    }

    /// Path of a resolved dependency.
    #[must_use]
    pub fn get(&self, app: &str) -> Option<&PathBuf> {
        self.paths.get(app)
    }

    /// Number of resolved dependencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether nothing was resolved.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Look up a command token.
    #[must_use]
    pub fn substitute(&self, token: &str) -> Resolution {
        match self.paths.get(token) {
            Some(path) => Resolution::Resolved(path.clone()),
            None => Resolution::Unresolved(token.to_string()),
        }
    }

    /// `argv` with its first token replaced by the resolved path when there is one.
    ///
    /// A miss is not an error: the literal token is kept and a warning logged.
    #[must_use]
    pub fn command_line(&self, argv: &[String]) -> Vec<String> {
        let Some((first, rest)) = argv.split_first() else {
            return Vec::new();
        };

        let program = match self.substitute(first) {
            Resolution::Resolved(path) => path.display().to_string(),
            Resolution::Unresolved(token) => {
                tracing::warn!("'{token}' is not a checked dependency, using it unresolved");
                token
            }
        };

        std::iter::once(program).chain(rest.iter().cloned()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|t| (*t).to_string()).collect()
    }

    #[test]
    fn test_substitute() {
        let mut deps = ResolvedDependencies::new();
        deps.insert("node", PathBuf::from("/usr/bin/node"));

        assert_eq!(deps.substitute("node"), Resolution::Resolved(PathBuf::from("/usr/bin/node")));
        assert_eq!(deps.substitute("./app"), Resolution::Unresolved("./app".to_string()));
        assert_eq!(deps.substitute("./app").into_token(), "./app");
    }

    #[test]
    fn test_command_line_replaces_only_first_token() {
        let mut deps = ResolvedDependencies::new();
        deps.insert("node", PathBuf::from("/opt/node/bin/node"));

        assert_eq!(
            deps.command_line(&argv(&["node", "node", "server.js"])),
            argv(&["/opt/node/bin/node", "node", "server.js"])
        );
    }

    #[test]
    fn test_command_line_falls_back_to_literal() {
        let deps = ResolvedDependencies::new();
        assert_eq!(deps.command_line(&argv(&["app", "--serve"])), argv(&["app", "--serve"]));
        assert!(deps.command_line(&[]).is_empty());
    }
}
