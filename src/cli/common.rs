//! Argument helpers shared by the commands.

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::GlobalConfig;
use crate::core::InstllrError;

/// `clap` value parser for `--env NAME=VALUE`.
///
/// # Errors
///
/// Returns a message if the entry has no `=` or an empty name.
pub fn parse_env_entry(entry: &str) -> Result<String, String> {
    match entry.split_once('=') {
        Some((name, _)) if is_valid_name(name) => Ok(entry.to_string()),
        Some(_) => Err(format!("invalid variable name in '{entry}'")),
        None => Err(format!("expected NAME=VALUE, got '{entry}'")),
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped, and an optional
/// `export ` prefix is accepted.
///
/// # Errors
///
/// Returns [`InstllrError::ConfigError`] naming the first malformed line.
pub fn parse_env_file(content: &str, source: &str) -> Result<Vec<String>, InstllrError> {
    let mut entries = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line = line.strip_prefix("export ").unwrap_or(line).trim_start();
        let entry = parse_env_entry(line).map_err(|reason| InstllrError::ConfigError {
            message: format!("{source}:{}: {reason}", number + 1),
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Application environment from `--env-file` (first) and `--env` flags (after, so they win
/// in systemd's last-assignment-wins order).
///
/// # Errors
///
/// Returns an error if the file cannot be read or has a malformed line.
pub async fn collect_app_env(env_file: Option<&Path>, env: &[String]) -> Result<Vec<String>> {
    let mut entries = match env_file {
        Some(path) => {
            let content = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read env file {}", path.display()))?;
            parse_env_file(&content, &path.display().to_string())?
        }
        None => Vec::new(),
    };
    entries.extend(env.iter().cloned());
    Ok(entries)
}

/// Load the host configuration for a command.
///
/// # Errors
///
/// Returns an error if the file exists but is invalid.
pub async fn load_config(config_path: Option<&Path>) -> Result<GlobalConfig> {
    let config = GlobalConfig::load(config_path).await?;
    tracing::debug!(
        "Services under {}, ledger in {}",
        config.services_root.display(),
        config.ledger_dir.display()
    );
    Ok(config)
}
