//! Configuration loading.
//!
//! A single `config.toml` describes logging and the workspace snapshot that
//! decisions are evaluated against. Path: `$DBGUARD_CONFIG`, else
//! `~/.dbguard/config.toml`.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::workspace::WorkspaceSnapshot;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "DBGUARD_CONFIG";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging settings.
    pub logging: LoggingConfig,

    /// Workspace snapshot: features, policies, users.
    pub workspace: WorkspaceSnapshot,
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for JSON decision logs. Console only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            dir: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

/// Load configuration from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("failed to parse config at {}", path.display()))
}

/// Parse configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or does not match the schema.
pub fn parse_config(toml_str: &str) -> anyhow::Result<Config> {
    let config: Config = toml::from_str(toml_str).context("invalid config TOML")?;
    Ok(config)
}

/// Resolve the default config directory (`~/.dbguard/`).
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let home = directories::BaseDirs::new()
        .ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
    Ok(home.home_dir().join(".dbguard"))
}

/// Resolve the config file path: `$DBGUARD_CONFIG`, else `~/.dbguard/config.toml`.
///
/// # Errors
///
/// Returns an error if neither is available.
pub fn default_config_path() -> anyhow::Result<PathBuf> {
    default_config_path_with(|key| std::env::var(key).ok())
}

/// Resolve the config path using a custom env resolver (for testing).
fn default_config_path_with(env: impl Fn(&str) -> Option<String>) -> anyhow::Result<PathBuf> {
    if let Some(p) = env(CONFIG_ENV) {
        return Ok(PathBuf::from(p));
    }
    Ok(config_dir()?.join("config.toml"))
}
