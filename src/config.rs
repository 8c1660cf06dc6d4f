//! Configuration management for the responder.
//!
//! The configuration file is optional: the orchestrator runs the binary
//! without arguments and the defaults match a stock installation.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/ipset-responder/config.yaml";

/// Upper bound for `max_line_bytes`.
pub const MAX_LINE_BYTES_LIMIT: usize = 16 * 1024 * 1024;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Path of the ipset program
    pub ipset_path: String,

    /// Size of the input line buffer, newline included
    pub max_line_bytes: usize,

    /// Explicit log file (skips install directory discovery)
    pub log_file: Option<PathBuf>,

    /// System user whose home is the install directory
    pub install_user: String,

    /// Environment variable naming the install directory
    pub install_env: String,

    /// Install directory used when neither the user nor the variable resolve
    pub default_install_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ipset_path: "/usr/sbin/ipset".to_string(),
            max_line_bytes: 64 * 1024,
            log_file: None,
            install_user: "wazuh".to_string(),
            install_env: "WAZUH_HOME".to_string(),
            default_install_dir: PathBuf::from("/var/ossec"),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file: {:?}", path.as_ref()))
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    fn from_yaml(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a map
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Config = serde_yaml::from_str(content).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.ipset_path.trim().is_empty() {
            anyhow::bail!("ipset_path cannot be empty");
        }

        if !(2..=MAX_LINE_BYTES_LIMIT).contains(&self.max_line_bytes) {
            anyhow::bail!(
                "Invalid max_line_bytes {}. Must be between 2 and {}",
                self.max_line_bytes,
                MAX_LINE_BYTES_LIMIT
            );
        }

        if self.install_user.is_empty() {
            anyhow::bail!("install_user cannot be empty");
        }

        Ok(())
    }
}
