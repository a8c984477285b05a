//! Manager configuration
//!
//! Every field has a default, so an empty file is a valid configuration.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Marker type every breakpoint marker derives from
    #[serde(default = "default_breakpoint_marker_type")]
    pub breakpoint_marker_type: String,

    /// Scope of the initial scan at startup
    #[serde(default = "default_workspace_root")]
    pub workspace_root: PathBuf,

    /// Worker threads for deferred reconciliation (default: 1)
    #[serde(default = "default_deferred_workers")]
    pub deferred_workers: usize,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Breakpoint kinds available without code registration
    #[serde(default)]
    pub breakpoint_types: Vec<BreakpointTypeConfig>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            breakpoint_marker_type: default_breakpoint_marker_type(),
            workspace_root: default_workspace_root(),
            deferred_workers: default_deferred_workers(),
            logging: LoggingConfig::default(),
            breakpoint_types: vec![],
        }
    }
}

impl ManagerConfig {
    /// Read, parse and validate a configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        Ok(config)
    }

    /// Parse and validate a configuration document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.breakpoint_marker_type.trim().is_empty() {
            bail!("breakpoint_marker_type must not be empty");
        }
        if !self.workspace_root.is_absolute() {
            bail!(
                "workspace_root must be absolute, got {}",
                self.workspace_root.display()
            );
        }
        if self.deferred_workers == 0 {
            bail!("deferred_workers must be at least 1");
        }
        for (index, entry) in self.breakpoint_types.iter().enumerate() {
            if entry.marker_type.trim().is_empty() {
                bail!("breakpoint_types[{}]: marker_type must not be empty", index);
            }
            if entry.model.as_deref().is_some_and(|model| model.is_empty()) {
                bail!(
                    "breakpoint_types[{}] ({}): model must not be empty when set",
                    index,
                    entry.marker_type
                );
            }
        }
        self.logging.max_level()?;
        Ok(())
    }
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Maximum level: trace, debug, info, warn or error (default: info)
    #[serde(default = "default_level")]
    pub level: String,

    /// Colored output (default: true)
    #[serde(default = "default_true")]
    pub ansi: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            ansi: true,
        }
    }
}

impl LoggingConfig {
    pub fn max_level(&self) -> Result<tracing::Level> {
        tracing::Level::from_str(&self.level)
            .map_err(|_| anyhow::anyhow!("Unknown log level: {}", self.level))
    }
}

/// A breakpoint kind backed by the generic attribute breakpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakpointTypeConfig {
    pub marker_type: String,

    /// Fixed model identifier; when absent it is read from the marker
    #[serde(default)]
    pub model: Option<String>,
}

fn default_breakpoint_marker_type() -> String {
    "debug.breakpoint".to_string()
}

fn default_workspace_root() -> PathBuf {
    PathBuf::from("/")
}

fn default_deferred_workers() -> usize {
    1
}

fn default_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
