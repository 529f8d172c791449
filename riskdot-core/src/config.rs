//! Configuration file support
//!
//! Loads project configuration from JSON files.
//!
//! Search order:
//! 1. Explicit path (--config CLI flag)
//! 2. `.riskdotrc.json` in the project root
//! 3. `riskdot.config.json` in the project root
//!
//! All fields are optional. CLI flags take precedence over config file
//! values. The active matrix named here is the single matrix the resolver
//! uses; "exactly one active" is enforced at registry construction, not by
//! any global state.

use crate::matrix::{MatrixRegistry, RiskMatrix, DEFAULT_MATRIX_NAME};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Riskdot configuration loaded from a JSON config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RiskdotConfig {
    /// Name of the matrix to activate (default: the seeded default matrix)
    #[serde(default)]
    pub active_matrix: Option<String>,

    /// Default snapshot file to load when the CLI is given none
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

impl RiskdotConfig {
    /// Validate the configuration for logical errors
    pub fn validate(&self) -> Result<()> {
        if let Some(ref name) = self.active_matrix {
            if name.trim().is_empty() {
                anyhow::bail!("active_matrix must not be empty");
            }
        }
        Ok(())
    }

    /// Resolve config into a ready-to-use form
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        self.validate()?;

        let active_matrix = self
            .active_matrix
            .clone()
            .unwrap_or_else(|| DEFAULT_MATRIX_NAME.to_string());

        Ok(ResolvedConfig {
            active_matrix,
            snapshot_path: self.snapshot_path.clone(),
            config_path: None,
        })
    }
}

/// Resolved configuration
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Name of the active matrix
    pub active_matrix: String,
    /// Default snapshot file for the CLI
    pub snapshot_path: Option<PathBuf>,
    /// Path the config was loaded from (None if defaults)
    pub config_path: Option<PathBuf>,
}

impl ResolvedConfig {
    /// Build a ResolvedConfig with all defaults (no config file)
    pub fn defaults() -> Result<Self> {
        RiskdotConfig::default().resolve()
    }

    /// Build the matrix registry this config selects
    ///
    /// Only the seeded default matrix is known out of the box; a config
    /// naming anything else fails here rather than at first resolve.
    pub fn matrix_registry(&self) -> Result<MatrixRegistry> {
        MatrixRegistry::new(vec![RiskMatrix::seeded_default()], &self.active_matrix)
            .with_context(|| format!("unknown active matrix: {}", self.active_matrix))
    }
}

/// Discover and load a config file from the project root
///
/// Returns `None` if no config file is found (use defaults).
pub fn discover_config(project_root: &Path) -> Result<Option<(RiskdotConfig, PathBuf)>> {
    let rc_path = project_root.join(".riskdotrc.json");
    if rc_path.exists() {
        let config = load_config_file(&rc_path)?;
        return Ok(Some((config, rc_path)));
    }

    let config_path = project_root.join("riskdot.config.json");
    if config_path.exists() {
        let config = load_config_file(&config_path)?;
        return Ok(Some((config, config_path)));
    }

    Ok(None)
}

/// Load config from an explicit file path
pub fn load_config_file(path: &Path) -> Result<RiskdotConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file: {}", path.display()))?;

    let config: RiskdotConfig = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse config file: {}", path.display()))?;

    config
        .validate()
        .with_context(|| format!("invalid config in: {}", path.display()))?;

    Ok(config)
}

/// Load and resolve config for a project
///
/// If `config_path` is provided, loads from that file. Otherwise discovers
/// config from the project root. Returns defaults if nothing is found.
pub fn load_and_resolve(project_root: &Path, config_path: Option<&Path>) -> Result<ResolvedConfig> {
    let (config, source_path) = if let Some(path) = config_path {
        let config = load_config_file(path)?;
        (config, Some(path.to_path_buf()))
    } else {
        match discover_config(project_root)? {
            Some((config, path)) => (config, Some(path)),
            None => (RiskdotConfig::default(), None),
        }
    };

    let mut resolved = config.resolve()?;
    resolved.config_path = source_path;
    Ok(resolved)
}
