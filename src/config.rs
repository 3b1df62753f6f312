//! Grooming policy configuration.
//!
//! A policy file lets a scheduled job apply the same retention rule every
//! time without repeating flags. The file is validated before any catalog
//! I/O happens.
use crate::catalog::Catalog;
use crate::retention::{self, GroomOutcome};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Current schema version for `groom.json`.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Retention rule applied by `groom`.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RetentionPolicy {
    /// Keep this many eligible Full chains.
    Count(usize),
    /// Drop oldest chains while the catalog exceeds this many bytes.
    SizeBytes(u64),
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct GroomConfig {
    pub schema_version: u32,
    #[serde(default)]
    pub retention: Option<RetentionPolicy>,
    #[serde(default)]
    pub ignore_errors: bool,
}

/// Config written by `cgroom init-config`: keep two Full chains.
pub fn default_config() -> GroomConfig {
    GroomConfig {
        schema_version: CONFIG_SCHEMA_VERSION,
        retention: Some(RetentionPolicy::Count(2)),
        ignore_errors: false,
    }
}

/// Load and validate a policy file.
pub fn load_config(path: &Path) -> Result<GroomConfig> {
    let bytes = fs::read(path).with_context(|| format!("read config {}", path.display()))?;
    let config: GroomConfig = serde_json::from_slice(&bytes).context("parse groom config JSON")?;
    validate_config(&config)?;
    Ok(config)
}

/// Persist a config in a stable JSON format.
pub fn write_config(path: &Path, config: &GroomConfig) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    let text = serde_json::to_string_pretty(config).context("serialize groom config")?;
    fs::write(path, text.as_bytes()).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

pub fn validate_config(config: &GroomConfig) -> Result<()> {
    if config.schema_version != CONFIG_SCHEMA_VERSION {
        return Err(anyhow!(
            "unsupported groom config schema_version {}",
            config.schema_version
        ));
    }
    if let Some(RetentionPolicy::Count(0)) = config.retention {
        return Err(anyhow!("retention count must be at least 1"));
    }
    Ok(())
}

/// Apply the configured retention rule. A config without a rule is a no-op.
pub fn apply_config(catalog: &mut Catalog, config: &GroomConfig) -> Result<GroomOutcome> {
    validate_config(config)?;
    let outcome = match config.retention {
        Some(RetentionPolicy::Count(count)) => {
            retention::trim_by_count(catalog, count, config.ignore_errors)?
        }
        Some(RetentionPolicy::SizeBytes(bytes)) => {
            retention::trim_by_size(catalog, bytes, config.ignore_errors)?
        }
        None => {
            tracing::info!("no retention rule configured");
            GroomOutcome::default()
        }
    };
    Ok(outcome)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
