//! Application configuration for the `webstate` binary.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use webstate_breadcrumbs::BreadcrumbPolicyView;

pub const ENV_LOG_LEVEL: &str = "WEBSTATE_LOG_LEVEL";
pub const ENV_BREADCRUMB_STORE: &str = "WEBSTATE_BREADCRUMB_STORE";
pub const ENV_POLICY_PATH: &str = "WEBSTATE_POLICY_PATH";

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub log_level: String,
    /// File mirroring the breadcrumb log between runs.
    pub breadcrumb_store: PathBuf,
    /// Navigation policy YAML; built-in defaults when unset.
    pub policy_path: Option<PathBuf>,
    pub breadcrumbs: BreadcrumbPolicyView,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            breadcrumb_store: default_store_path(),
            policy_path: None,
            breadcrumbs: BreadcrumbPolicyView::default(),
        }
    }
}

pub struct LoadedConfig {
    pub config: AppConfig,
    /// Where the configuration was looked for, whether or not it existed.
    pub path: PathBuf,
    pub found: bool,
}

fn default_store_path() -> PathBuf {
    match dirs::data_local_dir() {
        Some(mut path) => {
            path.push("webstate");
            path.push("breadcrumbs.log");
            path
        }
        None => PathBuf::from("webstate-breadcrumbs.log"),
    }
}

/// Resolves the configuration file: explicit path, then
/// `./config/webstate.yaml`, then the user config directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    let local = PathBuf::from("config/webstate.yaml");
    if local.exists() {
        return local;
    }
    match dirs::config_dir() {
        Some(mut path) => {
            path.push("webstate");
            path.push("config.yaml");
            path
        }
        None => local,
    }
}

/// Loads the configuration; a missing file yields defaults. Environment
/// overrides are applied last.
pub fn load_config(explicit: Option<&Path>) -> Result<LoadedConfig> {
    let path = resolve_config_path(explicit);
    let (mut config, found) = if path.exists() {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: AppConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        (config, true)
    } else {
        (AppConfig::default(), false)
    };
    apply_env_overrides(&mut config);
    config
        .breadcrumbs
        .validate()
        .context("Invalid breadcrumbs section")?;
    Ok(LoadedConfig {
        config,
        path,
        found,
    })
}

pub fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(level) = env::var(ENV_LOG_LEVEL) {
        if !level.trim().is_empty() {
            config.log_level = level.trim().to_string();
        }
    }
    if let Ok(store) = env::var(ENV_BREADCRUMB_STORE) {
        if !store.trim().is_empty() {
            config.breadcrumb_store = PathBuf::from(store.trim());
        }
    }
    if let Ok(policy) = env::var(ENV_POLICY_PATH) {
        if !policy.trim().is_empty() {
            config.policy_path = Some(PathBuf::from(policy.trim()));
        }
    }
}

impl LoadedConfig {
    /// Reports where the configuration came from. Call once logging is up.
    pub fn log_source(&self) {
        if self.found {
            info!("Loaded configuration from: {}", self.path.display());
        } else {
            warn!(
                "Config file not found, using defaults: {}",
                self.path.display()
            );
        }
    }
}
