use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::defaults::default_config;
use crate::errors::PolicyError;
use crate::model::{NavigationPolicyConfig, PolicySource};

const ENV_PREFIX: &str = "WEBSTATE_POLICY__";
const ENV_JSON: &str = "WEBSTATE_POLICY_OVERRIDE_JSON";

#[derive(Debug, Default)]
pub struct LoadOptions {
    pub paths: Vec<PathBuf>,
    pub include_env: bool,
}

impl LoadOptions {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            paths: vec![path.into()],
            include_env: true,
        }
    }
}

/// Defaults, then the optional YAML file, then `WEBSTATE_POLICY__*` overrides.
pub fn load_config(path: Option<&Path>) -> Result<NavigationPolicyConfig, PolicyError> {
    let mut options = LoadOptions::default();
    if let Some(p) = path {
        options.paths.push(p.to_path_buf());
    }
    options.include_env = true;
    load_config_with_options(&options)
}

pub fn load_config_with_options(
    options: &LoadOptions,
) -> Result<NavigationPolicyConfig, PolicyError> {
    let mut config = default_config();
    bootstrap_builtin_provenance(&mut config)?;

    for path in &options.paths {
        if path.exists() {
            let overlays = overlays_from_file(path)?;
            debug!(path = %path.display(), count = overlays.len(), "applying policy file");
            apply_overlays(&mut config, overlays)?;
        }
    }

    if options.include_env {
        let env_overlays = overlays_from_env()?;
        apply_overlays(&mut config, env_overlays)?;
    }

    Ok(config)
}

struct PolicyOverlay {
    path: String,
    value: Value,
    source: PolicySource,
}

fn apply_overlays(
    config: &mut NavigationPolicyConfig,
    overlays: Vec<PolicyOverlay>,
) -> Result<(), PolicyError> {
    for overlay in overlays {
        apply_override(config, &overlay.path, &overlay.value, overlay.source)?;
    }
    Ok(())
}

/// Writes one dotted `path` into `config` and records where it came from.
pub fn apply_override(
    config: &mut NavigationPolicyConfig,
    path: &str,
    value: &Value,
    source: PolicySource,
) -> Result<(), PolicyError> {
    match path {
        "blocklist.hosts" => config.blocklist.hosts = to_string_list(value)?,
        "blocklist.schemes" => {
            config.blocklist.schemes = to_string_list(value)?
                .into_iter()
                .map(|scheme| scheme.to_ascii_lowercase())
                .collect()
        }
        "block_universal_links" => config.block_universal_links = to_bool(value)?,
        "response_timeout_ms" => config.response_timeout_ms = to_u64(value)?,
        "change_password.enabled" => config.change_password.enabled = to_bool(value)?,
        path => return Err(PolicyError::UnsupportedPath(path.to_string())),
    }
    config.set_provenance(path, source);
    Ok(())
}

fn overlays_from_file(path: &Path) -> Result<Vec<PolicyOverlay>, PolicyError> {
    let content = fs::read_to_string(path).map_err(|err| PolicyError::Io(format!("{}", err)))?;
    let yaml_value: serde_yaml::Value =
        serde_yaml::from_str(&content).map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
    let json_value =
        serde_json::to_value(yaml_value).map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
    Ok(flatten_value(json_value, None, PolicySource::File))
}

fn overlays_from_env() -> Result<Vec<PolicyOverlay>, PolicyError> {
    let mut overlays = Vec::new();
    for (key, raw) in env::vars() {
        if let Some(stripped) = key.strip_prefix(ENV_PREFIX) {
            let path = stripped
                .split("__")
                .filter(|segment| !segment.is_empty())
                .map(|segment| segment.to_ascii_lowercase())
                .collect::<Vec<_>>()
                .join(".");
            if path.is_empty() {
                continue;
            }
            overlays.push(PolicyOverlay {
                path,
                value: parse_env_value(&raw),
                source: PolicySource::Env,
            });
        }
    }

    if let Ok(raw_json) = env::var(ENV_JSON) {
        if !raw_json.trim().is_empty() {
            let json_value: Value = serde_json::from_str(&raw_json)
                .map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
            overlays.extend(flatten_value(json_value, None, PolicySource::Env));
        }
    }

    Ok(overlays)
}

fn parse_env_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Null;
    }
    if let Ok(parsed) = serde_json::from_str::<Value>(raw) {
        return parsed;
    }
    if let Ok(boolean) = raw.parse::<bool>() {
        return Value::Bool(boolean);
    }
    if let Ok(int_val) = raw.parse::<i64>() {
        return Value::Number(int_val.into());
    }
    Value::String(raw.to_string())
}

fn flatten_value(value: Value, prefix: Option<String>, source: PolicySource) -> Vec<PolicyOverlay> {
    match value {
        Value::Object(map) => {
            let mut result = Vec::new();
            for (key, value) in map {
                let key_segment = key.trim().to_ascii_lowercase();
                let next_prefix = match &prefix {
                    Some(prefix) if !prefix.is_empty() => format!("{}.{}", prefix, key_segment),
                    _ => key_segment,
                };
                result.extend(flatten_value(value, Some(next_prefix), source));
            }
            result
        }
        other => match prefix {
            Some(path) => vec![PolicyOverlay {
                path,
                value: other,
                source,
            }],
            None => Vec::new(),
        },
    }
}

fn bootstrap_builtin_provenance(config: &mut NavigationPolicyConfig) -> Result<(), PolicyError> {
    let mut snapshot = serde_json::to_value(&*config)
        .map_err(|err| PolicyError::Invalid(format!("{}", err)))?;
    if let Value::Object(map) = &mut snapshot {
        map.remove("provenance");
    }
    for overlay in flatten_value(snapshot, None, PolicySource::Builtin) {
        config.set_provenance(&overlay.path, overlay.source);
    }
    Ok(())
}

fn to_string_list(value: &Value) -> Result<Vec<String>, PolicyError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(raw) => Ok(raw
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()),
        Value::Array(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(|s| s.trim().to_string()).ok_or_else(|| {
                    PolicyError::InvalidValue(format!("expected string, got {item}"))
                })
            })
            .collect(),
        other => Err(PolicyError::InvalidValue(format!(
            "expected list of strings, got {other}"
        ))),
    }
}

fn to_u64(value: &Value) -> Result<u64, PolicyError> {
    value
        .as_u64()
        .ok_or_else(|| PolicyError::InvalidValue(format!("expected integer, got {value}")))
}

fn to_bool(value: &Value) -> Result<bool, PolicyError> {
    value
        .as_bool()
        .ok_or_else(|| PolicyError::InvalidValue(format!("expected bool, got {value}")))
}
