//! Configuration loading from JSON or YAML files and `COMPACT_*` environment variables

use crate::error::{CompactError, Result};
use crate::types::{CompactConfig, ConfigSettings};
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CONFIG_FILE: &str = "compact.json";

/// Files looked up in the working directory when no path is given
pub const CONFIG_FILE_CANDIDATES: [&str; 3] = [DEFAULT_CONFIG_FILE, "compact.yaml", "compact.yml"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Yaml,
}

impl ConfigFormat {
    fn of(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ConfigFormat::Yaml
            }
            _ => ConfigFormat::Json,
        }
    }
}

/// Loads and validates [`CompactConfig`]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Read raw settings from a file; `.yaml`/`.yml` parse as YAML, anything
    /// else as JSON. Missing keys take defaults.
    pub fn load_file(path: &Path) -> Result<ConfigSettings> {
        if !path.exists() {
            return Err(CompactError::ConfigNotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        if content.trim().is_empty() {
            return Ok(ConfigSettings::default());
        }
        match ConfigFormat::of(path) {
            ConfigFormat::Json => Ok(serde_json::from_str(&content)?),
            ConfigFormat::Yaml => Ok(serde_yaml::from_str(&content)?),
        }
    }

    /// Apply overrides from the process environment
    pub fn apply_env(settings: &mut ConfigSettings) -> Result<()> {
        Self::apply_env_with(settings, |key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_env_with<F>(settings: &mut ConfigSettings, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("COMPACT_MODEL") {
            settings.model = model;
        }
        if let Some(v) = lookup("COMPACT_MAX_CONTEXT_TOKENS") {
            settings.max_context_tokens = parse_var("COMPACT_MAX_CONTEXT_TOKENS", &v)?;
        }

        let policy = &mut settings.policy;
        if let Some(v) = lookup("COMPACT_TRIGGER_PCT") {
            policy.trigger_pct = parse_var("COMPACT_TRIGGER_PCT", &v)?;
        }
        if let Some(v) = lookup("COMPACT_HARD_CAP_BUFFER") {
            policy.hard_cap_buffer = parse_var("COMPACT_HARD_CAP_BUFFER", &v)?;
        }
        if let Some(v) = lookup("COMPACT_KEEP_RECENT_TURNS") {
            policy.keep_recent_turns = parse_var("COMPACT_KEEP_RECENT_TURNS", &v)?;
        }
        if let Some(v) = lookup("COMPACT_KEEP_TOOL_IO_PAIRS") {
            policy.keep_tool_io_pairs = parse_var("COMPACT_KEEP_TOOL_IO_PAIRS", &v)?;
        }
        if let Some(v) = lookup("COMPACT_STRATEGY") {
            policy.strategy = v.parse()?;
        }

        if let Some(url) = lookup("COMPACT_EXPORT_URL") {
            settings.export_url = Some(url);
        }
        if lookup("COMPACT_TELEMETRY_ENABLED").as_deref() == Some("false") {
            settings.telemetry_enabled = false;
        }
        Ok(())
    }

    /// Load from an optional file, optionally merge the environment, validate
    pub fn load(path: Option<&Path>, merge_env: bool) -> Result<CompactConfig> {
        let mut settings = match path {
            Some(p) => Self::load_file(p)?,
            None => ConfigSettings::default(),
        };
        if merge_env {
            Self::apply_env(&mut settings)?;
        }
        settings.build()
    }
}

fn parse_var<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CompactError::InvalidConfig(format!("{key} has invalid value {value:?}")))
}

/// Write the default configuration, as YAML or pretty JSON by extension
pub fn create_example_config(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let defaults = ConfigSettings::default();
    let content = match ConfigFormat::of(path) {
        ConfigFormat::Json => serde_json::to_string_pretty(&defaults)?,
        ConfigFormat::Yaml => serde_yaml::to_string(&defaults)?,
    };
    std::fs::write(path, content)?;
    Ok(())
}
