use crate::config::schema::{Config, ProviderKind};
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Resolve the application home directory (`PONTE_HOME` overrides `~/.ponte`).
pub fn get_ponte_home() -> Result<PathBuf> {
    if let Ok(home) = std::env::var("PONTE_HOME") {
        return Ok(PathBuf::from(home));
    }
    dirs::home_dir()
        .map(|h| h.join(".ponte"))
        .context("Could not determine home directory")
}

pub fn get_config_path() -> Result<PathBuf> {
    Ok(get_ponte_home()?.join("config.json"))
}

/// Load configuration from `config_path` (or the default location), apply
/// environment credential overrides and validate. A missing file yields the
/// defaults, so a fresh install runs with env-provided keys alone.
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let default_path = get_config_path().unwrap_or_else(|_| PathBuf::from("config.json"));
    let path = config_path.unwrap_or(default_path.as_path());

    let mut config = if path.exists() {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON from {}", path.display()))?
    } else {
        debug!("no config file at {}, using defaults", path.display());
        Config::default()
    };

    apply_env_overrides(&mut config);
    config.validate()?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) {
    override_credentials(config, |name| std::env::var(name).ok());
}

/// Environment credentials take precedence over file-configured ones.
fn override_credentials(config: &mut Config, get: impl Fn(&str) -> Option<String>) {
    for provider in &mut config.providers {
        let var = match provider.kind {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAiCompat => "DEEPSEEK_API_KEY",
        };
        if let Some(key) = get(var) {
            provider.api_key = key;
        }
    }
    if let Some(key) = get("EVOLUTION_API_KEY") {
        config.delivery.api_key = key;
    }
}
