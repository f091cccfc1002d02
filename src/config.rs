use crate::api::DEFAULT_API_BASE;
use crate::http::DEFAULT_USER_AGENT;
use crate::scrape::DEFAULT_SCRAPE_BASE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const DEFAULT_RESOLVE_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_base_url: String,
    pub scrape_base_url: String,
    /// Overrides the per-catalog output folder
    pub output_root: Option<PathBuf>,
    /// How many manifest entries are resolved at once
    pub resolve_concurrency: usize,
    pub user_agent: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE.to_string(),
            scrape_base_url: DEFAULT_SCRAPE_BASE.to_string(),
            output_root: None,
            resolve_concurrency: DEFAULT_RESOLVE_CONCURRENCY,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

/// `$CMPDL_CONFIG`, else `<config dir>/cmpdl/config.json`.
pub fn config_path() -> Option<PathBuf> {
    if let Some(value) = non_blank_env("CMPDL_CONFIG") {
        return Some(PathBuf::from(value));
    }
    dirs::config_dir().map(|dir| dir.join("cmpdl").join("config.json"))
}

pub fn load_config() -> Result<Config> {
    let mut config = match config_path() {
        Some(path) if path.exists() => {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            serde_json::from_str(&data)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        _ => Config::default(),
    };
    apply_env_overrides(&mut config)?;
    Ok(config)
}

fn apply_env_overrides(config: &mut Config) -> Result<()> {
    if let Some(value) = non_blank_env("CMPDL_API_URL") {
        config.api_base_url = value;
    }
    if let Some(value) = non_blank_env("CMPDL_SCRAPE_URL") {
        config.scrape_base_url = value;
    }
    if let Some(value) = non_blank_env("CMPDL_OUTPUT") {
        config.output_root = Some(PathBuf::from(value));
    }
    if let Some(value) = non_blank_env("CMPDL_CONCURRENCY") {
        config.resolve_concurrency = value
            .trim()
            .parse()
            .with_context(|| format!("invalid CMPDL_CONCURRENCY: {value}"))?;
    }
    if config.resolve_concurrency == 0 {
        config.resolve_concurrency = 1;
    }
    Ok(())
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}
