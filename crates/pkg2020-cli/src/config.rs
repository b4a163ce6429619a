//! Configuration loading from TOML files

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use pkg2020_core::RetryPolicy;
use pkg2020_populate::Limits;
use pkg2020_query::FusekiTarget;
use serde::Deserialize;

/// Global configuration for pkg2020
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub output: OutputConfig,
    pub limits: Limits,
    pub query: QueryConfig,
    pub fuseki: FusekiConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding the OA0x CSV extracts
    pub dir: PathBuf,
    /// Bio-entity CSV directory, defaults to `dir`
    pub bio_dir: Option<PathBuf>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data"),
            bio_dir: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./owl"),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub timeout_secs: u64,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FusekiConfig {
    pub url: String,
    pub dataset: String,
    pub max_retries: u32,
    pub retry_delay_secs: u64,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub username: Option<String>,
    #[serde(deserialize_with = "deserialize_env_var")]
    pub password: Option<String>,
}

impl Default for FusekiConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:3030".to_string(),
            dataset: "pkg2020".to_string(),
            max_retries: 30,
            retry_delay_secs: 2,
            username: None,
            password: std::env::var("FUSEKI_PASSWORD").ok(),
        }
    }
}

impl FusekiConfig {
    pub fn target(&self) -> FusekiTarget {
        FusekiTarget {
            url: self.url.clone(),
            dataset: self.dataset.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            retry: RetryPolicy::fixed(
                self.max_retries,
                Duration::from_secs(self.retry_delay_secs),
            ),
        }
    }
}

/// Deserialize a string that may contain environment variable reference like ${VAR}
fn deserialize_env_var<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt: Option<String> = Option::deserialize(deserializer)?;
    Ok(opt.and_then(|s| expand_env_var(&s)))
}

/// Expand ${VAR} to environment variable value
fn expand_env_var(s: &str) -> Option<String> {
    if let Some(var_name) = s.strip_prefix("${").and_then(|s| s.strip_suffix('}')) {
        std::env::var(var_name).ok()
    } else {
        Some(s.to_string())
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./pkg2020.toml (current directory)
    /// 2. ~/.config/pkg2020/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("pkg2020.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "pkg2020") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn bio_dir(&self) -> &Path {
        self.data.bio_dir.as_deref().unwrap_or(&self.data.dir)
    }

    /// Population settings with an optional uniform `--limit` override.
    pub fn populate_config(&self, limit: Option<usize>) -> pkg2020_populate::Config {
        pkg2020_populate::Config {
            data_dir: self.data.dir.clone(),
            bio_dir: self.bio_dir().to_path_buf(),
            limits: limit.map_or_else(|| self.limits.clone(), Limits::uniform),
            ..Default::default()
        }
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query.timeout_secs)
    }
}
