//! Configuration file support.
//!
//! Settings are read from `reporting.toml` and then overridden from the
//! environment. Every section is optional.
//!
//! ```toml
//! [repository]
//! type = "local"
//! seed_file = "data/seed.json"
//!
//! [cache]
//! max_entries = 512
//! default_ttl_secs = 300
//!
//! [engine]
//! cutover = "2025-11-10"
//!
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::DEFAULT_MAX_ENTRIES;
use crate::clock::{Clock, FixedCutoverClock, SystemClock};
use crate::db::factory::RepositoryType;
use crate::db::repository::{RepositoryError, RepositoryResult};
use crate::models::parse_date;

/// Full service configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportingConfig {
    #[serde(default)]
    pub repository: RepositorySettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub server: ServerSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type", default = "default_repository_type")]
    pub repo_type: String,
    /// JSON file loaded into the local repository at startup.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Zero disables expiry.
    #[serde(default = "default_ttl_secs")]
    pub default_ttl_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Pin the historical/live cutover instead of using today's date.
    #[serde(default)]
    pub cutover: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_repository_type() -> String {
    "local".to_string()
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_ttl_secs() -> u64 {
    300
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            repo_type: default_repository_type(),
            seed_file: None,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            default_ttl_secs: default_ttl_secs(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl FromStr for ReportingConfig {
    type Err = RepositoryError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: ReportingConfig = toml::from_str(content).map_err(|e| {
            RepositoryError::configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }
}

impl ReportingConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> RepositoryResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let mut config: ReportingConfig = content.parse()?;
        config.resolve_relative_paths(path.as_ref());
        Ok(config)
    }

    /// Seed paths in a file are relative to that file's directory.
    fn resolve_relative_paths(&mut self, config_path: &Path) {
        let base = config_path.parent().unwrap_or_else(|| Path::new(""));
        if let Some(seed) = self.repository.seed_file.as_mut() {
            if seed.is_relative() {
                *seed = base.join(&*seed);
            }
        }
    }

    /// Load configuration from the first `reporting.toml` found in the
    /// current directory, `backend/` or the parent directory.
    pub fn from_default_location() -> RepositoryResult<Self> {
        match default_config_path() {
            Some(path) => Self::from_file(path),
            None => Err(RepositoryError::configuration(
                "No reporting.toml found in standard locations",
            )),
        }
    }

    /// Default-location file if present, otherwise defaults; then environment.
    pub fn load() -> RepositoryResult<Self> {
        let mut config = match default_config_path() {
            Some(path) => {
                log::info!("loading configuration from {}", path.display());
                Self::from_file(path)?
            }
            None => {
                log::info!("no reporting.toml found, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) -> RepositoryResult<()> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> RepositoryResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("REPOSITORY_TYPE") {
            self.repository.repo_type = value;
        }
        if let Some(value) = lookup("REPORTING_CACHE_MAX_ENTRIES") {
            self.cache.max_entries = parse_env("REPORTING_CACHE_MAX_ENTRIES", &value)?;
        }
        if let Some(value) = lookup("REPORTING_CACHE_TTL_SECS") {
            self.cache.default_ttl_secs = parse_env("REPORTING_CACHE_TTL_SECS", &value)?;
        }
        if let Some(value) = lookup("REPORTING_CUTOVER") {
            let date = parse_date(&value).map_err(|e| {
                RepositoryError::configuration(format!("REPORTING_CUTOVER: {}", e))
            })?;
            self.engine.cutover = Some(date);
        }
        if let Some(value) = lookup("HOST") {
            self.server.host = value;
        }
        if let Some(value) = lookup("PORT") {
            self.server.port = parse_env("PORT", &value)?;
        }
        self.validate()
    }

    pub fn validate(&self) -> RepositoryResult<()> {
        self.repository_type()?;
        if self.cache.max_entries == 0 {
            return Err(RepositoryError::configuration(
                "cache.max_entries must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn repository_type(&self) -> RepositoryResult<RepositoryType> {
        RepositoryType::from_str(&self.repository.repo_type).map_err(|e| {
            RepositoryError::configuration(format!("Invalid repository type: {}", e))
        })
    }

    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.default_ttl_secs)
    }

    /// Clock for the facade: a pinned cutover if configured, otherwise the
    /// system clock.
    pub fn clock(&self) -> Arc<dyn Clock> {
        match self.engine.cutover {
            Some(cutover) => Arc::new(FixedCutoverClock::new(cutover)),
            None => Arc::new(SystemClock),
        }
    }

    /// `host:port` for the listener.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn default_config_path() -> Option<PathBuf> {
    [
        PathBuf::from("reporting.toml"),
        PathBuf::from("backend/reporting.toml"),
        PathBuf::from("../reporting.toml"),
    ]
    .into_iter()
    .find(|path| path.exists())
}

fn parse_env<T: FromStr>(key: &str, value: &str) -> RepositoryResult<T>
where
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| RepositoryError::configuration(format!("{}={:?}: {}", key, value, e)))
}
