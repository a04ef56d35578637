//! Repository factory for dependency injection.
//!
//! Builds the repository selected by configuration and the metric registry
//! that binds each metric name to its fetchers.

use std::str::FromStr;
use std::sync::Arc;

use super::repositories::LocalRepository;
use super::repository::RepositoryResult;
use crate::config::RepositorySettings;
use crate::services::metrics::{MetricDefinition, MetricRegistry, MetricSelector};

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
}

impl FromStr for RepositoryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Reads `REPOSITORY_TYPE`, defaulting to Local.
    pub fn from_env() -> Self {
        std::env::var("REPOSITORY_TYPE")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(Self::Local)
    }
}

/// Metrics served out of the box: name and selector.
pub const DEFAULT_METRICS: &[(&str, MetricSelector)] = &[
    ("revenue", MetricSelector::SumValue),
    ("admissions", MetricSelector::SumQuantity),
    ("cost_per_case", MetricSelector::ValuePerQuantity),
];

/// Creates repositories and registries from configuration.
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create the configured repository, loading its seed file if one is set.
    pub fn create(settings: &RepositorySettings) -> RepositoryResult<Arc<LocalRepository>> {
        let repo_type = RepositoryType::from_str(&settings.repo_type).map_err(|e| {
            super::repository::RepositoryError::configuration(format!(
                "Invalid repository type: {}",
                e
            ))
        })?;

        match repo_type {
            RepositoryType::Local => {
                let repo = Self::create_local();
                if let Some(path) = &settings.seed_file {
                    let loaded = repo.load_seed_file(path)?;
                    log::info!("loaded {} seed rows from {}", loaded, path.display());
                }
                Ok(repo)
            }
        }
    }

    /// Create an empty in-memory repository.
    pub fn create_local() -> Arc<LocalRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Registry with every [`DEFAULT_METRICS`] entry served by `repo`.
    pub fn default_registry(repo: &LocalRepository) -> MetricRegistry {
        let mut registry = MetricRegistry::new();
        for (name, selector) in DEFAULT_METRICS {
            let source = Arc::new(repo.source(name));
            registry.register(MetricDefinition::new(
                *name,
                *selector,
                source.clone(),
                source,
            ));
        }
        registry
    }
}
