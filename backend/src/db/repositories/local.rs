//! In-memory local repository implementation.
//!
//! This module provides a local implementation of the fetcher traits suitable
//! for unit testing and local development. Each metric keeps two row tables,
//! one per data source, so the dual-source reconciliation can be exercised
//! without a database.

use async_trait::async_trait;
use log::debug;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::db::repository::{
    ErrorContext, HealthCheck, HistoricalFetch, LiveFetch, RepositoryError, RepositoryResult,
};
use crate::models::{AggregatedRow, DataSource, FilterSet, TimeWindow};

/// A fetch that reached the repository, recorded for inspection in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchCall {
    pub metric: String,
    pub source: DataSource,
    pub window: TimeWindow,
}

/// In-memory local repository.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use ops_reporting::db::repositories::LocalRepository;
/// use ops_reporting::models::AggregatedRow;
/// use rust_decimal::Decimal;
///
/// let repo = LocalRepository::new();
/// let day = NaiveDate::from_ymd_opt(2025, 1, 5).unwrap();
/// repo.insert_historical(
///     "revenue",
///     vec![AggregatedRow::new(day, "ICU", "Intensive Care", Decimal::from(10), Decimal::ONE)],
/// );
/// assert_eq!(repo.metrics(), vec!["revenue".to_string()]);
/// ```
#[derive(Clone)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
    record_calls: bool,
}

#[derive(Default)]
struct MetricTables {
    historical: Vec<AggregatedRow>,
    live: Vec<AggregatedRow>,
}

#[derive(Deserialize)]
struct SeedTables {
    #[serde(default)]
    historical: Vec<AggregatedRow>,
    #[serde(default)]
    live: Vec<AggregatedRow>,
}

struct LocalData {
    metrics: HashMap<String, MetricTables>,
    failures: HashMap<(String, DataSource), String>,
    calls: Vec<FetchCall>,
    is_healthy: bool,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            metrics: HashMap::new(),
            failures: HashMap::new(),
            calls: Vec::new(),
            is_healthy: true,
        }
    }
}

impl Default for LocalRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self {
            data: Arc::new(RwLock::new(LocalData::default())),
            record_calls: false,
        }
    }

    /// Keep a log of every fetch, readable through [`Self::fetch_calls`].
    ///
    /// The log is unbounded; leave recording off outside tests.
    pub fn with_call_recording(mut self) -> Self {
        self.record_calls = true;
        self
    }

    /// Append rows to the historical table of `metric`.
    pub fn insert_historical(&self, metric: &str, rows: Vec<AggregatedRow>) {
        self.insert(metric, DataSource::Historical, rows);
    }

    /// Append rows to the live table of `metric`.
    pub fn insert_live(&self, metric: &str, rows: Vec<AggregatedRow>) {
        self.insert(metric, DataSource::Live, rows);
    }

    fn insert(&self, metric: &str, source: DataSource, rows: Vec<AggregatedRow>) {
        let mut data = self.data.write();
        let tables = data.metrics.entry(metric.to_string()).or_default();
        match source {
            DataSource::Historical => tables.historical.extend(rows),
            DataSource::Live => tables.live.extend(rows),
        }
    }

    /// Load rows from a JSON seed file.
    ///
    /// ```json
    /// {"revenue": {"historical": [...], "live": [...]}}
    /// ```
    pub fn load_seed_file<P: AsRef<Path>>(&self, path: P) -> RepositoryResult<usize> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::configuration(format!(
                "Failed to read seed file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        self.load_seed_json(&content)
    }

    /// Load rows from a JSON seed document. Returns the number of rows added.
    ///
    /// Nothing is loaded if any row has a negative value or quantity.
    pub fn load_seed_json(&self, json: &str) -> RepositoryResult<usize> {
        let seed: HashMap<String, SeedTables> = serde_json::from_str(json)
            .map_err(|e| RepositoryError::configuration(format!("Invalid seed data: {}", e)))?;

        for (metric, tables) in &seed {
            let negative = tables
                .historical
                .iter()
                .chain(&tables.live)
                .find(|row| row.value < Decimal::ZERO || row.quantity < Decimal::ZERO);
            if let Some(row) = negative {
                return Err(RepositoryError::configuration(format!(
                    "Invalid seed data: negative value or quantity for metric {} on {} in {}",
                    metric, row.date, row.department_code
                )));
            }
        }

        let mut added = 0;
        for (metric, tables) in seed {
            added += tables.historical.len() + tables.live.len();
            self.insert_historical(&metric, tables.historical);
            self.insert_live(&metric, tables.live);
        }
        debug!("seeded local repository with {} rows", added);
        Ok(added)
    }

    /// Fetcher handle for one metric.
    pub fn source(&self, metric: &str) -> LocalMetricSource {
        LocalMetricSource {
            repo: self.clone(),
            metric: metric.to_string(),
        }
    }

    /// Names of all metrics holding data, sorted.
    pub fn metrics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.data.read().metrics.keys().cloned().collect();
        names.sort();
        names
    }

    /// Make every fetch of `metric` from `source` fail with a query error.
    pub fn fail_source(&self, metric: &str, source: DataSource, message: impl Into<String>) {
        self.data
            .write()
            .failures
            .insert((metric.to_string(), source), message.into());
    }

    pub fn clear_failures(&self) {
        self.data.write().failures.clear();
    }

    /// Set the health status (for testing).
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Every fetch served so far, in call order. Empty unless built
    /// [`with_call_recording`](Self::with_call_recording).
    pub fn fetch_calls(&self) -> Vec<FetchCall> {
        self.data.read().calls.clone()
    }

    fn fetch(
        &self,
        metric: &str,
        source: DataSource,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> RepositoryResult<Vec<AggregatedRow>> {
        let operation = format!("fetch_{}", source);
        let data = self.data.read();

        if !data.is_healthy {
            return Err(RepositoryError::connection("local repository is unhealthy")
                .with_operation(operation));
        }

        if let Some(message) = data.failures.get(&(metric.to_string(), source)) {
            return Err(RepositoryError::query_with_context(
                message.clone(),
                ErrorContext::new(operation)
                    .with_metric(metric)
                    .with_window(window),
            ));
        }

        let rows: Vec<AggregatedRow> = data
            .metrics
            .get(metric)
            .map(|tables| match source {
                DataSource::Historical => &tables.historical,
                DataSource::Live => &tables.live,
            })
            .into_iter()
            .flatten()
            .filter(|row| {
                window.contains(row.date)
                    && filters.matches(&row.department_code, row.doctor_id.as_deref())
            })
            .cloned()
            .collect();
        drop(data);

        if self.record_calls {
            self.data.write().calls.push(FetchCall {
                metric: metric.to_string(),
                source,
                window: *window,
            });
        }

        debug!(
            "local {} fetch metric={} window={} rows={}",
            source,
            metric,
            window,
            rows.len()
        );
        Ok(rows)
    }
}

#[async_trait]
impl HealthCheck for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }
}

/// Historical and live fetchers for a single metric of a [`LocalRepository`].
#[derive(Clone)]
pub struct LocalMetricSource {
    repo: LocalRepository,
    metric: String,
}

#[async_trait]
impl HistoricalFetch for LocalMetricSource {
    async fn fetch_historical(
        &self,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> RepositoryResult<Vec<AggregatedRow>> {
        self.repo
            .fetch(&self.metric, DataSource::Historical, window, filters)
    }
}

#[async_trait]
impl LiveFetch for LocalMetricSource {
    async fn fetch_live(
        &self,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> RepositoryResult<Vec<AggregatedRow>> {
        self.repo.fetch(&self.metric, DataSource::Live, window, filters)
    }
}
