//! Reporting facade: the layer HTTP handlers call.
//!
//! Resolves a metric by name, reads the cutover from the clock, runs the
//! aggregator or comparator and caches successful results. Failures are never
//! cached.

use chrono::NaiveDate;
use log::{debug, warn};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::aggregator::DualSourceAggregator;
use super::comparator::PeriodComparator;
use super::metrics::{MetricDefinition, MetricRegistry};
use crate::cache::{cache_key, cache_key_prefix, CacheStats, TtlCache};
use crate::clock::Clock;
use crate::config::ReportingConfig;
use crate::error::{ReportError, ReportResult};
use crate::models::{AggregatedRow, ComparisonResult, FilterSet, TimeWindow};

/// What the facade keeps in its cache.
#[derive(Debug, Clone)]
pub enum CachedReport {
    Rows(Arc<Vec<AggregatedRow>>),
    Comparison(ComparisonResult),
}

/// Rows and comparison of one metric for one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricReport {
    pub metric: String,
    pub cutover: NaiveDate,
    pub window: TimeWindow,
    pub filters: FilterSet,
    pub rows: Vec<AggregatedRow>,
    pub comparison: ComparisonResult,
}

const ROWS_OPERATION: &str = "rows";
const COMPARE_OPERATION: &str = "compare";

/// Entry point for report requests. Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct ReportingFacade {
    registry: Arc<MetricRegistry>,
    cache: Arc<TtlCache<CachedReport>>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl ReportingFacade {
    pub fn new(
        registry: MetricRegistry,
        cache: Arc<TtlCache<CachedReport>>,
        clock: Arc<dyn Clock>,
        ttl: Duration,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            cache,
            clock,
            ttl,
        }
    }

    /// Facade with the cache size, TTL and clock taken from `config`.
    pub fn from_config(config: &ReportingConfig, registry: MetricRegistry) -> Self {
        let clock = config.clock();
        let cache = Arc::new(TtlCache::with_clock(
            config.cache.max_entries,
            Arc::clone(&clock),
        ));
        Self::new(registry, cache, clock, config.default_ttl())
    }

    /// Date separating historical from live reads for requests made now.
    pub fn cutover(&self) -> NaiveDate {
        self.clock.today()
    }

    pub fn metric_names(&self) -> Vec<String> {
        self.registry.names()
    }

    /// Merged rows of `metric` in `window`.
    pub async fn rows(
        &self,
        metric: &str,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> ReportResult<Arc<Vec<AggregatedRow>>> {
        self.rows_at(self.cutover(), metric, window, filters).await
    }

    /// Current value of `metric` against its previous-period and year-ago
    /// baselines.
    pub async fn compare(
        &self,
        metric: &str,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> ReportResult<ComparisonResult> {
        self.compare_at(self.cutover(), metric, window, filters)
            .await
    }

    /// Rows and comparison together, both computed under the same cutover.
    pub async fn report(
        &self,
        metric: &str,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> ReportResult<MetricReport> {
        let cutover = self.cutover();
        let (rows, comparison) = futures::try_join!(
            self.rows_at(cutover, metric, window, filters),
            self.compare_at(cutover, metric, window, filters),
        )?;

        Ok(MetricReport {
            metric: metric.to_string(),
            cutover,
            window: *window,
            filters: filters.clone(),
            rows: rows.as_ref().clone(),
            comparison,
        })
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop every cached result of `metric`. Returns how many were removed.
    pub fn invalidate(&self, metric: &str) -> usize {
        [ROWS_OPERATION, COMPARE_OPERATION]
            .iter()
            .map(|operation| {
                self.cache
                    .delete_prefix(&cache_key_prefix(&[*operation, metric]))
            })
            .sum()
    }

    /// Drop every cached result. Returns how many were removed.
    pub fn clear_cache(&self) -> usize {
        self.cache.clear()
    }

    async fn rows_at(
        &self,
        cutover: NaiveDate,
        metric: &str,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> ReportResult<Arc<Vec<AggregatedRow>>> {
        let definition = self.registry.get(metric)?;
        let key = Self::key(ROWS_OPERATION, metric, cutover, window, filters);

        if let Some(CachedReport::Rows(rows)) = self.cache.get(&key) {
            debug!("cache hit {}", key);
            return Ok(rows);
        }

        let rows = DualSourceAggregator::new(cutover)
            .aggregate(
                window,
                filters,
                definition.historical.as_ref(),
                definition.live.as_ref(),
            )
            .await
            .inspect_err(|e| log_failure(definition, window, e))?;

        let rows = Arc::new(rows);
        self.cache
            .set(key, CachedReport::Rows(Arc::clone(&rows)), self.ttl);
        Ok(rows)
    }

    async fn compare_at(
        &self,
        cutover: NaiveDate,
        metric: &str,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> ReportResult<ComparisonResult> {
        let definition = self.registry.get(metric)?;
        let key = Self::key(COMPARE_OPERATION, metric, cutover, window, filters);

        if let Some(CachedReport::Comparison(result)) = self.cache.get(&key) {
            debug!("cache hit {}", key);
            return Ok(result);
        }

        let aggregator = DualSourceAggregator::new(cutover);
        let bound = aggregator.bind(
            definition.historical.as_ref(),
            definition.live.as_ref(),
        );
        let result = PeriodComparator::new()
            .compare(window, filters, &bound, definition.selector)
            .await
            .inspect_err(|e| log_failure(definition, window, e))?;

        self.cache
            .set(key, CachedReport::Comparison(result.clone()), self.ttl);
        Ok(result)
    }

    /// The cutover is part of the key: results computed before midnight used
    /// a different historical/live split.
    fn key(
        operation: &str,
        metric: &str,
        cutover: NaiveDate,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> String {
        let cutover = cutover.to_string();
        cache_key(&[operation, metric, cutover.as_str()], window, filters)
    }
}

fn log_failure(definition: &MetricDefinition, window: &TimeWindow, error: &ReportError) {
    warn!(
        "report for metric={} window={} failed: {}",
        definition.name, window, error
    );
}
