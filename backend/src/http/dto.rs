//! Data Transfer Objects for the HTTP API.
//!
//! Engine results (`ComparisonResult`, `MetricReport`, `CacheStats`) already
//! derive `Serialize` and are returned as-is.

use serde::{Deserialize, Serialize};

pub use crate::cache::CacheStats;
pub use crate::models::{AggregatedRow, ComparisonResult};
pub use crate::services::MetricReport;

use crate::error::ReportResult;
use crate::models::{FilterSet, TimeWindow};

/// Query string shared by the metric endpoints.
///
/// `end` is inclusive on the wire. Filter lists are comma-separated; an
/// empty list means no filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportQuery {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub departments: Option<String>,
    #[serde(default)]
    pub doctors: Option<String>,
}

impl ReportQuery {
    pub fn window(&self) -> ReportResult<TimeWindow> {
        TimeWindow::parse_inclusive(&self.start, &self.end)
    }

    pub fn filters(&self) -> FilterSet {
        FilterSet::from_csv(self.departments.as_deref(), self.doctors.as_deref())
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub repository: String,
    /// Cutover used by requests made now.
    pub cutover: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricListResponse {
    pub metrics: Vec<String>,
    pub total: usize,
}

/// Aggregated rows of one metric.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowsResponse {
    pub metric: String,
    pub window: TimeWindow,
    pub rows: Vec<AggregatedRow>,
    pub total: usize,
}

/// Number of cache entries removed by an invalidation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheClearedResponse {
    pub removed: usize,
}
