//! HTTP handlers for the REST API.
//!
//! Each handler parses the request and delegates to the reporting facade.

use axum::{
    extract::{Path, Query, State},
    Json,
};

use super::dto::{
    CacheClearedResponse, CacheStats, ComparisonResult, HealthResponse, MetricListResponse,
    MetricReport, ReportQuery, RowsResponse,
};
use super::error::AppError;
use super::state::AppState;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Verifies the service is running and the row store answers.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let repository = match state.health.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        repository,
        cutover: state.facade.cutover().to_string(),
    }))
}

// =============================================================================
// Metrics
// =============================================================================

/// GET /v1/metrics
pub async fn list_metrics(State(state): State<AppState>) -> HandlerResult<MetricListResponse> {
    let metrics = state.facade.metric_names();
    let total = metrics.len();
    Ok(Json(MetricListResponse { metrics, total }))
}

/// GET /v1/metrics/{metric}/rows
///
/// Aggregated rows for the window, merged across both data sources.
pub async fn get_rows(
    State(state): State<AppState>,
    Path(metric): Path<String>,
    Query(query): Query<ReportQuery>,
) -> HandlerResult<RowsResponse> {
    let window = query.window()?;
    let rows = state.facade.rows(&metric, &window, &query.filters()).await?;

    Ok(Json(RowsResponse {
        metric,
        window,
        total: rows.len(),
        rows: rows.as_ref().clone(),
    }))
}

/// GET /v1/metrics/{metric}/compare
pub async fn get_comparison(
    State(state): State<AppState>,
    Path(metric): Path<String>,
    Query(query): Query<ReportQuery>,
) -> HandlerResult<ComparisonResult> {
    let window = query.window()?;
    let result = state
        .facade
        .compare(&metric, &window, &query.filters())
        .await?;
    Ok(Json(result))
}

/// GET /v1/metrics/{metric}/report
///
/// Rows and comparison in one response.
pub async fn get_report(
    State(state): State<AppState>,
    Path(metric): Path<String>,
    Query(query): Query<ReportQuery>,
) -> HandlerResult<MetricReport> {
    let window = query.window()?;
    let report = state
        .facade
        .report(&metric, &window, &query.filters())
        .await?;
    Ok(Json(report))
}

// =============================================================================
// Cache
// =============================================================================

/// GET /v1/cache/stats
pub async fn cache_stats(State(state): State<AppState>) -> HandlerResult<CacheStats> {
    Ok(Json(state.facade.cache_stats()))
}

/// DELETE /v1/cache
pub async fn clear_cache(State(state): State<AppState>) -> HandlerResult<CacheClearedResponse> {
    let removed = state.facade.clear_cache();
    Ok(Json(CacheClearedResponse { removed }))
}

/// DELETE /v1/cache/{metric}
///
/// Drops cached results of one metric, e.g. after a late historical load.
pub async fn invalidate_metric(
    State(state): State<AppState>,
    Path(metric): Path<String>,
) -> HandlerResult<CacheClearedResponse> {
    if !state.facade.metric_names().contains(&metric) {
        return Err(AppError::NotFound(format!("Unknown metric: {}", metric)));
    }
    let removed = state.facade.invalidate(&metric);
    Ok(Json(CacheClearedResponse { removed }))
}
