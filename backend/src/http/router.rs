//! Router configuration for the HTTP API.
//!
//! Sets up all routes and middleware (CORS, compression, tracing).

use axum::{
    routing::{delete, get},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // Dashboards are served from another origin.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        .route("/metrics", get(handlers::list_metrics))
        .route("/metrics/{metric}/rows", get(handlers::get_rows))
        .route("/metrics/{metric}/compare", get(handlers::get_comparison))
        .route("/metrics/{metric}/report", get(handlers::get_report))
        .route("/cache/stats", get(handlers::cache_stats))
        .route("/cache", delete(handlers::clear_cache))
        .route("/cache/{metric}", delete(handlers::invalidate_metric));

    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::TtlCache;
    use crate::clock::ManualClock;
    use crate::db::factory::RepositoryFactory;
    use crate::db::repositories::LocalRepository;
    use crate::models::{AggregatedRow, DataSource};
    use crate::services::ReportingFacade;
    use axum::body::{to_bytes, Body};
    use axum::http::{Method, Request, StatusCode};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::Value;
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn test_app() -> (Router, Arc<LocalRepository>) {
        let repo = RepositoryFactory::create_local();
        repo.insert_historical(
            "revenue",
            vec![AggregatedRow::new(d(2025, 11, 3), "ICU", "Intensive Care", dec!(100), dec!(2))],
        );
        repo.insert_live(
            "revenue",
            vec![AggregatedRow::new(d(2025, 11, 12), "ICU", "Intensive Care", dec!(50), dec!(1))],
        );
        let clock = Arc::new(ManualClock::new(d(2025, 11, 10)));
        let facade = ReportingFacade::new(
            RepositoryFactory::default_registry(&repo),
            Arc::new(TtlCache::with_clock(16, clock.clone())),
            clock,
            Duration::from_secs(60),
        );
        let state = AppState::new(facade, repo.clone());
        (create_router(state), repo)
    }

    async fn send(app: Router, method: Method, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap_or(Value::Null))
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _repo) = test_app();
        let (status, body) = send(app, Method::GET, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["repository"], "connected");
        assert_eq!(body["cutover"], "2025-11-10");
    }

    #[tokio::test]
    async fn test_list_metrics() {
        let (app, _repo) = test_app();
        let (status, body) = send(app, Method::GET, "/v1/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 3);
    }

    #[tokio::test]
    async fn test_rows_merge_both_sources() {
        let (app, _repo) = test_app();
        let (status, body) = send(
            app,
            Method::GET,
            "/v1/metrics/revenue/rows?start=2025-11-01&end=2025-11-15&departments=ICU",
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["rows"][0]["departmentCode"], "ICU");
    }

    #[tokio::test]
    async fn test_bad_dates_are_400() {
        let (app, _repo) = test_app();
        let (status, body) = send(
            app.clone(),
            Method::GET,
            "/v1/metrics/revenue/compare?start=2025-11-15&end=2025-11-01",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_WINDOW");

        let (status, body) = send(
            app,
            Method::GET,
            "/v1/metrics/revenue/compare?start=2025-02-30&end=2025-03-01",
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "INVALID_DATE");
    }

    #[tokio::test]
    async fn test_unknown_metric_is_404() {
        let (app, _repo) = test_app();
        let (status, body) = send(
            app,
            Method::GET,
            "/v1/metrics/beds/report?start=2025-11-01&end=2025-11-15",
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["code"], "UNKNOWN_METRIC");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_500() {
        let (app, repo) = test_app();
        repo.fail_source("revenue", DataSource::Historical, "warehouse unreachable");
        let (status, body) = send(
            app,
            Method::GET,
            "/v1/metrics/revenue/compare?start=2025-11-01&end=2025-11-15",
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["code"], "FETCH_FAILURE");
    }

    #[tokio::test]
    async fn test_cache_endpoints() {
        let (app, _repo) = test_app();
        let uri = "/v1/metrics/revenue/report?start=2025-11-01&end=2025-11-15";
        let (status, _) = send(app.clone(), Method::GET, uri).await;
        assert_eq!(status, StatusCode::OK);

        let (_, stats) = send(app.clone(), Method::GET, "/v1/cache/stats").await;
        assert_eq!(stats["size"], 2);

        let (status, body) = send(app.clone(), Method::DELETE, "/v1/cache/revenue").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], 2);

        let (status, _) = send(app.clone(), Method::DELETE, "/v1/cache/beds").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(app.clone(), Method::DELETE, "/v1/cache").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], 0);

        send(app.clone(), Method::GET, uri).await;
        let (status, body) = send(app, Method::DELETE, "/v1/cache").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["removed"], 2);
    }
}
