//! Fetcher traits for the two data sources behind every metric.
//!
//! The relational query layer implements these per metric. Historical
//! fetchers read pre-aggregated tables and are only ever called with windows
//! that end on or before the cutover; live fetchers read fact tables and are
//! only called with windows that start on or after it. Both return rows
//! already normalized to [`AggregatedRow`].
//!
//! # Thread Safety
//! Implementations must be `Send + Sync`; one instance is shared by every
//! request that reports on its metric.

pub mod error;

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::{AggregatedRow, FilterSet, TimeWindow};

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

/// Reads a metric from the pre-aggregated historical store.
#[async_trait]
pub trait HistoricalFetch: Send + Sync {
    /// Rows whose date falls inside `window` and which pass `filters`.
    async fn fetch_historical(
        &self,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> RepositoryResult<Vec<AggregatedRow>>;
}

/// Reads a metric from the live fact store.
#[async_trait]
pub trait LiveFetch: Send + Sync {
    /// Rows whose date falls inside `window` and which pass `filters`.
    async fn fetch_live(
        &self,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> RepositoryResult<Vec<AggregatedRow>>;
}

#[async_trait]
impl<T: HistoricalFetch + ?Sized> HistoricalFetch for Arc<T> {
    async fn fetch_historical(
        &self,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> RepositoryResult<Vec<AggregatedRow>> {
        (**self).fetch_historical(window, filters).await
    }
}

#[async_trait]
impl<T: LiveFetch + ?Sized> LiveFetch for Arc<T> {
    async fn fetch_live(
        &self,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> RepositoryResult<Vec<AggregatedRow>> {
        (**self).fetch_live(window, filters).await
    }
}

/// Health probe for the backing store.
#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// `Ok(false)` when the store is reachable but reports itself unhealthy.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
