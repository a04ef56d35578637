//! Data access for the reporting engine.
//!
//! Every metric is served by two fetchers, one per data source:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Reporting facade / aggregator (services)    │
//! └───────────────┬──────────────────────────────┘
//!                 │  HistoricalFetch / LiveFetch
//!     ┌───────────▼───────────┐
//!     │  repository (traits)  │
//!     └───────────┬───────────┘
//!                 │
//!     ┌───────────▼───────────┐
//!     │  repositories::local  │  in-memory tables
//!     └───────────────────────┘
//! ```
//!
//! The factory builds the configured repository and the default metric
//! registry on top of it.

#[cfg(not(feature = "local-repo"))]
compile_error!("Enable at least one repository backend feature.");

pub mod factory;
pub mod repositories;
pub mod repository;

pub use factory::{RepositoryFactory, RepositoryType, DEFAULT_METRICS};
pub use repositories::{FetchCall, LocalMetricSource, LocalRepository};
pub use repository::{
    ErrorContext, HealthCheck, HistoricalFetch, LiveFetch, RepositoryError, RepositoryResult,
};
