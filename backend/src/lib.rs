//! # Ops Reporting Backend
//!
//! Reporting engine for hospital operations dashboards.
//!
//! Every metric is stored twice: a pre-aggregated historical store that is
//! complete up to (but not including) a cutover date, and a live fact store
//! for everything from the cutover on. This crate answers date-range queries
//! across both without double counting, compares periods, and caches results.
//!
//! ## Architecture
//!
//! - [`models`]: windows, filters, rows and comparison results
//! - [`services`]: range splitting, dual-source aggregation, period comparison
//!   and the [`services::ReportingFacade`]
//! - [`cache`]: bounded TTL cache with hit/miss statistics
//! - [`clock`]: injected time source for expiry and the cutover
//! - [`db`]: fetcher traits, repository errors and the in-memory repository
//! - [`config`]: TOML and environment configuration
//! - [`http`]: Axum-based HTTP server (feature `http-server`)
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use ops_reporting::services::split;
//! use ops_reporting::models::TimeWindow;
//!
//! let d = |m, day| NaiveDate::from_ymd_opt(2025, m, day).unwrap();
//! let window = TimeWindow::new(d(11, 1), d(11, 16)).unwrap();
//! let parts = split(&window, d(11, 10));
//! assert_eq!(parts.historical.unwrap().end(), d(11, 10));
//! assert_eq!(parts.live.unwrap().start(), d(11, 10));
//! ```

// RepositoryError carries a structured context for debugging.
#![allow(clippy::result_large_err)]

pub mod cache;
pub mod clock;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{ReportError, ReportResult};
