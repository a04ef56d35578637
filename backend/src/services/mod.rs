//! Service layer: the reporting engine.
//!
//! Sits between the repository fetchers and the HTTP layer. The splitter and
//! aggregator turn a window into merged rows, the comparator turns rows into
//! period-over-period changes, and the facade adds metric lookup and caching.

pub mod aggregator;
pub mod comparator;
pub mod facade;
pub mod metrics;
pub mod splitter;

pub use aggregator::{merge_rows, BoundAggregator, DualSourceAggregator, WindowAggregate};
pub use comparator::{classify_direction, comparison_windows, pct_change, PeriodComparator};
pub use facade::{CachedReport, MetricReport, ReportingFacade};
pub use metrics::{MetricDefinition, MetricRegistry, MetricSelector};
pub use splitter::{split, SplitWindow};
