//! Value objects shared by the reporting engine.
//!
//! Windows, filters and rows are immutable once built and passed by value or
//! shared reference; none of them needs locking.

pub mod comparison;
pub mod filters;
pub mod row;
pub mod segment;
pub mod window;

pub use comparison::{ComparisonResult, ComparisonWindows, Direction, PctChange};
pub use filters::{FilterSet, GroupingKey, GroupingLevel};
pub use row::AggregatedRow;
pub use segment::{DataSource, SourceSegment};
pub use window::{parse_date, shift_years_back, TimeWindow, DATE_FORMAT};
