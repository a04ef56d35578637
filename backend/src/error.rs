//! Error type for reporting operations.

use chrono::NaiveDate;

use crate::db::repository::RepositoryError;

/// Result type for reporting operations
pub type ReportResult<T> = Result<T, ReportError>;

/// Errors surfaced by the reporting engine and facade.
///
/// Splitting, grouping and percentage math are total; the only runtime
/// failures come from fetchers and reach callers as [`ReportError::FetchFailure`]
/// with the original error as `source()`.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    /// Window with `start >= end`.
    #[error("Invalid window: start {start} must be before end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },

    /// Date text that is not `YYYY-MM-DD`, or a date outside the calendar range.
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// No metric registered under this name.
    #[error("Unknown metric: {0}")]
    UnknownMetric(String),

    /// A historical or live fetcher failed.
    #[error("Fetch failure: {0}")]
    FetchFailure(#[from] RepositoryError),
}

impl ReportError {
    /// Whether the error was caused by bad caller input.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidWindow { .. } | Self::InvalidDate(_) | Self::UnknownMetric(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_fetch_failure_keeps_source() {
        let err: ReportError = RepositoryError::timeout("live store timed out").into();
        assert!(!err.is_client_error());
        let source = err.source().expect("source");
        assert!(source.to_string().contains("live store timed out"));
    }

    #[test]
    fn test_client_errors() {
        assert!(ReportError::InvalidDate("x".into()).is_client_error());
        assert!(ReportError::UnknownMetric("x".into()).is_client_error());
    }
}
