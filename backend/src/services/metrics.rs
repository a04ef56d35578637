//! Metric selectors and the registry binding metrics to their fetchers.
//!
//! Every dashboard metric is a name, a pair of fetchers (one per data source)
//! and a selector that reduces merged rows to the headline number.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::db::repository::{HistoricalFetch, LiveFetch};
use crate::error::{ReportError, ReportResult};
use crate::models::AggregatedRow;

/// Reduces a row list to a single scalar.
///
/// An empty row list yields `None`: no data in the window is a missing
/// baseline, not a zero one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricSelector {
    /// Sum of `value` (revenue, cost).
    SumValue,
    /// Sum of `quantity` (admissions, visits).
    SumQuantity,
    /// Total value divided by total quantity (average cost per case).
    /// `None` when total quantity is zero.
    ValuePerQuantity,
}

impl MetricSelector {
    pub fn select(&self, rows: &[AggregatedRow]) -> Option<Decimal> {
        if rows.is_empty() {
            return None;
        }
        let total_value: Decimal = rows.iter().map(|row| row.value).sum();
        let total_quantity: Decimal = rows.iter().map(|row| row.quantity).sum();
        match self {
            MetricSelector::SumValue => Some(total_value),
            MetricSelector::SumQuantity => Some(total_quantity),
            MetricSelector::ValuePerQuantity => {
                if total_quantity.is_zero() {
                    None
                } else {
                    total_value.checked_div(total_quantity)
                }
            }
        }
    }
}

/// A reportable metric and the fetchers that serve it.
#[derive(Clone)]
pub struct MetricDefinition {
    pub name: String,
    pub selector: MetricSelector,
    pub historical: Arc<dyn HistoricalFetch>,
    pub live: Arc<dyn LiveFetch>,
}

impl MetricDefinition {
    pub fn new(
        name: impl Into<String>,
        selector: MetricSelector,
        historical: Arc<dyn HistoricalFetch>,
        live: Arc<dyn LiveFetch>,
    ) -> Self {
        Self {
            name: name.into(),
            selector,
            historical,
            live,
        }
    }
}

impl fmt::Debug for MetricDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MetricDefinition")
            .field("name", &self.name)
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

/// Name → definition map consulted by the facade.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    metrics: BTreeMap<String, MetricDefinition>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a metric, replacing any previous definition with that name.
    pub fn register(&mut self, definition: MetricDefinition) -> &mut Self {
        self.metrics.insert(definition.name.clone(), definition);
        self
    }

    pub fn get(&self, name: &str) -> ReportResult<&MetricDefinition> {
        self.metrics
            .get(name)
            .ok_or_else(|| ReportError::UnknownMetric(name.to_string()))
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.metrics.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::LocalRepository;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn row(value: Decimal, quantity: Decimal) -> AggregatedRow {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        AggregatedRow::new(date, "ICU", "ICU", value, quantity)
    }

    #[test]
    fn test_selectors() {
        let rows = vec![row(dec!(100), dec!(2)), row(dec!(50), dec!(1))];
        assert_eq!(MetricSelector::SumValue.select(&rows), Some(dec!(150)));
        assert_eq!(MetricSelector::SumQuantity.select(&rows), Some(dec!(3)));
        assert_eq!(MetricSelector::ValuePerQuantity.select(&rows), Some(dec!(50)));
    }

    #[test]
    fn test_empty_rows_are_missing() {
        assert_eq!(MetricSelector::SumValue.select(&[]), None);
        assert_eq!(MetricSelector::SumQuantity.select(&[]), None);
    }

    #[test]
    fn test_zero_quantity_ratio_is_missing() {
        let rows = vec![row(dec!(100), dec!(0))];
        assert_eq!(MetricSelector::ValuePerQuantity.select(&rows), None);
        assert_eq!(MetricSelector::SumValue.select(&rows), Some(dec!(100)));
    }

    #[test]
    fn test_registry_lookup() {
        let repo = LocalRepository::new();
        let source = Arc::new(repo.source("revenue"));
        let mut registry = MetricRegistry::new();
        registry.register(MetricDefinition::new(
            "revenue",
            MetricSelector::SumValue,
            source.clone(),
            source,
        ));

        assert_eq!(registry.names(), vec!["revenue".to_string()]);
        assert_eq!(registry.get("revenue").unwrap().selector, MetricSelector::SumValue);
        assert!(matches!(
            registry.get("beds"),
            Err(ReportError::UnknownMetric(name)) if name == "beds"
        ));
    }
}
