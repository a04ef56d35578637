//! Dual-source aggregation.
//!
//! A request window is split at the cutover, each part is fetched from the
//! store that owns it, and the rows are merged by the grouping key chosen by
//! the active filters. Merging always sums; rows never overwrite each other.

use async_trait::async_trait;
use chrono::NaiveDate;
use log::debug;
use std::collections::BTreeMap;

use super::splitter::split;
use crate::db::repository::{HistoricalFetch, LiveFetch};
use crate::error::ReportResult;
use crate::models::{AggregatedRow, DataSource, FilterSet, GroupingKey, GroupingLevel, TimeWindow};

/// Anything that can produce the merged rows of one window.
///
/// The comparator is written against this trait so it can run any number of
/// passes without knowing where the rows come from.
#[async_trait]
pub trait WindowAggregate: Send + Sync {
    async fn aggregate(
        &self,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> ReportResult<Vec<AggregatedRow>>;
}

/// Merges historical and live rows for a window.
///
/// Holds only the cutover; create one per request.
#[derive(Debug, Clone, Copy)]
pub struct DualSourceAggregator {
    cutover: NaiveDate,
}

impl DualSourceAggregator {
    pub fn new(cutover: NaiveDate) -> Self {
        Self { cutover }
    }

    pub fn cutover(&self) -> NaiveDate {
        self.cutover
    }

    /// Fetch and merge rows for `window`.
    ///
    /// Fetcher errors are returned unchanged inside
    /// [`ReportError::FetchFailure`](crate::error::ReportError::FetchFailure).
    /// An empty result is not an error.
    pub async fn aggregate<H, L>(
        &self,
        window: &TimeWindow,
        filters: &FilterSet,
        historical: &H,
        live: &L,
    ) -> ReportResult<Vec<AggregatedRow>>
    where
        H: HistoricalFetch + ?Sized,
        L: LiveFetch + ?Sized,
    {
        let mut rows = Vec::new();
        for segment in split(window, self.cutover).segments() {
            let fetched = match segment.source {
                DataSource::Historical => historical.fetch_historical(&segment.window, filters).await?,
                DataSource::Live => live.fetch_live(&segment.window, filters).await?,
            };
            debug!(
                "{} segment {} returned {} rows",
                segment.source,
                segment.window,
                fetched.len()
            );
            rows.extend(fetched);
        }

        Ok(merge_rows(rows, filters.grouping_level()))
    }

    /// Bind a fetcher pair so the aggregator can be handed to the comparator.
    pub fn bind<'a, H, L>(&self, historical: &'a H, live: &'a L) -> BoundAggregator<'a, H, L>
    where
        H: HistoricalFetch + ?Sized,
        L: LiveFetch + ?Sized,
    {
        BoundAggregator {
            aggregator: *self,
            historical,
            live,
        }
    }
}

/// A [`DualSourceAggregator`] together with the fetchers of one metric.
pub struct BoundAggregator<'a, H: ?Sized, L: ?Sized> {
    aggregator: DualSourceAggregator,
    historical: &'a H,
    live: &'a L,
}

#[async_trait]
impl<'a, H, L> WindowAggregate for BoundAggregator<'a, H, L>
where
    H: HistoricalFetch + ?Sized,
    L: LiveFetch + ?Sized,
{
    async fn aggregate(
        &self,
        window: &TimeWindow,
        filters: &FilterSet,
    ) -> ReportResult<Vec<AggregatedRow>> {
        self.aggregator
            .aggregate(window, filters, self.historical, self.live)
            .await
    }
}

/// Sum rows sharing a grouping key and return them in key order.
///
/// The first row seen for a key supplies the display names. Columns that are
/// not part of the key are cleared so a merged row never claims a doctor or
/// item class it does not belong to.
pub fn merge_rows(rows: Vec<AggregatedRow>, level: GroupingLevel) -> Vec<AggregatedRow> {
    let mut groups: BTreeMap<GroupingKey, AggregatedRow> = BTreeMap::new();

    for row in rows {
        let key = row.grouping_key(level);
        match groups.get_mut(&key) {
            Some(merged) => {
                merged.value += row.value;
                merged.quantity += row.quantity;
            }
            None => {
                let merged = AggregatedRow {
                    date: key.date,
                    department_code: key.department_code.clone(),
                    department_name: row.department_name,
                    doctor_name: if key.doctor_id.is_some() {
                        row.doctor_name
                    } else {
                        None
                    },
                    doctor_id: key.doctor_id.clone(),
                    item_class: key.item_class.clone(),
                    value: row.value,
                    quantity: row.quantity,
                };
                groups.insert(key, merged);
            }
        }
    }

    groups.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{RepositoryError, RepositoryResult};
    use crate::error::ReportError;
    use rust_decimal_macros::dec;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 11, day).unwrap()
    }

    fn row(day: u32, dept: &str, value: rust_decimal::Decimal) -> AggregatedRow {
        AggregatedRow::new(d(day), dept, format!("{} dept", dept), value, dec!(1))
    }

    struct StaticHistorical(Vec<AggregatedRow>);
    struct StaticLive(Vec<AggregatedRow>);
    struct FailingLive;
    /// Ignores the requested window, like a store with overlapping refreshes.
    struct Unfiltered(Vec<AggregatedRow>);

    #[async_trait]
    impl HistoricalFetch for Unfiltered {
        async fn fetch_historical(
            &self,
            _window: &TimeWindow,
            _filters: &FilterSet,
        ) -> RepositoryResult<Vec<AggregatedRow>> {
            Ok(self.0.clone())
        }
    }

    #[async_trait]
    impl LiveFetch for Unfiltered {
        async fn fetch_live(
            &self,
            _window: &TimeWindow,
            _filters: &FilterSet,
        ) -> RepositoryResult<Vec<AggregatedRow>> {
            Ok(self.0.clone())
        }
    }

    #[async_trait]
    impl HistoricalFetch for StaticHistorical {
        async fn fetch_historical(
            &self,
            window: &TimeWindow,
            _filters: &FilterSet,
        ) -> RepositoryResult<Vec<AggregatedRow>> {
            Ok(self.0.iter().filter(|r| window.contains(r.date)).cloned().collect())
        }
    }

    #[async_trait]
    impl LiveFetch for StaticLive {
        async fn fetch_live(
            &self,
            window: &TimeWindow,
            _filters: &FilterSet,
        ) -> RepositoryResult<Vec<AggregatedRow>> {
            Ok(self.0.iter().filter(|r| window.contains(r.date)).cloned().collect())
        }
    }

    #[async_trait]
    impl LiveFetch for FailingLive {
        async fn fetch_live(
            &self,
            _window: &TimeWindow,
            _filters: &FilterSet,
        ) -> RepositoryResult<Vec<AggregatedRow>> {
            Err(RepositoryError::timeout("fact table timed out"))
        }
    }

    #[tokio::test]
    async fn test_overlapping_keys_are_summed() {
        // Both stores report day 9: the historical table was refreshed late
        // and the live table already holds the same day.
        let historical = Unfiltered(vec![row(9, "ICU", dec!(10))]);
        let live = Unfiltered(vec![row(9, "ICU", dec!(5))]);

        let window = TimeWindow::new(d(1), d(16)).unwrap();
        let rows = DualSourceAggregator::new(d(10))
            .aggregate(&window, &FilterSet::all(), &historical, &live)
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].value, dec!(15));
        assert_eq!(rows[0].quantity, dec!(2));
    }

    #[tokio::test]
    async fn test_aggregation_is_idempotent() {
        let historical = StaticHistorical(vec![
            row(3, "SURG", dec!(2)).with_item_class("drug"),
            row(3, "ICU", dec!(1)).with_item_class("exam"),
        ]);
        let live = StaticLive(vec![row(11, "ICU", dec!(8)).with_item_class("drug")]);

        let window = TimeWindow::new(d(1), d(16)).unwrap();
        let filters = FilterSet::all().with_departments(["ICU", "SURG"]);
        let aggregator = DualSourceAggregator::new(d(10));
        let first = aggregator.aggregate(&window, &filters, &historical, &live).await.unwrap();
        let second = aggregator.aggregate(&window, &filters, &historical, &live).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    #[tokio::test]
    async fn test_straddling_window_reads_both_sources() {
        let historical = StaticHistorical(vec![row(1, "ICU", dec!(3)), row(5, "ICU", dec!(4))]);
        let live = StaticLive(vec![row(12, "ICU", dec!(7)), row(20, "ICU", dec!(100))]);

        let window = TimeWindow::new(d(1), d(16)).unwrap();
        let rows = DualSourceAggregator::new(d(10))
            .aggregate(&window, &FilterSet::all(), &historical, &live)
            .await
            .unwrap();

        let values: Vec<_> = rows.iter().map(|r| (r.date, r.value)).collect();
        assert_eq!(
            values,
            vec![(d(1), dec!(3)), (d(5), dec!(4)), (d(12), dec!(7))]
        );
    }

    #[tokio::test]
    async fn test_no_data_is_empty_not_error() {
        let window = TimeWindow::new(d(20), d(25)).unwrap();
        let rows = DualSourceAggregator::new(d(10))
            .aggregate(&window, &FilterSet::all(), &StaticHistorical(vec![]), &StaticLive(vec![]))
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_error_propagates_unchanged() {
        let window = TimeWindow::new(d(1), d(16)).unwrap();
        let err = DualSourceAggregator::new(d(10))
            .aggregate(&window, &FilterSet::all(), &StaticHistorical(vec![]), &FailingLive)
            .await
            .unwrap_err();
        match err {
            ReportError::FetchFailure(inner) => assert!(inner.is_retryable()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_department_level_collapses_doctors_and_classes() {
        let rows = vec![
            row(1, "ICU", dec!(1)).with_doctor("D1", "Dr. A").with_item_class("drug"),
            row(1, "ICU", dec!(2)).with_doctor("D2", "Dr. B").with_item_class("exam"),
        ];
        let merged = merge_rows(rows, GroupingLevel::Department);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].value, dec!(3));
        assert_eq!(merged[0].doctor_id, None);
        assert_eq!(merged[0].doctor_name, None);
        assert_eq!(merged[0].item_class, None);
    }

    #[test]
    fn test_item_class_level_keeps_classes_apart() {
        let rows = vec![
            row(1, "ICU", dec!(1)).with_doctor("D1", "Dr. A").with_item_class("drug"),
            row(1, "ICU", dec!(2)).with_doctor("D2", "Dr. B").with_item_class("drug"),
            row(1, "ICU", dec!(4)).with_item_class("exam"),
        ];
        let merged = merge_rows(rows, GroupingLevel::ItemClass);
        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].item_class.as_deref(), Some("drug"));
        assert_eq!(merged[0].value, dec!(3));
        assert_eq!(merged[0].doctor_id, None);
        assert_eq!(merged[1].item_class.as_deref(), Some("exam"));
    }

    #[test]
    fn test_doctor_level_sort_order_nulls_first() {
        let rows = vec![
            row(2, "ICU", dec!(1)).with_doctor("D2", "Dr. B").with_item_class("drug"),
            row(1, "SURG", dec!(1)).with_doctor("D1", "Dr. A"),
            row(1, "ICU", dec!(1)).with_doctor("D1", "Dr. A").with_item_class("exam"),
            row(1, "ICU", dec!(1)).with_item_class("exam"),
            row(1, "ICU", dec!(1)).with_doctor("D1", "Dr. A"),
        ];
        let merged = merge_rows(rows, GroupingLevel::Doctor);
        let keys: Vec<_> = merged
            .iter()
            .map(|r| {
                (
                    r.date,
                    r.department_code.as_str(),
                    r.doctor_id.as_deref(),
                    r.item_class.as_deref(),
                )
            })
            .collect();
        assert_eq!(
            keys,
            vec![
                (d(1), "ICU", None, Some("exam")),
                (d(1), "ICU", Some("D1"), None),
                (d(1), "ICU", Some("D1"), Some("exam")),
                (d(1), "SURG", Some("D1"), None),
                (d(2), "ICU", Some("D2"), Some("drug")),
            ]
        );
        assert_eq!(merged[1].doctor_name.as_deref(), Some("Dr. A"));
    }

    #[test]
    fn test_first_seen_names_win() {
        let mut second = row(1, "ICU", dec!(2));
        second.department_name = "Renamed".to_string();
        let merged = merge_rows(vec![row(1, "ICU", dec!(1)), second], GroupingLevel::Department);
        assert_eq!(merged[0].department_name, "ICU dept");
    }
}
