//! Period-over-period comparison.
//!
//! A comparison runs three independent aggregation passes (current window,
//! the same window one year earlier, and the equal-length window right
//! before it) and reduces each to a scalar with a [`MetricSelector`].
//! Either every pass succeeds or the whole comparison fails.

use log::{debug, warn};
use rust_decimal::Decimal;

use super::aggregator::WindowAggregate;
use super::metrics::MetricSelector;
use crate::error::ReportResult;
use crate::models::{ComparisonResult, ComparisonWindows, Direction, FilterSet, PctChange, TimeWindow};

/// Changes smaller than this ratio are reported as stable.
pub const STABLE_EPSILON: Decimal = Decimal::from_parts(1, 0, 0, false, 4);

/// Ratios are clamped to `[-MAX_RATIO, MAX_RATIO]` (±1000%).
pub const MAX_RATIO: Decimal = Decimal::TEN;

/// Percentage change of `current` against `base`, as a ratio.
///
/// - missing baseline: no ratio, [`Direction::Unknown`]
/// - zero baseline: ratio `0`, [`Direction::Stable`]
/// - otherwise `(current - base) / base`, clamped to `[-10, 10]`
pub fn pct_change(current: Decimal, base: Option<Decimal>) -> PctChange {
    let ratio = match base {
        None => None,
        Some(base) if base.is_zero() => Some(Decimal::ZERO),
        Some(base) => Some(clamped_ratio(current, base)),
    };
    PctChange {
        ratio,
        direction: classify_direction(ratio),
    }
}

fn clamped_ratio(current: Decimal, base: Decimal) -> Decimal {
    let raw = current
        .checked_sub(base)
        .and_then(|delta| delta.checked_div(base));

    match raw {
        Some(ratio) if ratio > MAX_RATIO => {
            warn!("clamping ratio {} to {}", ratio, MAX_RATIO);
            MAX_RATIO
        }
        Some(ratio) if ratio < -MAX_RATIO => {
            warn!("clamping ratio {} to {}", ratio, -MAX_RATIO);
            -MAX_RATIO
        }
        Some(ratio) => ratio,
        // Overflow only happens for ratios far outside the clamp range.
        None => {
            let positive = (current >= base) == base.is_sign_positive();
            warn!("ratio overflow for current={} base={}", current, base);
            if positive {
                MAX_RATIO
            } else {
                -MAX_RATIO
            }
        }
    }
}

/// Direction label for a ratio.
pub fn classify_direction(ratio: Option<Decimal>) -> Direction {
    match ratio {
        None => Direction::Unknown,
        Some(p) if p > STABLE_EPSILON => Direction::Increase,
        Some(p) if p < -STABLE_EPSILON => Direction::Decrease,
        Some(_) => Direction::Stable,
    }
}

/// Baseline windows for `window`.
pub fn comparison_windows(window: &TimeWindow) -> ReportResult<ComparisonWindows> {
    Ok(ComparisonWindows {
        current: *window,
        previous_period: window.previous_period()?,
        year_ago: window.year_ago()?,
    })
}

/// Computes [`ComparisonResult`]s. Stateless.
#[derive(Debug, Clone, Copy, Default)]
pub struct PeriodComparator;

impl PeriodComparator {
    pub fn new() -> Self {
        Self
    }

    /// Compare a metric in `window` against its baselines.
    ///
    /// The three passes run concurrently on the calling task; the first
    /// failure aborts the others and is returned unchanged.
    pub async fn compare<A>(
        &self,
        window: &TimeWindow,
        filters: &FilterSet,
        source: &A,
        selector: MetricSelector,
    ) -> ReportResult<ComparisonResult>
    where
        A: WindowAggregate + ?Sized,
    {
        let windows = comparison_windows(window)?;
        debug!(
            "comparing {} against previous {} and year-ago {}",
            windows.current, windows.previous_period, windows.year_ago
        );

        let (current_rows, previous_rows, year_ago_rows) = futures::try_join!(
            source.aggregate(&windows.current, filters),
            source.aggregate(&windows.previous_period, filters),
            source.aggregate(&windows.year_ago, filters),
        )?;

        let current = selector.select(&current_rows).unwrap_or(Decimal::ZERO);
        let previous_period = selector.select(&previous_rows);
        let year_ago = selector.select(&year_ago_rows);

        let mom = pct_change(current, previous_period);
        let yoy = pct_change(current, year_ago);

        Ok(ComparisonResult {
            current,
            previous_period,
            year_ago,
            mom_pct: mom.ratio,
            yoy_pct: yoy.ratio,
            mom_direction: mom.direction,
            yoy_direction: yoy.direction,
            windows,
        })
    }
}
