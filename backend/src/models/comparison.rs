use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::window::TimeWindow;

/// Direction label attached to a percentage change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Increase,
    Decrease,
    Stable,
    Unknown,
}

/// A ratio change (not multiplied by 100) and its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PctChange {
    pub ratio: Option<Decimal>,
    pub direction: Direction,
}

/// Windows used for one comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonWindows {
    pub current: TimeWindow,
    pub previous_period: TimeWindow,
    pub year_ago: TimeWindow,
}

/// Current value of a metric against its previous-period and year-ago
/// baselines.
///
/// A percentage is `None` exactly when its baseline is `None`; a zero
/// baseline yields `Some(0)` with [`Direction::Stable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub current: Decimal,
    pub previous_period: Option<Decimal>,
    pub year_ago: Option<Decimal>,
    pub mom_pct: Option<Decimal>,
    pub yoy_pct: Option<Decimal>,
    pub mom_direction: Direction,
    pub yoy_direction: Direction,
    pub windows: ComparisonWindows,
}
