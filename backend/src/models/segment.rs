use serde::{Deserialize, Serialize};
use std::fmt;

use super::window::TimeWindow;

/// Which store a segment of a window is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Pre-aggregated rows strictly before the cutover.
    Historical,
    /// Fact rows on or after the cutover.
    Live,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Historical => write!(f, "historical"),
            DataSource::Live => write!(f, "live"),
        }
    }
}

/// Part of a requested window bound to the store that serves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSegment {
    pub window: TimeWindow,
    pub source: DataSource,
}
