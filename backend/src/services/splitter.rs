//! Temporal range splitting across the historical/live cutover.
//!
//! The splitter never reads the clock. Callers pass the cutover explicitly,
//! which keeps the function pure and lets tests pin any date.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{DataSource, SourceSegment, TimeWindow};

/// Historical and live parts of a window. At least one is always present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SplitWindow {
    pub historical: Option<TimeWindow>,
    pub live: Option<TimeWindow>,
}

impl SplitWindow {
    /// Non-empty segments in chronological order.
    pub fn segments(&self) -> Vec<SourceSegment> {
        let historical = self.historical.map(|window| SourceSegment {
            window,
            source: DataSource::Historical,
        });
        let live = self.live.map(|window| SourceSegment {
            window,
            source: DataSource::Live,
        });
        historical.into_iter().chain(live).collect()
    }
}

/// Split `window` at `cutover`.
///
/// `historical = [start, min(end, cutover))` and
/// `live = [max(start, cutover), end)`, each omitted when empty. Together they
/// cover `window` exactly, without overlap, wherever the cutover falls.
pub fn split(window: &TimeWindow, cutover: NaiveDate) -> SplitWindow {
    let historical = TimeWindow::new(window.start(), window.end().min(cutover)).ok();
    let live = TimeWindow::new(window.start().max(cutover), window.end()).ok();
    SplitWindow { historical, live }
}
