use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::filters::{GroupingKey, GroupingLevel};

/// One aggregated measurement in the shape shared by both data sources.
///
/// Fetchers normalize their source-specific columns into this shape.
/// `value` and `quantity` are non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRow {
    pub date: NaiveDate,
    pub department_code: String,
    pub department_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doctor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_class: Option<String>,
    pub value: Decimal,
    pub quantity: Decimal,
}

impl AggregatedRow {
    /// Department-level row without doctor or item class.
    pub fn new(
        date: NaiveDate,
        department_code: impl Into<String>,
        department_name: impl Into<String>,
        value: Decimal,
        quantity: Decimal,
    ) -> Self {
        Self {
            date,
            department_code: department_code.into(),
            department_name: department_name.into(),
            doctor_id: None,
            doctor_name: None,
            item_class: None,
            value,
            quantity,
        }
    }

    pub fn with_doctor(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.doctor_id = Some(id.into());
        self.doctor_name = Some(name.into());
        self
    }

    pub fn with_item_class(mut self, item_class: impl Into<String>) -> Self {
        self.item_class = Some(item_class.into());
        self
    }

    /// Project this row onto the grouping key for `level`.
    pub fn grouping_key(&self, level: GroupingLevel) -> GroupingKey {
        let (doctor_id, item_class) = match level {
            GroupingLevel::Department => (None, None),
            GroupingLevel::ItemClass => (None, self.item_class.clone()),
            GroupingLevel::Doctor => (self.doctor_id.clone(), self.item_class.clone()),
        };
        GroupingKey {
            date: self.date,
            department_code: self.department_code.clone(),
            doctor_id,
            item_class,
        }
    }
}
