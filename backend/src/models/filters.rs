//! Request filters and the grouping granularity they select.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Department and doctor filters of a report request.
///
/// `None` means "no filter". An empty set is normalized to `None` on
/// construction, matching how dashboards send an empty multi-select.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSet {
    #[serde(default)]
    departments: Option<BTreeSet<String>>,
    #[serde(default)]
    doctors: Option<BTreeSet<String>>,
}

impl FilterSet {
    /// No filters: every department and doctor.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new<D, P>(departments: Option<D>, doctors: Option<P>) -> Self
    where
        D: IntoIterator,
        D::Item: Into<String>,
        P: IntoIterator,
        P::Item: Into<String>,
    {
        Self {
            departments: departments.and_then(normalize),
            doctors: doctors.and_then(normalize),
        }
    }

    pub fn with_departments<I>(mut self, departments: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.departments = normalize(departments);
        self
    }

    pub fn with_doctors<I>(mut self, doctors: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        self.doctors = normalize(doctors);
        self
    }

    /// Parse comma-separated query-string lists. Blank items are dropped.
    pub fn from_csv(departments: Option<&str>, doctors: Option<&str>) -> Self {
        let split = |raw: &str| {
            raw.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect::<Vec<_>>()
        };
        Self::new(departments.map(split), doctors.map(split))
    }

    pub fn departments(&self) -> Option<&BTreeSet<String>> {
        self.departments.as_ref()
    }

    pub fn doctors(&self) -> Option<&BTreeSet<String>> {
        self.doctors.as_ref()
    }

    /// Whether a row with these attributes passes the filters.
    pub fn matches(&self, department_code: &str, doctor_id: Option<&str>) -> bool {
        let department_ok = self
            .departments
            .as_ref()
            .map_or(true, |set| set.contains(department_code));
        let doctor_ok = match (&self.doctors, doctor_id) {
            (None, _) => true,
            (Some(set), Some(id)) => set.contains(id),
            (Some(_), None) => false,
        };
        department_ok && doctor_ok
    }

    /// Grouping granularity selected by the active filters.
    ///
    /// A doctor filter wins over a department filter.
    pub fn grouping_level(&self) -> GroupingLevel {
        match (&self.departments, &self.doctors) {
            (_, Some(_)) => GroupingLevel::Doctor,
            (Some(_), None) => GroupingLevel::ItemClass,
            (None, None) => GroupingLevel::Department,
        }
    }
}

fn normalize<I>(items: I) -> Option<BTreeSet<String>>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let set: BTreeSet<String> = items.into_iter().map(Into::into).collect();
    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}

/// How finely aggregated rows are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingLevel {
    /// `(date, departmentCode)`
    Department,
    /// `(date, departmentCode, itemClass)`
    ItemClass,
    /// `(date, departmentCode, doctorId, itemClass)`
    Doctor,
}

/// Key rows are merged on. Unused columns are `None`.
///
/// Field order is the output sort order; `None` sorts before `Some`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupingKey {
    pub date: NaiveDate,
    pub department_code: String,
    pub doctor_id: Option<String>,
    pub item_class: Option<String>,
}
