//! National holidays and the Sunday/Holiday calendar merge.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::domain::{BuiltinCalendar, Train};

use super::DateRange;

/// Dates treated as national holidays.
///
/// Sourced externally (the Cabinet Office list or similar) and passed in
/// through configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidaySet {
    dates: HashSet<NaiveDate>,
}

impl HolidaySet {
    /// Build a set from a list of dates.
    pub fn new(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        Self {
            dates: dates.into_iter().collect(),
        }
    }

    /// Keep only holidays inside a date range.
    pub fn within(&self, range: &DateRange) -> Self {
        Self {
            dates: self
                .dates
                .iter()
                .copied()
                .filter(|d| range.contains(*d))
                .collect(),
        }
    }

    /// Whether a date is a holiday.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    /// Number of holidays.
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    /// Returns true if there are no holidays.
    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// The underlying dates.
    pub fn as_set(&self) -> &HashSet<NaiveDate> {
        &self.dates
    }

    pub fn into_set(self) -> HashSet<NaiveDate> {
        self.dates
    }
}

/// Fold `Sunday` into `Holiday` when a dataset uses both.
///
/// `Holiday` already covers every Sunday, so keeping both would only
/// produce two services with overlapping days. Returns the number of
/// trains moved.
pub fn merge_sunday_into_holiday(trains: &mut [Train]) -> usize {
    let sunday = BuiltinCalendar::Sunday.as_str();
    let holiday = BuiltinCalendar::Holiday.as_str();

    let uses_sunday = trains.iter().any(|t| t.calendar == sunday);
    let uses_holiday = trains.iter().any(|t| t.calendar == holiday);
    if !(uses_sunday && uses_holiday) {
        return 0;
    }

    let mut moved = 0;
    for train in trains.iter_mut().filter(|t| t.calendar == sunday) {
        train.calendar = holiday.to_string();
        moved += 1;
    }

    debug!(moved, "merged Sunday calendar into Holiday");
    moved
}
