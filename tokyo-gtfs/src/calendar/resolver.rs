//! Calendar resolution for exported services.
//!
//! A route may reference several calendar names (say `Weekday`,
//! `Saturday` and `SaturdayHoliday`), but on any given date only one of
//! them may be active. The resolver remembers which calendars each route
//! uses and, per date, picks the single winning builtin by priority, or
//! the route's specific calendars when one covers that date.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::domain::{BuiltinCalendar, Calendar, CalendarKind, DayBucket, first_part};

use super::HolidaySet;

/// Errors building a resolver.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CalendarError {
    /// The range ends before it starts.
    #[error("date range ends ({end}) before it starts ({start})")]
    InvertedRange { start: NaiveDate, end: NaiveDate },
}

/// An inclusive range of service dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Create a range covering `start..=end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CalendarError> {
        if end < start {
            return Err(CalendarError::InvertedRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// A range of `days` days starting at `start`, both ends inclusive.
    pub fn starting(start: NaiveDate, days: u32) -> Self {
        let end = start
            .checked_add_days(chrono::Days::new(days.into()))
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether a date falls inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every date in the range, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start.iter_days().take_while(|d| *d <= self.end)
    }
}

/// Decides which (route, calendar) services run on which dates.
#[derive(Debug, Clone)]
pub struct CalendarResolver {
    range: DateRange,
    holidays: HashSet<NaiveDate>,
    valid: HashSet<String>,
    /// Specific calendars active on each date.
    special: BTreeMap<NaiveDate, BTreeSet<String>>,
    /// Calendars used by each route.
    used: BTreeMap<String, BTreeSet<String>>,
    /// Trips refused because of an invalid calendar, by agency.
    removed: BTreeMap<String, usize>,
}

impl CalendarResolver {
    /// Create a resolver for a date range.
    pub fn new(range: DateRange, holidays: &HolidaySet) -> Self {
        Self {
            range,
            holidays: holidays.within(&range).into_set(),
            valid: BuiltinCalendar::ALL
                .iter()
                .map(|c| c.as_str().to_string())
                .collect(),
            special: BTreeMap::new(),
            used: BTreeMap::new(),
            removed: BTreeMap::new(),
        }
    }

    /// The date range services are resolved for.
    pub fn range(&self) -> &DateRange {
        &self.range
    }

    /// Register the calendars declared by a source.
    ///
    /// Builtins are always valid. A specific calendar is valid only if at
    /// least one of its dates falls inside the range.
    pub fn load_valid<'a>(&mut self, calendars: impl IntoIterator<Item = &'a Calendar>) {
        let range = self.range;
        for calendar in calendars {
            match &calendar.kind {
                CalendarKind::Builtin(_) => {
                    self.valid.insert(calendar.id.clone());
                }
                CalendarKind::Specific(days) if days.is_empty() => {
                    warn!(calendar = %calendar.id, "calendar is not builtin and has no specific days");
                }
                CalendarKind::Specific(days) => {
                    let mut in_range = days.iter().filter(|d| range.contains(**d)).peekable();
                    if in_range.peek().is_none() {
                        debug!(calendar = %calendar.id, "specific calendar has no days in range");
                        continue;
                    }

                    for day in in_range {
                        self.special
                            .entry(*day)
                            .or_default()
                            .insert(calendar.id.clone());
                    }
                    self.valid.insert(calendar.id.clone());
                }
            }
        }
    }

    /// Whether a calendar id may be referenced by trips.
    pub fn is_valid(&self, calendar: &str) -> bool {
        self.valid.contains(calendar)
    }

    /// Claim a (route, calendar) pair for an exported trip.
    ///
    /// Returns the GTFS service id `"{route}.{calendar}"`, or `None` when
    /// the calendar is invalid. Refusals are counted against the route's
    /// agency.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::NaiveDate;
    /// use tokyo_gtfs::calendar::{CalendarResolver, DateRange, HolidaySet};
    ///
    /// let start = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
    /// let mut resolver = CalendarResolver::new(DateRange::starting(start, 30), &HolidaySet::default());
    ///
    /// assert_eq!(resolver.service_for("Toei.Oedo", "Weekday").as_deref(), Some("Toei.Oedo.Weekday"));
    /// assert_eq!(resolver.service_for("Toei.Oedo", "Specific.Unknown"), None);
    /// assert_eq!(resolver.removed_by_agency().get("Toei"), Some(&1));
    /// ```
    pub fn service_for(&mut self, route: &str, calendar: &str) -> Option<String> {
        if !self.valid.contains(calendar) {
            *self.removed.entry(first_part(route).to_string()).or_default() += 1;
            return None;
        }

        self.used
            .entry(route.to_string())
            .or_default()
            .insert(calendar.to_string());
        Some(service_id(route, calendar))
    }

    /// Trips refused by [`CalendarResolver::service_for`], by agency.
    pub fn removed_by_agency(&self) -> &BTreeMap<String, usize> {
        &self.removed
    }

    /// Calendars active for a route on a date.
    ///
    /// Specific calendars used by the route take complete precedence over
    /// builtins. Otherwise the first builtin in the day's priority list
    /// that the route uses wins.
    pub fn active_on(&self, route: &str, date: NaiveDate) -> Vec<&str> {
        let Some(used) = self.used.get(route) else {
            return Vec::new();
        };

        if let Some(special) = self.special.get(&date) {
            let matching: Vec<&str> = special
                .iter()
                .filter(|id| used.contains(*id))
                .map(String::as_str)
                .collect();
            if !matching.is_empty() {
                return matching;
            }
        }

        BuiltinCalendar::priority(DayBucket::of(date, &self.holidays))
            .iter()
            .find(|builtin| used.contains(builtin.as_str()))
            .map(|builtin| vec![builtin.as_str()])
            .unwrap_or_default()
    }

    /// Active dates of every used service, keyed by service id.
    pub fn service_dates(&self) -> BTreeMap<String, Vec<NaiveDate>> {
        let mut dates: BTreeMap<String, Vec<NaiveDate>> = BTreeMap::new();

        for route in self.used.keys() {
            for day in self.range.days() {
                for calendar in self.active_on(route, day) {
                    dates
                        .entry(service_id(route, calendar))
                        .or_default()
                        .push(day);
                }
            }
        }

        dates
    }
}

/// GTFS service id of a (route, calendar) pair.
pub(crate) fn service_id(route: &str, calendar: &str) -> String {
    format!("{route}.{calendar}")
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    prop_compose! {
        fn arb_used_calendars()(picks in prop::collection::vec(0usize..BuiltinCalendar::ALL.len(), 1..6))
            -> Vec<BuiltinCalendar> {
            picks.into_iter().map(|i| BuiltinCalendar::ALL[i]).collect()
        }
    }

    proptest! {
        #[test]
        fn at_most_one_builtin_per_day(
            used in arb_used_calendars(),
            holiday_offsets in prop::collection::vec(0u64..28, 0..5),
        ) {
            let start = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
            let range = DateRange::starting(start, 27);
            let holidays = HolidaySet::new(
                holiday_offsets.iter().map(|o| start + chrono::Days::new(*o)),
            );
            let mut r = CalendarResolver::new(range, &holidays);
            for cal in &used {
                r.service_for("R", cal.as_str());
            }

            for day in range.days() {
                prop_assert!(r.active_on("R", day).len() <= 1);
            }
        }
    }
}
