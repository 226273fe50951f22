//! Calendar types.
//!
//! Trains reference calendars by name. A handful of names are builtin
//! weekly patterns. Everything else is a "specific" calendar that lists
//! its active dates.

use std::collections::{BTreeSet, HashSet};
use std::fmt;

use chrono::{Datelike, NaiveDate, Weekday};

/// One of the fixed weekly calendars shared by all operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BuiltinCalendar {
    Everyday,
    Weekday,
    SaturdayHoliday,
    Holiday,
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl BuiltinCalendar {
    /// All builtin calendars.
    pub const ALL: [BuiltinCalendar; 11] = [
        BuiltinCalendar::Everyday,
        BuiltinCalendar::Weekday,
        BuiltinCalendar::SaturdayHoliday,
        BuiltinCalendar::Holiday,
        BuiltinCalendar::Monday,
        BuiltinCalendar::Tuesday,
        BuiltinCalendar::Wednesday,
        BuiltinCalendar::Thursday,
        BuiltinCalendar::Friday,
        BuiltinCalendar::Saturday,
        BuiltinCalendar::Sunday,
    ];

    /// Look up a builtin calendar by its id.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokyo_gtfs::domain::BuiltinCalendar;
    ///
    /// assert_eq!(BuiltinCalendar::parse("SaturdayHoliday"), Some(BuiltinCalendar::SaturdayHoliday));
    /// assert_eq!(BuiltinCalendar::parse("Specific.Toei.NewYear"), None);
    /// ```
    pub fn parse(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == id)
    }

    /// The calendar id.
    pub fn as_str(self) -> &'static str {
        match self {
            BuiltinCalendar::Everyday => "Everyday",
            BuiltinCalendar::Weekday => "Weekday",
            BuiltinCalendar::SaturdayHoliday => "SaturdayHoliday",
            BuiltinCalendar::Holiday => "Holiday",
            BuiltinCalendar::Monday => "Monday",
            BuiltinCalendar::Tuesday => "Tuesday",
            BuiltinCalendar::Wednesday => "Wednesday",
            BuiltinCalendar::Thursday => "Thursday",
            BuiltinCalendar::Friday => "Friday",
            BuiltinCalendar::Saturday => "Saturday",
            BuiltinCalendar::Sunday => "Sunday",
        }
    }

    /// Weekly bitmask, Monday in bit 0 through Sunday in bit 6.
    ///
    /// Holidays count as Sundays.
    pub fn weekday_mask(self) -> u8 {
        match self {
            BuiltinCalendar::Everyday => 0b111_1111,
            BuiltinCalendar::Weekday => 0b001_1111,
            BuiltinCalendar::SaturdayHoliday => 0b110_0000,
            BuiltinCalendar::Holiday | BuiltinCalendar::Sunday => 0b100_0000,
            BuiltinCalendar::Monday => 0b000_0001,
            BuiltinCalendar::Tuesday => 0b000_0010,
            BuiltinCalendar::Wednesday => 0b000_0100,
            BuiltinCalendar::Thursday => 0b000_1000,
            BuiltinCalendar::Friday => 0b001_0000,
            BuiltinCalendar::Saturday => 0b010_0000,
        }
    }

    /// Builtin calendars that may be active in a day bucket, most specific
    /// first.
    ///
    /// When a route uses several builtins, the first one listed here wins.
    pub fn priority(bucket: DayBucket) -> &'static [BuiltinCalendar] {
        use BuiltinCalendar as C;

        match bucket {
            DayBucket::Weekday(Weekday::Mon) => &[C::Monday, C::Weekday, C::Everyday],
            DayBucket::Weekday(Weekday::Tue) => &[C::Tuesday, C::Weekday, C::Everyday],
            DayBucket::Weekday(Weekday::Wed) => &[C::Wednesday, C::Weekday, C::Everyday],
            DayBucket::Weekday(Weekday::Thu) => &[C::Thursday, C::Weekday, C::Everyday],
            DayBucket::Weekday(Weekday::Fri) => &[C::Friday, C::Weekday, C::Everyday],
            DayBucket::Weekday(Weekday::Sat) => &[C::Saturday, C::SaturdayHoliday, C::Everyday],
            DayBucket::Weekday(Weekday::Sun) => {
                &[C::Sunday, C::Holiday, C::SaturdayHoliday, C::Everyday]
            }
            DayBucket::Holiday => &[C::Holiday, C::SaturdayHoliday, C::Everyday],
        }
    }
}

impl fmt::Display for BuiltinCalendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which priority list applies to a date.
///
/// National holidays override the true day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayBucket {
    Weekday(Weekday),
    Holiday,
}

impl DayBucket {
    /// Classify a date.
    pub fn of(date: NaiveDate, holidays: &HashSet<NaiveDate>) -> Self {
        if holidays.contains(&date) {
            DayBucket::Holiday
        } else {
            DayBucket::Weekday(date.weekday())
        }
    }

    /// Bit of this bucket in [`BuiltinCalendar::weekday_mask`].
    pub fn mask_bit(self) -> u8 {
        match self {
            DayBucket::Weekday(day) => 1 << day.num_days_from_monday(),
            DayBucket::Holiday => 1 << 6,
        }
    }
}

/// How a calendar decides its active days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarKind {
    /// A builtin weekly pattern.
    Builtin(BuiltinCalendar),
    /// An explicit list of dates.
    Specific(BTreeSet<NaiveDate>),
}

/// A calendar declared by a source feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    pub id: String,
    pub kind: CalendarKind,
}

impl Calendar {
    /// A builtin calendar.
    pub fn builtin(builtin: BuiltinCalendar) -> Self {
        Self {
            id: builtin.as_str().to_string(),
            kind: CalendarKind::Builtin(builtin),
        }
    }

    /// A calendar declared by id with the given explicit dates.
    ///
    /// Builtin ids always produce a builtin calendar, whatever dates the
    /// source listed.
    pub fn from_source(id: impl Into<String>, days: impl IntoIterator<Item = NaiveDate>) -> Self {
        let id = id.into();
        let kind = match BuiltinCalendar::parse(&id) {
            Some(builtin) => CalendarKind::Builtin(builtin),
            None => CalendarKind::Specific(days.into_iter().collect()),
        };
        Self { id, kind }
    }

    /// Whether this calendar, considered on its own, runs on a date.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::collections::HashSet;
    /// use chrono::NaiveDate;
    /// use tokyo_gtfs::domain::{BuiltinCalendar, Calendar};
    ///
    /// let tuesday = NaiveDate::from_ymd_opt(2024, 9, 17).unwrap();
    /// let weekday = Calendar::builtin(BuiltinCalendar::Weekday);
    /// assert!(weekday.is_active(tuesday, &HashSet::new()));
    /// assert!(!weekday.is_active(tuesday, &HashSet::from([tuesday])));
    /// ```
    pub fn is_active(&self, date: NaiveDate, holidays: &HashSet<NaiveDate>) -> bool {
        match &self.kind {
            CalendarKind::Builtin(builtin) => {
                builtin.weekday_mask() & DayBucket::of(date, holidays).mask_bit() != 0
            }
            CalendarKind::Specific(days) => days.contains(&date),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_roundtrips_all_builtins() {
        for builtin in BuiltinCalendar::ALL {
            assert_eq!(BuiltinCalendar::parse(builtin.as_str()), Some(builtin));
        }
        assert_eq!(BuiltinCalendar::parse("weekday"), None);
    }

    #[test]
    fn priority_lists_only_matching_calendars() {
        let buckets = [
            DayBucket::Weekday(Weekday::Mon),
            DayBucket::Weekday(Weekday::Tue),
            DayBucket::Weekday(Weekday::Wed),
            DayBucket::Weekday(Weekday::Thu),
            DayBucket::Weekday(Weekday::Fri),
            DayBucket::Weekday(Weekday::Sat),
            DayBucket::Weekday(Weekday::Sun),
            DayBucket::Holiday,
        ];
        for bucket in buckets {
            for builtin in BuiltinCalendar::priority(bucket) {
                assert_ne!(
                    builtin.weekday_mask() & bucket.mask_bit(),
                    0,
                    "{builtin} listed for {bucket:?}"
                );
            }
        }
    }

    #[test]
    fn holiday_overrides_weekday() {
        let holiday = date(2024, 9, 23); // Monday
        let holidays = HashSet::from([holiday]);
        assert_eq!(DayBucket::of(holiday, &holidays), DayBucket::Holiday);
        assert_eq!(
            DayBucket::of(date(2024, 9, 24), &holidays),
            DayBucket::Weekday(Weekday::Tue)
        );
    }

    #[test]
    fn from_source_recognises_builtins() {
        let cal = Calendar::from_source("Holiday", [date(2024, 1, 1)]);
        assert_eq!(cal.kind, CalendarKind::Builtin(BuiltinCalendar::Holiday));

        let cal = Calendar::from_source("Specific.Toei.Event", [date(2024, 1, 1)]);
        assert!(matches!(cal.kind, CalendarKind::Specific(ref d) if d.len() == 1));
    }

    #[test]
    fn specific_calendar_activity() {
        let cal = Calendar::from_source("Specific.X", [date(2024, 5, 3)]);
        assert!(cal.is_active(date(2024, 5, 3), &HashSet::new()));
        assert!(!cal.is_active(date(2024, 5, 4), &HashSet::new()));
    }
}
