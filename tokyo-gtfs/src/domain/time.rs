//! Service-day time handling.
//!
//! Source feeds provide times as "HH:MM" (sometimes "HH:MM:SS") wall-clock
//! strings. This module turns them into offsets from the service day's
//! midnight, handling trains and buses that run past midnight.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of seconds in one service day.
pub const SECONDS_PER_DAY: u32 = 86_400;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time: {reason}")]
pub struct TimeError {
    reason: &'static str,
}

impl TimeError {
    fn new(reason: &'static str) -> Self {
        Self { reason }
    }
}

/// Seconds since the midnight starting a service day.
///
/// Values of 24:00:00 and above denote next-day events and are never
/// clamped.
///
/// # Examples
///
/// ```
/// use tokyo_gtfs::domain::TimePoint;
///
/// let t = TimePoint::parse("25:10").unwrap();
/// assert_eq!(t.total_seconds(), 25 * 3600 + 600);
/// assert_eq!(t.to_string(), "25:10:00");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimePoint(u32);

impl TimePoint {
    /// Midnight at the start of the service day.
    pub const MIDNIGHT: TimePoint = TimePoint(0);

    /// Create a time point from a raw second count.
    pub const fn from_seconds(seconds: u32) -> Self {
        Self(seconds)
    }

    /// Create a time point from hours, minutes and seconds.
    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self(hours * 3600 + minutes * 60 + seconds)
    }

    /// Parse "H:MM", "HH:MM" or "HH:MM:SS".
    ///
    /// The hour may exceed 23.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokyo_gtfs::domain::TimePoint;
    ///
    /// assert!(TimePoint::parse("00:00").is_ok());
    /// assert!(TimePoint::parse("24:05:30").is_ok());
    /// assert!(TimePoint::parse("7:15").is_ok());
    ///
    /// assert!(TimePoint::parse("1430").is_err());
    /// assert!(TimePoint::parse("14:3").is_err());
    /// assert!(TimePoint::parse("14:60").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let mut parts = s.trim().split(':');

        let hours = parts
            .next()
            .filter(|h| !h.is_empty() && h.len() <= 3)
            .and_then(parse_digits)
            .ok_or_else(|| TimeError::new("invalid hour digits"))?;

        let minutes = parts
            .next()
            .filter(|m| m.len() == 2)
            .and_then(parse_digits)
            .ok_or_else(|| TimeError::new("expected HH:MM format"))?;
        if minutes > 59 {
            return Err(TimeError::new("minute must be 0-59"));
        }

        let seconds = match parts.next() {
            None => 0,
            Some(sec) => {
                let sec = Some(sec)
                    .filter(|s| s.len() == 2)
                    .and_then(parse_digits)
                    .ok_or_else(|| TimeError::new("invalid second digits"))?;
                if sec > 59 {
                    return Err(TimeError::new("second must be 0-59"));
                }
                sec
            }
        };

        if parts.next().is_some() {
            return Err(TimeError::new("too many components"));
        }

        Ok(Self::from_hms(hours, minutes, seconds))
    }

    /// Returns the number of seconds since service-day midnight.
    pub fn total_seconds(&self) -> u32 {
        self.0
    }

    /// Returns the hour, which may be 24 or more.
    pub fn hours(&self) -> u32 {
        self.0 / 3600
    }

    /// Returns the minute within the hour.
    pub fn minutes(&self) -> u32 {
        (self.0 % 3600) / 60
    }

    /// Returns the second within the minute.
    pub fn seconds(&self) -> u32 {
        self.0 % 60
    }

    /// The same wall-clock time one service day later.
    pub fn next_day(self) -> Self {
        Self(self.0 + SECONDS_PER_DAY)
    }
}

impl fmt::Debug for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TimePoint({self})")
    }
}

impl fmt::Display for TimePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}",
            self.hours(),
            self.minutes(),
            self.seconds()
        )
    }
}

/// Parse a run of ASCII digits into a u32.
fn parse_digits(s: &str) -> Option<u32> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Fill in a missing arrival or departure from its counterpart.
///
/// Returns `None` when both are missing, in which case the stop-time is
/// unusable.
pub fn fill_missing(
    arrival: Option<TimePoint>,
    departure: Option<TimePoint>,
) -> Option<(TimePoint, TimePoint)> {
    match (arrival, departure) {
        (Some(a), Some(d)) => Some((a, d)),
        (Some(a), None) => Some((a, a)),
        (None, Some(d)) => Some((d, d)),
        (None, None) => None,
    }
}

/// Apply midnight rollover to a sequence of (arrival, departure) pairs.
///
/// With `midnight_cutoff` set, a first arrival earlier than the cutoff is
/// moved to the next day before anything else happens. Afterwards each
/// arrival is pushed forward by whole days until it is not before the
/// previous departure, and each departure until it is not before its own
/// arrival. Times are only ever moved forward and entries keep their order.
///
/// # Examples
///
/// ```
/// use tokyo_gtfs::domain::{TimePoint, normalize_times};
///
/// let mut times = vec![
///     (TimePoint::parse("23:50").unwrap(), TimePoint::parse("23:55").unwrap()),
///     (TimePoint::parse("00:10").unwrap(), TimePoint::parse("00:12").unwrap()),
/// ];
/// normalize_times(&mut times, None);
/// assert_eq!(times[1].0.to_string(), "24:10:00");
/// assert_eq!(times[1].1.to_string(), "24:12:00");
/// ```
pub fn normalize_times(times: &mut [(TimePoint, TimePoint)], midnight_cutoff: Option<TimePoint>) {
    if let (Some(cutoff), Some(first)) = (midnight_cutoff, times.first_mut()) {
        if first.0 < cutoff {
            first.0 = first.0.next_day();
        }
    }

    let mut prev_departure = TimePoint::MIDNIGHT;
    for (arrival, departure) in times.iter_mut() {
        while *arrival < prev_departure {
            *arrival = arrival.next_day();
        }
        while *departure < *arrival {
            *departure = departure.next_day();
        }
        prev_departure = *departure;
    }
}
