//! Service-day resolution.
//!
//! Turns the symbolic calendars referenced by trains into concrete sets
//! of active dates per exported service.

mod holidays;
mod resolver;

pub use holidays::{HolidaySet, merge_sunday_into_holiday};
pub use resolver::{CalendarError, CalendarResolver, DateRange};
