//! Domain types for the GTFS conversion.
//!
//! These are the canonical records every provider produces: trains with
//! normalized stop-times, stations, calendars and multi-language names.
//! Nothing in here knows about a particular source format.

mod calendar;
mod ids;
mod names;
mod station;
mod time;
mod train;

pub use calendar::{BuiltinCalendar, Calendar, CalendarKind, DayBucket};
pub use ids::{first_part, last_part, same_stop, station_stem, strip_prefix};
pub use names::{Language, Names};
pub use station::{Line, Station, TrainType};
pub use time::{SECONDS_PER_DAY, TimeError, TimePoint, fill_missing, normalize_times};
pub use train::{
    PickupType, StopTime, StopTimeDraft, Train, normalize_stop_times, prepend_number,
};
