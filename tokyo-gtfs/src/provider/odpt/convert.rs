//! Conversion from ODPT records to domain types.

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::{
    Calendar, Line, Names, Station, StopTimeDraft, TimePoint, Train, TrainType,
    normalize_stop_times, strip_prefix,
};
use crate::provider::{ConversionError, OneOrMany};

use super::types::{
    CalendarRecord, RailwayRecord, StationRecord, TrainTimetable, TrainTypeRecord,
};

/// Convert one timetable into a train.
///
/// ODPT rail has no midnight flag, so times are only rolled over when they
/// run backwards.
pub fn convert_train(record: &TrainTimetable) -> Result<Train, ConversionError> {
    let id = strip_prefix(&record.same_as).to_string();
    let mut train = Train::new(
        id.clone(),
        strip_prefix(&record.railway),
        strip_prefix(&record.calendar),
    );

    train.number = record.train_number.clone();
    train.names = record
        .train_name
        .clone()
        .and_then(|names| first_name(&id, names.into_vec()));
    train.train_type = record.train_type.as_deref().map(stripped);
    train.direction = record.rail_direction.as_deref().map(stripped);
    train.realtime_id = record.train.as_deref().map(stripped);
    train.destinations = strip_all(record.destination_station.clone()).unwrap_or_default();
    train.origins = strip_all(record.origin_station.clone());
    train.previous = strip_all(record.previous_train_timetable.clone());
    train.next = strip_all(record.next_train_timetable.clone());

    let drafts = record
        .timetable
        .iter()
        .enumerate()
        .filter_map(|(idx, object)| {
            let Some(station) = object
                .arrival_station
                .as_deref()
                .or(object.departure_station.as_deref())
            else {
                warn!(train = %id, index = idx, "timetable object without a station");
                return None;
            };

            let (arrival, departure) = parse_times(
                &id,
                idx,
                object.arrival_time.as_deref(),
                object.departure_time.as_deref(),
            )?;

            let mut draft = StopTimeDraft::new(strip_prefix(station), arrival, departure);
            draft.platform = object.platform_number.clone();
            Some(draft)
        })
        .collect();

    train.stop_times = normalize_stop_times(&id, drafts, None);
    if train.stop_times.is_empty() {
        return Err(ConversionError::NoStopTimes);
    }
    Ok(train)
}

pub fn convert_station(record: &StationRecord) -> Station {
    let mut station = Station::new(
        strip_prefix(&record.same_as),
        record.station_title.clone().unwrap_or_default(),
    );
    station.lat = record.lat.unwrap_or(0.0);
    station.lon = record.long.unwrap_or(0.0);
    station.code = record.station_code.clone();
    station
}

/// Convert a calendar. Builtin ids ignore any listed days.
pub fn convert_calendar(record: &CalendarRecord) -> Result<Calendar, ConversionError> {
    let days = record
        .day
        .iter()
        .map(|day| {
            NaiveDate::parse_from_str(day, "%Y-%m-%d")
                .map_err(|_| ConversionError::InvalidDate(day.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Calendar::from_source(strip_prefix(&record.same_as), days))
}

/// Whether the calendar lists explicit days, as opposed to a weekly pattern.
pub fn is_specific(record: &CalendarRecord) -> bool {
    strip_prefix(&record.same_as).starts_with("Specific")
}

/// Operator owning a specific calendar.
///
/// Falls back to the second part of the id, as in
/// `Specific.Toei.Oedo.Day1`.
pub fn calendar_agency(record: &CalendarRecord) -> Option<&str> {
    match &record.operator {
        Some(operator) => Some(strip_prefix(operator)),
        None => strip_prefix(&record.same_as).split('.').nth(1),
    }
}

pub fn convert_train_type(record: &TrainTypeRecord) -> TrainType {
    TrainType {
        id: stripped(&record.same_as),
        names: record.title.clone().unwrap_or_default(),
    }
}

pub fn convert_railway(record: &RailwayRecord) -> Line {
    Line {
        id: stripped(&record.same_as),
        names: record.title.clone().unwrap_or_default(),
        ascending: record.ascending.as_deref().map(stripped),
        descending: record.descending.as_deref().map(stripped),
    }
}

/// Parse the optional arrival and departure strings of one stop-time.
///
/// Empty strings count as missing. A malformed string excludes the whole
/// entry, which is reported as `None`.
pub(crate) fn parse_times(
    trip: &str,
    index: usize,
    arrival: Option<&str>,
    departure: Option<&str>,
) -> Option<(Option<TimePoint>, Option<TimePoint>)> {
    let parse = |value: Option<&str>| {
        value
            .filter(|v| !v.is_empty())
            .map(TimePoint::parse)
            .transpose()
    };

    match (parse(arrival), parse(departure)) {
        (Ok(arrival), Ok(departure)) => Some((arrival, departure)),
        (Err(e), _) | (_, Err(e)) => {
            warn!(trip, index, error = %e, "skipping stop-time with malformed time");
            None
        }
    }
}

pub(crate) fn first_name(trip: &str, names: Vec<Names>) -> Option<Names> {
    if names.len() > 1 {
        warn!(trip, count = names.len(), "trip has multiple names, using the first");
    }
    names.into_iter().next()
}

fn stripped(id: &str) -> String {
    strip_prefix(id).to_string()
}

fn strip_all(ids: Option<OneOrMany<String>>) -> Option<Vec<String>> {
    ids.map(|ids| ids.into_vec().iter().map(|id| stripped(id)).collect())
}
