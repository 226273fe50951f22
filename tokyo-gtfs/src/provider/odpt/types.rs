//! ODPT rail JSON-LD records.
//!
//! Only the fields the converter needs are declared. ODPT omits fields
//! rather than sending null, hence the many `Option`s.

use serde::Deserialize;

use crate::domain::Names;
use crate::provider::OneOrMany;

/// An element of `TrainTimetable.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainTimetable {
    #[serde(rename = "owl:sameAs")]
    pub same_as: String,

    #[serde(rename = "odpt:operator")]
    pub operator: String,

    #[serde(rename = "odpt:railway")]
    pub railway: String,

    #[serde(rename = "odpt:calendar")]
    pub calendar: String,

    #[serde(rename = "odpt:trainNumber", default)]
    pub train_number: String,

    #[serde(rename = "odpt:trainType")]
    pub train_type: Option<String>,

    #[serde(rename = "odpt:trainName")]
    pub train_name: Option<OneOrMany<Names>>,

    #[serde(rename = "odpt:railDirection")]
    pub rail_direction: Option<String>,

    /// Id of the realtime train object.
    #[serde(rename = "odpt:train")]
    pub train: Option<String>,

    #[serde(rename = "odpt:destinationStation")]
    pub destination_station: Option<OneOrMany<String>>,

    #[serde(rename = "odpt:originStation")]
    pub origin_station: Option<OneOrMany<String>>,

    #[serde(rename = "odpt:previousTrainTimetable")]
    pub previous_train_timetable: Option<OneOrMany<String>>,

    #[serde(rename = "odpt:nextTrainTimetable")]
    pub next_train_timetable: Option<OneOrMany<String>>,

    #[serde(rename = "odpt:trainTimetableObject", default)]
    pub timetable: Vec<TimetableObject>,
}

/// One call of a train.
#[derive(Debug, Clone, Deserialize)]
pub struct TimetableObject {
    #[serde(rename = "odpt:arrivalTime")]
    pub arrival_time: Option<String>,

    #[serde(rename = "odpt:departureTime")]
    pub departure_time: Option<String>,

    #[serde(rename = "odpt:arrivalStation")]
    pub arrival_station: Option<String>,

    #[serde(rename = "odpt:departureStation")]
    pub departure_station: Option<String>,

    #[serde(rename = "odpt:platformNumber")]
    pub platform_number: Option<String>,
}

/// An element of `Station.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct StationRecord {
    #[serde(rename = "owl:sameAs")]
    pub same_as: String,

    #[serde(rename = "odpt:operator")]
    pub operator: String,

    #[serde(rename = "odpt:railway")]
    pub railway: Option<String>,

    #[serde(rename = "odpt:stationCode")]
    pub station_code: Option<String>,

    #[serde(rename = "odpt:stationTitle")]
    pub station_title: Option<Names>,

    #[serde(rename = "geo:lat")]
    pub lat: Option<f64>,

    #[serde(rename = "geo:long")]
    pub long: Option<f64>,
}

/// An element of `Calendar.json`, shared by rail and bus dumps.
#[derive(Debug, Clone, Deserialize)]
pub struct CalendarRecord {
    #[serde(rename = "owl:sameAs")]
    pub same_as: String,

    #[serde(rename = "odpt:operator")]
    pub operator: Option<String>,

    /// Dates as "YYYY-MM-DD", only on specific calendars.
    #[serde(rename = "odpt:day", default)]
    pub day: Vec<String>,
}

/// An element of `TrainType.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainTypeRecord {
    #[serde(rename = "owl:sameAs")]
    pub same_as: String,

    #[serde(rename = "odpt:operator")]
    pub operator: String,

    #[serde(rename = "odpt:trainTypeTitle")]
    pub title: Option<Names>,
}

/// An element of `Railway.json`.
#[derive(Debug, Clone, Deserialize)]
pub struct RailwayRecord {
    #[serde(rename = "owl:sameAs")]
    pub same_as: String,

    #[serde(rename = "odpt:operator")]
    pub operator: String,

    #[serde(rename = "odpt:railwayTitle")]
    pub title: Option<Names>,

    #[serde(rename = "odpt:ascendingRailDirection")]
    pub ascending: Option<String>,

    #[serde(rename = "odpt:descendingRailDirection")]
    pub descending: Option<String>,
}
