//! mini-tokyo-3d provider.
//!
//! Reads the `data/` directory of the mini-tokyo-3d project: railways,
//! stations, station groups, train types and one timetable file per line
//! under `train-timetables/`. The dataset has no calendar table; each
//! train's calendar is encoded in its id.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::domain::{
    BuiltinCalendar, Calendar, Line, Names, Station, StopTimeDraft, TimePoint, Train, TrainType,
    normalize_stop_times,
};
use crate::feed::StationGroup;

use super::odpt::{first_name, parse_times};
use super::{ConversionError, Provider, ProviderError, keep_valid, read_json};

/// Trains starting before this time belong to the previous service day.
const MIDNIGHT_CUTOFF: TimePoint = TimePoint::from_hms(3, 0, 0);

/// Calendars trains may be tagged with.
const CALENDARS: [BuiltinCalendar; 4] = [
    BuiltinCalendar::Weekday,
    BuiltinCalendar::Saturday,
    BuiltinCalendar::SaturdayHoliday,
    BuiltinCalendar::Holiday,
];

#[derive(Debug, Clone, Deserialize)]
struct RailwayRecord {
    id: String,
    #[serde(default)]
    title: Names,
    ascending: Option<String>,
    descending: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct StationRecord {
    id: String,
    #[serde(default)]
    title: Names,
    /// Longitude, latitude.
    coord: Option<[f64; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
struct TrainTypeRecord {
    id: String,
    #[serde(default)]
    title: Names,
}

#[derive(Debug, Clone, Deserialize)]
struct TimetableRecord {
    id: String,
    #[serde(rename = "r")]
    railway: String,
    #[serde(rename = "y")]
    train_type: Option<String>,
    #[serde(rename = "n", default)]
    number: String,
    #[serde(rename = "nm")]
    names: Option<Vec<Names>>,
    #[serde(rename = "d")]
    direction: Option<String>,
    #[serde(rename = "ds")]
    destinations: Option<Vec<String>>,
    #[serde(rename = "os")]
    origins: Option<Vec<String>>,
    #[serde(rename = "pt")]
    previous: Option<Vec<String>>,
    #[serde(rename = "nt")]
    next: Option<Vec<String>>,
    /// Realtime train id.
    #[serde(rename = "t")]
    realtime: Option<String>,
    #[serde(rename = "tt", default)]
    timetable: Vec<TimetableEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct TimetableEntry {
    #[serde(rename = "s")]
    station: String,
    #[serde(rename = "a")]
    arrival: Option<String>,
    #[serde(rename = "d")]
    departure: Option<String>,
}

/// Directory-backed mini-tokyo-3d source.
#[derive(Debug, Clone)]
pub struct MiniTokyoProvider {
    dir: PathBuf,
}

impl MiniTokyoProvider {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Every `*.json` file of `train-timetables/`, in name order.
    fn timetable_files(&self) -> Result<Vec<PathBuf>, ProviderError> {
        let dir = self.dir.join("train-timetables");
        let io_error = |source| ProviderError::Io {
            path: dir.clone(),
            source,
        };

        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir).map_err(io_error)? {
            let path = entry.map_err(io_error)?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn load_timetable(&self, path: &Path) -> Result<Vec<Train>, ProviderError> {
        let records: Vec<TimetableRecord> = read_json(path)?;
        Ok(keep_valid(
            "train",
            records.into_iter().map(|r| (r.id.clone(), convert_train(r))),
        ))
    }
}

impl Provider for MiniTokyoProvider {
    fn name(&self) -> &str {
        "mini_tokyo"
    }

    fn trains(&self) -> Result<Vec<Train>, ProviderError> {
        let mut trains = Vec::new();
        for path in self.timetable_files()? {
            trains.extend(self.load_timetable(&path)?);
        }
        debug!(provider = self.name(), count = trains.len(), "loaded trains");
        Ok(trains)
    }

    fn stations(&self) -> Result<Vec<Station>, ProviderError> {
        let records: Vec<StationRecord> = read_json(&self.dir.join("stations.json"))?;
        Ok(records
            .into_iter()
            .map(|r| {
                let mut station = Station::new(r.id, r.title);
                if let Some([lon, lat]) = r.coord {
                    station.lat = lat;
                    station.lon = lon;
                }
                station
            })
            .collect())
    }

    /// The dataset declares no calendars, so the builtins its train ids
    /// use are synthesized.
    fn calendars(&self) -> Result<Vec<Calendar>, ProviderError> {
        Ok(CALENDARS.into_iter().map(Calendar::builtin).collect())
    }

    fn train_types(&self) -> Result<Vec<TrainType>, ProviderError> {
        let records: Vec<TrainTypeRecord> = read_json(&self.dir.join("train-types.json"))?;
        Ok(records
            .into_iter()
            .map(|r| TrainType {
                id: r.id,
                names: r.title,
            })
            .collect())
    }

    fn lines(&self) -> Result<Vec<Line>, ProviderError> {
        let records: Vec<RailwayRecord> = read_json(&self.dir.join("railways.json"))?;
        Ok(records
            .into_iter()
            .map(|r| Line {
                id: r.id,
                names: r.title,
                ascending: r.ascending,
                descending: r.descending,
            })
            .collect())
    }

    fn station_groups(&self) -> Result<Vec<StationGroup>, ProviderError> {
        read_json(&self.dir.join("station-groups.json"))
    }
}

/// Calendar encoded in a train id, as its last or second-to-last part
/// (`JR-East.Yamanote.401G.Holiday.2`).
fn calendar_of(train_id: &str) -> Option<&'static str> {
    let mut parts = train_id.rsplit('.');
    let is_calendar = |part: &str| CALENDARS.into_iter().find(|c| c.as_str() == part);
    let last = parts.next().and_then(is_calendar);
    let second = parts.next().and_then(is_calendar);
    last.or(second).map(BuiltinCalendar::as_str)
}

fn convert_train(record: TimetableRecord) -> Result<Train, ConversionError> {
    let calendar = calendar_of(&record.id).ok_or(ConversionError::NoCalendar)?;
    let mut train = Train::new(record.id, record.railway, calendar);

    train.number = record.number;
    train.names = record.names.and_then(|names| first_name(&train.id, names));
    train.train_type = record.train_type;
    train.direction = record.direction;
    train.destinations = record.destinations.unwrap_or_default();
    train.origins = record.origins;
    train.previous = record.previous;
    train.next = record.next;
    train.realtime_id = record.realtime.filter(|t| !t.is_empty());

    let drafts = record
        .timetable
        .into_iter()
        .enumerate()
        .filter_map(|(idx, entry)| {
            let (arrival, departure) = parse_times(
                &train.id,
                idx,
                entry.arrival.as_deref(),
                entry.departure.as_deref(),
            )?;
            Some(StopTimeDraft::new(entry.station, arrival, departure))
        })
        .collect();

    train.stop_times = normalize_stop_times(&train.id, drafts, Some(MIDNIGHT_CUTOFF));
    if train.stop_times.is_empty() {
        return Err(ConversionError::NoStopTimes);
    }
    Ok(train)
}
