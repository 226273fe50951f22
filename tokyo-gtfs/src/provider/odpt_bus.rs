//! ODPT bus provider.
//!
//! Bus trips come from `BusTimetable.json`, each pointing at a
//! `BusroutePattern.json` entry that names its route and direction. Stops
//! are the poles of `BusstopPole.json`. Bus routes are too numerous to
//! curate, so this provider also declares its own routes.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::Deserialize;
use tracing::debug;

use crate::domain::{
    Calendar, Line, Names, PickupType, Station, StopTimeDraft, TimePoint, Train, TrainType,
    normalize_stop_times, strip_prefix,
};
use crate::feed::{Route, RouteType};

use super::odpt::{parse_times, read_calendars};
use super::{ConversionError, OneOrMany, Provider, ProviderError, keep_valid, read_json};

/// Trips flagged `odpt:isMidnight` starting before this time run on the
/// next day.
const MIDNIGHT_CUTOFF: TimePoint = TimePoint::from_hms(6, 0, 0);

#[derive(Debug, Clone, Deserialize)]
struct PatternRecord {
    #[serde(rename = "owl:sameAs")]
    same_as: String,

    #[serde(rename = "odpt:operator")]
    operator: String,

    #[serde(rename = "odpt:busroute")]
    busroute: String,

    /// Route code followed by a description, e.g. "都01 渋谷駅前行".
    #[serde(rename = "dc:title", default)]
    title: String,

    #[serde(rename = "odpt:direction")]
    direction: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PoleRecord {
    #[serde(rename = "owl:sameAs")]
    same_as: String,

    #[serde(rename = "odpt:operator")]
    operator: OneOrMany<String>,

    #[serde(rename = "dc:title")]
    dc_title: Option<String>,

    title: Option<Names>,

    #[serde(rename = "geo:lat")]
    lat: Option<f64>,

    #[serde(rename = "geo:long")]
    long: Option<f64>,

    #[serde(rename = "odpt:busstopPoleNumber")]
    pole_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TimetableRecord {
    #[serde(rename = "owl:sameAs")]
    same_as: String,

    #[serde(rename = "odpt:operator")]
    operator: String,

    #[serde(rename = "odpt:busroutePattern")]
    pattern: String,

    #[serde(rename = "odpt:calendar")]
    calendar: String,

    #[serde(rename = "odpt:isMidnight", default)]
    is_midnight: bool,

    #[serde(rename = "odpt:busTimetableObject", default)]
    objects: Vec<TimetableObject>,
}

#[derive(Debug, Clone, Deserialize)]
struct TimetableObject {
    #[serde(rename = "odpt:index")]
    index: Option<u32>,

    #[serde(rename = "odpt:arrivalTime")]
    arrival_time: Option<String>,

    #[serde(rename = "odpt:departureTime")]
    departure_time: Option<String>,

    #[serde(rename = "odpt:busstopPole")]
    pole: String,

    #[serde(rename = "odpt:destinationSign")]
    destination_sign: Option<String>,

    #[serde(rename = "odpt:canGetOn")]
    can_get_on: Option<bool>,

    #[serde(rename = "odpt:canGetOff")]
    can_get_off: Option<bool>,
}

/// Route and direction of a route pattern.
#[derive(Debug, Clone)]
struct Pattern {
    route: String,
    direction: Option<String>,
}

/// Directory-backed ODPT bus source.
#[derive(Debug, Clone)]
pub struct OdptBusProvider {
    dir: PathBuf,
    operators: BTreeSet<String>,
}

impl OdptBusProvider {
    pub const DEFAULT_OPERATORS: [&'static str; 7] = [
        "KeioBus",
        "NishiTokyoBus",
        "SeibuBus",
        "SotetsuBus",
        "Toei",
        "TokyuBus",
        "YokohamaMunicipal",
    ];

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            operators: Self::DEFAULT_OPERATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the operator filter.
    pub fn with_operators<S: Into<String>>(mut self, operators: impl IntoIterator<Item = S>) -> Self {
        self.operators = operators.into_iter().map(Into::into).collect();
        self
    }

    fn provides(&self, operator: &str) -> bool {
        self.operators.contains(strip_prefix(operator))
    }

    fn patterns(&self) -> Result<Vec<PatternRecord>, ProviderError> {
        let records: Vec<PatternRecord> = read_json(&self.dir.join("BusroutePattern.json"))?;
        Ok(records
            .into_iter()
            .filter(|r| self.provides(&r.operator))
            .collect())
    }

    fn pattern_index(&self) -> Result<BTreeMap<String, Pattern>, ProviderError> {
        Ok(self
            .patterns()?
            .into_iter()
            .map(|r| {
                let pattern = Pattern {
                    route: strip_prefix(&r.busroute).to_string(),
                    direction: r.direction.filter(|d| d == "0" || d == "1"),
                };
                (strip_prefix(&r.same_as).to_string(), pattern)
            })
            .collect())
    }
}

impl Provider for OdptBusProvider {
    fn name(&self) -> &str {
        "odpt_bus"
    }

    fn trains(&self) -> Result<Vec<Train>, ProviderError> {
        let patterns = self.pattern_index()?;
        let records: Vec<TimetableRecord> = read_json(&self.dir.join("BusTimetable.json"))?;

        let trips = keep_valid(
            "bus trip",
            records
                .into_iter()
                .filter(|r| self.provides(&r.operator))
                .map(|r| (r.same_as.clone(), convert_trip(r, &patterns))),
        );
        debug!(provider = self.name(), count = trips.len(), "loaded trips");
        Ok(trips)
    }

    /// Bus stop poles. Poles without a position or a name are skipped.
    fn stations(&self) -> Result<Vec<Station>, ProviderError> {
        let records: Vec<PoleRecord> = read_json(&self.dir.join("BusstopPole.json"))?;
        Ok(records
            .into_iter()
            .filter(|r| r.operator.clone().into_vec().iter().any(|op| self.provides(op)))
            .filter_map(convert_pole)
            .collect())
    }

    fn calendars(&self) -> Result<Vec<Calendar>, ProviderError> {
        read_calendars(&self.dir.join("Calendar.json"), &self.operators)
    }

    fn train_types(&self) -> Result<Vec<TrainType>, ProviderError> {
        Ok(Vec::new())
    }

    /// One line per bus route; pattern directions "0" and "1" map to GTFS
    /// directions 0 and 1.
    fn lines(&self) -> Result<Vec<Line>, ProviderError> {
        let mut lines = BTreeMap::new();
        for pattern in self.patterns()? {
            let route = strip_prefix(&pattern.busroute).to_string();
            lines.entry(route.clone()).or_insert_with(|| Line {
                id: route,
                names: Names::ja_en(route_code(&pattern.title), ""),
                ascending: Some("0".into()),
                descending: Some("1".into()),
            });
        }
        Ok(lines.into_values().collect())
    }

    fn routes(&self) -> Result<Vec<Route>, ProviderError> {
        let mut routes = BTreeMap::new();
        for pattern in self.patterns()? {
            let id = strip_prefix(&pattern.busroute).to_string();
            routes.entry(id.clone()).or_insert_with(|| {
                let mut route = Route::new(id, strip_prefix(&pattern.operator), route_code(&pattern.title));
                route.route_type = RouteType::Bus;
                route
            });
        }
        Ok(routes.into_values().collect())
    }
}

fn route_code(title: &str) -> &str {
    title.split(' ').next().unwrap_or(title)
}

fn convert_trip(record: TimetableRecord, patterns: &BTreeMap<String, Pattern>) -> Result<Train, ConversionError> {
    let id = strip_prefix(&record.same_as).to_string();
    let pattern_id = strip_prefix(&record.pattern);
    let pattern = patterns
        .get(pattern_id)
        .ok_or_else(|| ConversionError::UnknownPattern(pattern_id.to_string()))?;

    let mut train = Train::new(id.clone(), pattern.route.clone(), strip_prefix(&record.calendar));
    train.direction = pattern.direction.clone();

    let mut objects = record.objects;
    objects.sort_by_key(|o| o.index);

    train.sign = objects
        .iter()
        .find_map(|o| o.destination_sign.as_deref())
        .map(|sign| Names::ja_en(sign, ""));

    let drafts = objects
        .iter()
        .enumerate()
        .filter_map(|(idx, object)| {
            let (arrival, departure) = parse_times(
                &id,
                idx,
                object.arrival_time.as_deref(),
                object.departure_time.as_deref(),
            )?;
            let mut draft = StopTimeDraft::new(strip_prefix(&object.pole), arrival, departure);
            draft.pickup = PickupType::from_allowed(object.can_get_on);
            draft.drop_off = PickupType::from_allowed(object.can_get_off);
            Some(draft)
        })
        .collect();

    let cutoff = record.is_midnight.then_some(MIDNIGHT_CUTOFF);
    train.stop_times = normalize_stop_times(&id, drafts, cutoff);
    if train.stop_times.is_empty() {
        return Err(ConversionError::NoStopTimes);
    }
    Ok(train)
}

fn convert_pole(record: PoleRecord) -> Option<Station> {
    let (lat, lon) = match (record.lat, record.long) {
        (Some(lat), Some(lon)) if lat != 0.0 && lon != 0.0 => (lat, lon),
        _ => {
            debug!(stop = %record.same_as, "skipping pole without a position");
            return None;
        }
    };

    let names = match (record.title, record.dc_title) {
        (Some(title), _) => Names::ja_en(title.ja, title.en),
        (None, Some(ja)) => Names::ja_en(ja, ""),
        (None, None) => {
            debug!(stop = %record.same_as, "skipping pole without a name");
            return None;
        }
    };

    let mut station = Station::new(strip_prefix(&record.same_as), names);
    station.lat = lat;
    station.lon = lon;
    station.code = record.pole_number;
    Some(station)
}
