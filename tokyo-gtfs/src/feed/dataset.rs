//! GTFS-shaped records held in memory while the pipeline runs.
//!
//! Tables are keyed by their primary id so later stages (headsigns, route
//! merges, simplification) can edit them in place. Stop-times are keyed by
//! trip id and kept in sequence order.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{Language, Names, PickupType, TimePoint};

/// An operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agency {
    pub id: String,
    pub name: String,
    pub url: String,
    pub timezone: String,
}

/// GTFS `route_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteType {
    Tram,
    Subway,
    #[default]
    Rail,
    Bus,
    Monorail,
}

impl RouteType {
    pub fn gtfs_value(self) -> u16 {
        match self {
            RouteType::Tram => 0,
            RouteType::Subway => 1,
            RouteType::Rail => 2,
            RouteType::Bus => 3,
            RouteType::Monorail => 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub id: String,
    pub agency: String,
    pub short_name: String,
    pub long_name: String,
    #[serde(default)]
    pub route_type: RouteType,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
}

impl Route {
    /// A route with only its ids and names set.
    pub fn new(id: impl Into<String>, agency: impl Into<String>, short_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            agency: agency.into(),
            short_name: short_name.into(),
            long_name: String::new(),
            route_type: RouteType::Rail,
            color: None,
            text_color: None,
        }
    }

    /// Fill `text_color` from `color` when only the latter is set.
    pub fn fill_text_color(&mut self) {
        if self.text_color.is_none() {
            self.text_color = self.color.as_deref().and_then(text_color_for).map(String::from);
        }
    }
}

/// Black or white, whichever reads better on an `RRGGBB` background.
///
/// # Examples
///
/// ```
/// use tokyo_gtfs::feed::text_color_for;
///
/// assert_eq!(text_color_for("F0E68C"), Some("000000"));
/// assert_eq!(text_color_for("00008B"), Some("FFFFFF"));
/// assert_eq!(text_color_for("blue"), None);
/// ```
pub fn text_color_for(color: &str) -> Option<&'static str> {
    let channel = |range: std::ops::Range<usize>| {
        color
            .get(range)
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .map(f64::from)
    };
    if color.len() != 6 {
        return None;
    }

    let yiq = 0.299 * channel(0..2)? + 0.587 * channel(2..4)? + 0.114 * channel(4..6)?;
    Some(if yiq > 128.0 { "000000" } else { "FFFFFF" })
}

/// GTFS `location_type`, limited to what the feed produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationType {
    #[default]
    Stop,
    Station,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    pub code: Option<String>,
    pub location_type: LocationType,
    pub parent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub route: String,
    /// GTFS service id, fixed when the trip is exported.
    pub service: String,
    pub calendar: String,
    pub short_name: String,
    pub headsign: String,
    pub direction: Option<u8>,
    pub block: Option<String>,
    /// Trip runs over a route it was merged into, outside its usual pattern.
    pub exceptional: bool,
    pub train_type: Option<String>,
    pub destinations: Vec<String>,
    /// Preceding trip of the same block.
    pub previous: Option<String>,
    /// Following trip of the same block.
    pub next: Option<String>,
    /// Destination sign supplied by the source.
    pub sign: Option<Names>,
    pub realtime_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTimeRecord {
    pub stop: String,
    pub sequence: u32,
    pub arrival: TimePoint,
    pub departure: TimePoint,
    pub platform: Option<String>,
    pub pickup: PickupType,
    pub drop_off: PickupType,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CalendarDate {
    pub service: String,
    pub date: NaiveDate,
}

/// Table a translation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Table {
    Agency,
    Routes,
    Stops,
    Trips,
}

/// Text of one field of one record in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Translation {
    pub table: Table,
    pub field: String,
    pub language: Language,
    pub text: String,
    pub record: String,
}

/// The whole output feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub agencies: BTreeMap<String, Agency>,
    pub routes: BTreeMap<String, Route>,
    pub stops: BTreeMap<String, Stop>,
    pub trips: BTreeMap<String, Trip>,
    /// Stop-times of each trip, in sequence order.
    pub stop_times: BTreeMap<String, Vec<StopTimeRecord>>,
    pub calendar_dates: Vec<CalendarDate>,
    pub translations: Vec<Translation>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one translation per language present in `names`.
    pub fn add_translations(&mut self, table: Table, record: &str, field: &str, names: &Names) {
        for (language, text) in names.present() {
            self.translations.push(Translation {
                table,
                field: field.to_string(),
                language,
                text: text.to_string(),
                record: record.to_string(),
            });
        }
    }

    /// Text of a translated field, if present.
    pub fn translation(&self, table: Table, record: &str, field: &str, language: Language) -> Option<&str> {
        self.translations
            .iter()
            .find(|t| t.table == table && t.record == record && t.field == field && t.language == language)
            .map(|t| t.text.as_str())
    }

    /// Replace every translation of one field of a record.
    pub fn set_translations(&mut self, table: Table, record: &str, field: &str, names: &Names) {
        self.translations
            .retain(|t| !(t.table == table && t.record == record && t.field == field));
        self.add_translations(table, record, field, names);
    }

    /// Delete all translations of a record. Returns how many were removed.
    pub fn remove_translations(&mut self, table: Table, record: &str) -> usize {
        let before = self.translations.len();
        self.translations.retain(|t| !(t.table == table && t.record == record));
        before - self.translations.len()
    }

    /// Point all translations of a record at a new id.
    pub fn rename_translations(&mut self, table: Table, from: &str, to: &str) {
        for t in self
            .translations
            .iter_mut()
            .filter(|t| t.table == table && t.record == from)
        {
            t.record = to.to_string();
        }
    }

    /// Duplicate all translations of a record onto another record.
    pub fn copy_translations(&mut self, table: Table, from: &str, to: &str) {
        let copies: Vec<Translation> = self
            .translations
            .iter()
            .filter(|t| t.table == table && t.record == from)
            .map(|t| Translation {
                record: to.to_string(),
                ..t.clone()
            })
            .collect();
        self.translations.extend(copies);
    }

    /// Ids of trips in a block, ordered by their first departure.
    pub fn block_trips(&self, block: &str) -> Vec<String> {
        let mut trips: Vec<(TimePoint, &str)> = self
            .trips
            .values()
            .filter(|t| t.block.as_deref() == Some(block))
            .map(|t| (self.first_departure(&t.id), t.id.as_str()))
            .collect();
        trips.sort();
        trips.into_iter().map(|(_, id)| id.to_string()).collect()
    }

    /// Departure from the first stop of a trip, midnight if it has none.
    pub fn first_departure(&self, trip: &str) -> TimePoint {
        self.stop_times
            .get(trip)
            .and_then(|st| st.first())
            .map(|st| st.departure)
            .unwrap_or_default()
    }

    /// Delete a trip with its stop-times and translations.
    pub fn remove_trip(&mut self, trip: &str) {
        self.trips.remove(trip);
        self.stop_times.remove(trip);
        self.remove_translations(Table::Trips, trip);
    }

    /// Agencies referenced by at least one route.
    pub fn used_agencies(&self) -> Vec<&str> {
        let mut agencies: Vec<&str> = self.routes.values().map(|r| r.agency.as_str()).collect();
        agencies.sort_unstable();
        agencies.dedup();
        agencies
    }

    /// Routes referenced by at least one trip.
    pub fn used_routes(&self) -> Vec<&str> {
        let mut routes: Vec<&str> = self.trips.values().map(|t| t.route.as_str()).collect();
        routes.sort_unstable();
        routes.dedup();
        routes
    }
}
