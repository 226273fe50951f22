//! Canonical train and trip records.
//!
//! Every provider converts its raw records into [`Train`]s. The rest of the
//! pipeline only ever sees this shape.

use serde::{Deserialize, Serialize};
use tracing::warn;

use super::ids::first_part;
use super::time::{TimePoint, fill_missing, normalize_times};
use super::{Language, Names};

/// Whether riders may board or alight at a stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PickupType {
    #[default]
    Regular,
    NotAvailable,
    MustPhone,
    MustCoordinate,
}

impl PickupType {
    /// Map an ODPT-style "can get on/off" flag.
    pub fn from_allowed(allowed: Option<bool>) -> Self {
        match allowed {
            Some(false) => PickupType::NotAvailable,
            _ => PickupType::Regular,
        }
    }

    /// GTFS numeric value.
    pub fn gtfs_value(self) -> u8 {
        match self {
            PickupType::Regular => 0,
            PickupType::NotAvailable => 1,
            PickupType::MustPhone => 2,
            PickupType::MustCoordinate => 3,
        }
    }
}

/// One call of a train at a station, with normalized times.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StopTime {
    pub station: String,
    pub arrival: TimePoint,
    pub departure: TimePoint,
    pub platform: Option<String>,
    pub pickup: PickupType,
    pub drop_off: PickupType,
}

impl StopTime {
    /// A regular stop with the given times.
    pub fn new(station: impl Into<String>, arrival: TimePoint, departure: TimePoint) -> Self {
        Self {
            station: station.into(),
            arrival,
            departure,
            platform: None,
            pickup: PickupType::Regular,
            drop_off: PickupType::Regular,
        }
    }
}

/// A stop-time as read from a source, before time normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTimeDraft {
    pub station: String,
    pub arrival: Option<TimePoint>,
    pub departure: Option<TimePoint>,
    pub platform: Option<String>,
    pub pickup: PickupType,
    pub drop_off: PickupType,
}

impl StopTimeDraft {
    /// A draft with regular pickup and drop-off.
    pub fn new(
        station: impl Into<String>,
        arrival: Option<TimePoint>,
        departure: Option<TimePoint>,
    ) -> Self {
        Self {
            station: station.into(),
            arrival,
            departure,
            platform: None,
            pickup: PickupType::Regular,
            drop_off: PickupType::Regular,
        }
    }
}

/// Turn raw stop-time drafts into a monotonic stop-time sequence.
///
/// Drafts without any time are dropped with a warning. See
/// [`normalize_times`] for the midnight rules.
pub fn normalize_stop_times(
    trip_id: &str,
    drafts: Vec<StopTimeDraft>,
    midnight_cutoff: Option<TimePoint>,
) -> Vec<StopTime> {
    let mut kept = Vec::with_capacity(drafts.len());
    let mut times = Vec::with_capacity(drafts.len());

    for (idx, draft) in drafts.into_iter().enumerate() {
        match fill_missing(draft.arrival, draft.departure) {
            Some(pair) => {
                times.push(pair);
                kept.push(draft);
            }
            None => {
                warn!(trip = trip_id, index = idx, station = %draft.station, "stop-time without any time");
            }
        }
    }

    normalize_times(&mut times, midnight_cutoff);

    kept.into_iter()
        .zip(times)
        .map(|(draft, (arrival, departure))| StopTime {
            station: draft.station,
            arrival,
            departure,
            platform: draft.platform,
            pickup: draft.pickup,
            drop_off: draft.drop_off,
        })
        .collect()
}

/// A train (or bus trip) in canonical form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Train {
    pub id: String,
    pub route: String,
    pub calendar: String,
    /// Train number as printed in timetables, may be empty.
    pub number: String,
    /// Human names, e.g. "Narita Express".
    pub names: Option<Names>,
    pub train_type: Option<String>,
    /// Direction tag of the source, e.g. "Inbound" or "OuterLoop".
    pub direction: Option<String>,
    pub stop_times: Vec<StopTime>,
    pub destinations: Vec<String>,
    pub origins: Option<Vec<String>>,
    /// Declared previous trains. `Some(vec![])` is a declaration of none.
    pub previous: Option<Vec<String>>,
    /// Declared next trains. `Some(vec![])` is a declaration of none.
    pub next: Option<Vec<String>>,
    /// Destination sign given directly by the source (buses).
    pub sign: Option<Names>,
    pub realtime_id: Option<String>,
}

impl Train {
    /// A train with no stops or links.
    pub fn new(id: impl Into<String>, route: impl Into<String>, calendar: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            route: route.into(),
            calendar: calendar.into(),
            number: String::new(),
            names: None,
            train_type: None,
            direction: None,
            stop_times: Vec::new(),
            destinations: Vec::new(),
            origins: None,
            previous: None,
            next: None,
            sign: None,
            realtime_id: None,
        }
    }

    /// The agency running this train, taken from the route id.
    pub fn agency(&self) -> &str {
        first_part(&self.route)
    }

    /// GTFS short name: the number followed by the default-language name.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokyo_gtfs::domain::{Names, Train};
    ///
    /// let mut train = Train::new("JR-East.NaritaExpress.2001M.Weekday", "JR-East.NaritaExpress", "Weekday");
    /// train.number = "1".into();
    /// assert_eq!(train.short_name(), "1");
    ///
    /// train.names = Some(Names::ja_en("成田エクスプレス", "Narita Express"));
    /// assert_eq!(train.short_name(), "1 成田エクスプレス Narita Express");
    /// ```
    pub fn short_name(&self) -> String {
        match &self.names {
            Some(names) => prepend_number(&self.number, &names.default_name()),
            None => self.number.clone(),
        }
    }

    /// Short name in a single language, if the train has a name in it.
    pub fn short_name_in(&self, lang: Language) -> Option<String> {
        let name = self.names.as_ref()?.get(lang);
        (!name.is_empty()).then(|| prepend_number(&self.number, name))
    }
}

/// `"{number} {name}"`, or just the name when there is no number.
pub fn prepend_number(number: &str, name: &str) -> String {
    if number.is_empty() {
        name.to_string()
    } else {
        format!("{number} {name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(s: &str) -> TimePoint {
        TimePoint::parse(s).unwrap()
    }

    #[test]
    fn normalize_drops_entries_without_times() {
        let drafts = vec![
            StopTimeDraft::new("A", Some(t("10:00")), None),
            StopTimeDraft::new("B", None, None),
            StopTimeDraft::new("C", None, Some(t("10:10"))),
        ];
        let stop_times = normalize_stop_times("T", drafts, None);

        let stations: Vec<_> = stop_times.iter().map(|s| s.station.as_str()).collect();
        assert_eq!(stations, vec!["A", "C"]);
        assert_eq!(stop_times[0].departure, t("10:00"));
        assert_eq!(stop_times[1].arrival, t("10:10"));
    }

    #[test]
    fn normalize_keeps_platform_and_flags() {
        let mut draft = StopTimeDraft::new("A", Some(t("23:59")), Some(t("00:01")));
        draft.platform = Some("3".into());
        draft.drop_off = PickupType::NotAvailable;

        let stop_times = normalize_stop_times("T", vec![draft], None);
        assert_eq!(stop_times[0].platform.as_deref(), Some("3"));
        assert_eq!(stop_times[0].drop_off, PickupType::NotAvailable);
        assert_eq!(stop_times[0].departure, t("24:01"));
    }

    #[test]
    fn short_name_in_language() {
        let mut train = Train::new("X", "JR-East.Chuo", "Weekday");
        train.number = "5".into();
        assert_eq!(train.short_name_in(Language::English), None);

        train.names = Some(Names::ja_en("あずさ", "Azusa"));
        assert_eq!(train.short_name_in(Language::English).as_deref(), Some("5 Azusa"));
        assert_eq!(train.short_name_in(Language::Korean), None);
    }

    #[test]
    fn agency_from_route() {
        let train = Train::new("TokyoMetro.Ginza.A0501.Weekday", "TokyoMetro.Ginza", "Weekday");
        assert_eq!(train.agency(), "TokyoMetro");
    }

    #[test]
    fn pickup_from_allowed() {
        assert_eq!(PickupType::from_allowed(Some(false)), PickupType::NotAvailable);
        assert_eq!(PickupType::from_allowed(Some(true)), PickupType::Regular);
        assert_eq!(PickupType::from_allowed(None), PickupType::Regular);
        assert_eq!(PickupType::NotAvailable.gtfs_value(), 1);
    }
}
