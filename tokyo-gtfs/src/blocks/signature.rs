//! Reduced train records used while resolving blocks.

use crate::domain::{TimePoint, Train, last_part};

/// Signature of a single stop event.
///
/// Used to match one train's last stop to another train's first stop when
/// neither declares the link explicitly. Stations and destinations are
/// compared by stem, because operators use different ids for the shared
/// platform at a through-service boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StopTimeHash {
    pub calendar: String,
    pub station: String,
    /// Destination stems joined with `;`.
    pub destinations: String,
    pub time: TimePoint,
}

impl StopTimeHash {
    /// Signature of the first stop of a train.
    ///
    /// Returns `None` for trains without stop-times.
    pub fn first_of(train: &Train) -> Option<Self> {
        let first = train.stop_times.first()?;
        Some(Self::new(train, &first.station, first.arrival))
    }

    /// Signature of the last stop of a train.
    pub fn last_of(train: &Train) -> Option<Self> {
        let last = train.stop_times.last()?;
        Some(Self::new(train, &last.station, last.arrival))
    }

    fn new(train: &Train, station: &str, time: TimePoint) -> Self {
        Self {
            calendar: train.calendar.clone(),
            station: last_part(station).to_string(),
            destinations: joined_stems(&train.destinations),
            time,
        }
    }
}

fn joined_stems(ids: &[String]) -> String {
    ids.iter()
        .map(|id| last_part(id))
        .collect::<Vec<_>>()
        .join(";")
}

/// The parts of a [`Train`] needed for block solving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainShort {
    pub id: String,
    pub route: String,
    pub calendar: String,
    pub first_sta: StopTimeHash,
    pub last_sta: StopTimeHash,
    pub destinations: Vec<String>,
    /// The train terminates at its own destination.
    pub is_last: bool,
    /// The train starts at its own origin. Unknown when the source gives
    /// no origins.
    pub is_first: Option<bool>,
    pub prev: Option<Vec<String>>,
    pub next: Option<Vec<String>>,
    /// Whether the train has enough stops to be matched by signature.
    pub matchable: bool,
}

impl TrainShort {
    /// Reduce a train. Returns `None` for trains without stop-times.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokyo_gtfs::blocks::TrainShort;
    /// use tokyo_gtfs::domain::{StopTime, TimePoint, Train};
    ///
    /// let mut train = Train::new("T1", "Toei.Asakusa", "Weekday");
    /// let t = TimePoint::parse("10:00").unwrap();
    /// train.stop_times = vec![StopTime::new("Toei.Asakusa.Oshiage", t, t), StopTime::new("Toei.Asakusa.NishiMagome", t, t)];
    /// train.destinations = vec!["Toei.Asakusa.NishiMagome".into()];
    ///
    /// let short = TrainShort::from_train(&train).unwrap();
    /// assert!(short.is_last);
    /// assert_eq!(short.is_first, None);
    /// assert_eq!(short.last_sta.station, "NishiMagome");
    /// ```
    pub fn from_train(train: &Train) -> Option<Self> {
        let first_sta = StopTimeHash::first_of(train)?;
        let last_sta = StopTimeHash::last_of(train)?;

        let last_station = train.stop_times.last().map(|s| s.station.as_str());
        let is_last = train.destinations.len() == 1
            && Some(train.destinations[0].as_str()) == last_station;

        let first_station = train.stop_times.first().map(|s| s.station.as_str());
        let is_first = train
            .origins
            .as_ref()
            .map(|origins| origins.len() == 1 && Some(origins[0].as_str()) == first_station);

        Some(Self {
            id: train.id.clone(),
            route: train.route.clone(),
            calendar: train.calendar.clone(),
            first_sta,
            last_sta,
            destinations: train.destinations.clone(),
            is_last,
            is_first,
            prev: train.previous.clone(),
            next: train.next.clone(),
            matchable: train.stop_times.len() > 1,
        })
    }

    /// Starts at its origin and ends at its destination, so it cannot be
    /// part of any through-service.
    pub fn is_self_contained(&self) -> bool {
        self.is_first == Some(true) && self.is_last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StopTime;

    fn t(s: &str) -> TimePoint {
        TimePoint::parse(s).unwrap()
    }

    fn train(stops: &[(&str, &str)]) -> Train {
        let mut train = Train::new("T", "R", "Weekday");
        train.stop_times = stops
            .iter()
            .map(|(station, time)| StopTime::new(*station, t(time), t(time)))
            .collect();
        train
    }

    #[test]
    fn hashes_use_stems() {
        let mut tr = train(&[("TokyoMetro.Hanzomon.Oshiage", "10:00"), ("TokyoMetro.Hanzomon.Shibuya", "10:30")]);
        tr.destinations = vec!["Tokyu.DenEnToshi.ChuoRinkan".into(), "X.Y.Z".into()];

        let first = StopTimeHash::first_of(&tr).unwrap();
        assert_eq!(first.station, "Oshiage");
        assert_eq!(first.destinations, "ChuoRinkan;Z");
        assert_eq!(first.time, t("10:00"));

        let last = StopTimeHash::last_of(&tr).unwrap();
        assert_eq!(last.station, "Shibuya");
        assert_eq!(last.time, t("10:30"));
    }

    #[test]
    fn boundary_hashes_match_across_operators() {
        let mut a = train(&[("TokyoMetro.Hanzomon.Oshiage", "10:00"), ("TokyoMetro.Hanzomon.Shibuya", "10:30")]);
        a.destinations = vec!["Tokyu.DenEnToshi.ChuoRinkan".into()];
        let mut b = train(&[("Tokyu.DenEnToshi.Shibuya", "10:30"), ("Tokyu.DenEnToshi.ChuoRinkan", "11:20")]);
        b.destinations = vec!["Tokyu.DenEnToshi.ChuoRinkan".into()];

        assert_eq!(StopTimeHash::last_of(&a), StopTimeHash::first_of(&b));
    }

    #[test]
    fn self_contained_needs_both_ends() {
        let mut tr = train(&[("A", "10:00"), ("B", "10:10")]);
        tr.destinations = vec!["B".into()];
        assert!(!TrainShort::from_train(&tr).unwrap().is_self_contained());

        tr.origins = Some(vec!["A".into()]);
        assert!(TrainShort::from_train(&tr).unwrap().is_self_contained());

        tr.origins = Some(vec!["Z".into()]);
        let short = TrainShort::from_train(&tr).unwrap();
        assert_eq!(short.is_first, Some(false));
        assert!(!short.is_self_contained());
    }

    #[test]
    fn single_stop_train_is_not_matchable() {
        let tr = train(&[("A", "10:00")]);
        assert!(!TrainShort::from_train(&tr).unwrap().matchable);
        assert!(TrainShort::from_train(&train(&[])).is_none());
    }
}
