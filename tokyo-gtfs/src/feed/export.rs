//! Writing canonical trains and stations into a [`Dataset`].

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::blocks::{BlockAssignment, Membership};
use crate::calendar::CalendarResolver;
use crate::domain::{Language, Line, Names, Station, Train};

use super::dataset::{Dataset, LocationType, Stop, StopTimeRecord, Table, Trip};

/// Counters of one export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Trips written, clones included.
    pub trips: usize,
    pub clones: usize,
    /// Trains refused for an invalid calendar.
    pub dropped: usize,
}

/// Exports trains as trips, one per block membership.
pub struct TripExporter<'a> {
    lines: HashMap<&'a str, &'a Line>,
    assignment: &'a BlockAssignment,
}

impl<'a> TripExporter<'a> {
    pub fn new(lines: &'a [Line], assignment: &'a BlockAssignment) -> Self {
        Self {
            lines: lines.iter().map(|l| (l.id.as_str(), l)).collect(),
            assignment,
        }
    }

    /// Export every train.
    ///
    /// A train whose calendar the resolver refuses is dropped and counted.
    /// Otherwise one trip is written per block membership; a train in no
    /// block becomes a single trip without a block id.
    pub fn export(&self, dataset: &mut Dataset, resolver: &mut CalendarResolver, trains: &[Train]) -> ExportStats {
        let mut stats = ExportStats::default();

        for train in trains {
            let Some(service) = resolver.service_for(&train.route, &train.calendar) else {
                debug!(train = %train.id, calendar = %train.calendar, "dropping train with invalid calendar");
                stats.dropped += 1;
                continue;
            };

            let memberships = self.assignment.memberships(&train.id);
            if memberships.is_empty() {
                self.write_trip(dataset, train, &service, None);
                stats.trips += 1;
                continue;
            }

            for membership in memberships {
                self.write_trip(dataset, train, &service, Some(membership));
                stats.trips += 1;
                if !membership.suffix.is_empty() {
                    stats.clones += 1;
                }
            }
        }

        debug!(trips = stats.trips, clones = stats.clones, dropped = stats.dropped, "exported trips");
        stats
    }

    fn write_trip(&self, dataset: &mut Dataset, train: &Train, service: &str, membership: Option<&Membership>) {
        let id = match membership {
            Some(m) => m.trip_id(&train.id),
            None => train.id.clone(),
        };

        let trip = Trip {
            id: id.clone(),
            route: train.route.clone(),
            service: service.to_string(),
            calendar: train.calendar.clone(),
            short_name: train.short_name(),
            headsign: String::new(),
            direction: self.direction_of(train),
            block: membership.map(|m| m.block_id.clone()),
            exceptional: false,
            train_type: train.train_type.clone(),
            destinations: membership
                .map(|m| m.destinations.clone())
                .unwrap_or_else(|| train.destinations.clone()),
            previous: membership.and_then(|m| m.previous.clone()),
            next: membership.and_then(|m| m.next.clone()),
            sign: train.sign.clone(),
            realtime_id: train.realtime_id.clone(),
        };

        let mut short_names = Names::default();
        for lang in Language::ALL {
            if let Some(name) = train.short_name_in(lang) {
                short_names.set(lang, name);
            }
        }
        dataset.add_translations(Table::Trips, &id, "trip_short_name", &short_names);

        let stop_times = train
            .stop_times
            .iter()
            .zip(0..)
            .map(|(st, sequence)| StopTimeRecord {
                stop: st.station.clone(),
                sequence,
                arrival: st.arrival,
                departure: st.departure,
                platform: st.platform.clone(),
                pickup: st.pickup,
                drop_off: st.drop_off,
            })
            .collect();

        if dataset.trips.insert(id.clone(), trip).is_some() {
            warn!(trip = %id, "duplicate trip id, replacing earlier trip");
        }
        dataset.stop_times.insert(id, stop_times);
    }

    fn direction_of(&self, train: &Train) -> Option<u8> {
        let tag = train.direction.as_deref()?;
        let line = self.lines.get(train.route.as_str())?;
        let direction = line.direction_id(tag);
        if direction.is_none() {
            warn!(train = %train.id, direction = tag, "train uses an unknown direction");
        }
        direction
    }
}

/// Write stations as child stops, with name translations.
pub fn export_stations(dataset: &mut Dataset, stations: &[Station]) {
    for station in stations {
        if !station.has_position() {
            warn!(stop = %station.id, "stop has no coordinates");
        }

        dataset.stops.insert(
            station.id.clone(),
            Stop {
                id: station.id.clone(),
                name: station.names.default_name(),
                lat: station.lat,
                lon: station.lon,
                code: station.code.clone(),
                location_type: LocationType::Stop,
                parent: None,
            },
        );
        dataset.add_translations(Table::Stops, &station.id, "stop_name", &station.names);
    }
}
