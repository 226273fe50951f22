//! Merging redundant consecutive trips inside blocks.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, trace};

use crate::domain::same_stop;
use crate::feed::{Dataset, StopTimeRecord};

use super::config::SimplifyConfig;

/// Counters of one simplification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimplifyReport {
    /// Runs of trips merged into one.
    pub merged_runs: usize,
    /// Trips deleted by merging.
    pub removed_trips: usize,
    /// Blocks dropped for being left with a single trip.
    pub dissolved_blocks: usize,
}

/// Merges consecutive same-route trips of a block into one trip.
///
/// Through-service sometimes splits one run over a route into several
/// trips (e.g. a train passing through a junction station). Within each
/// block, trips are ordered by first departure and cut into runs sharing
/// route and calendar. A run is merged when all its trips agree on short
/// name and headsign, or when its route is configured to always merge.
pub struct BlockSimplifier<'a> {
    config: &'a SimplifyConfig,
}

impl<'a> BlockSimplifier<'a> {
    pub fn new(config: &'a SimplifyConfig) -> Self {
        Self { config }
    }

    /// Simplify every block of the dataset.
    pub fn simplify(&self, dataset: &mut Dataset) -> SimplifyReport {
        let mut report = SimplifyReport::default();

        let blocks: BTreeSet<String> = dataset.trips.values().filter_map(|t| t.block.clone()).collect();
        for block in &blocks {
            let trips = dataset.block_trips(block);
            let runs: Vec<Vec<String>> = trips
                .chunk_by(|a, b| run_key(dataset, a) == run_key(dataset, b))
                .filter(|run| run.len() > 1 && self.is_mergeable(dataset, run))
                .map(<[String]>::to_vec)
                .collect();

            for run in runs {
                trace!(block = %block, trips = run.len(), "merging trips");
                report.removed_trips += self.merge_run(dataset, &run);
                report.merged_runs += 1;
            }
        }

        report.dissolved_blocks = dissolve_lone_blocks(dataset);
        debug!(
            merged_runs = report.merged_runs,
            removed_trips = report.removed_trips,
            dissolved_blocks = report.dissolved_blocks,
            "simplified blocks"
        );
        report
    }

    fn is_mergeable(&self, dataset: &Dataset, run: &[String]) -> bool {
        let trips: Vec<_> = run.iter().filter_map(|id| dataset.trips.get(id)).collect();
        let Some(first) = trips.first() else {
            return false;
        };

        self.config.always_merges(&first.route)
            || trips
                .iter()
                .all(|t| t.short_name == first.short_name && t.headsign == first.headsign)
    }

    /// Merge a run into its base trip. Returns the number of trips removed.
    fn merge_run(&self, dataset: &mut Dataset, run: &[String]) -> usize {
        let Some(base) = run
            .iter()
            .max_by_key(|id| (self.config.base_score(id), id.as_str()))
            .cloned()
        else {
            return 0;
        };

        let merged = merge_stop_times(
            run.iter()
                .flat_map(|id| dataset.stop_times.get(id).cloned().unwrap_or_default()),
        );

        let previous = run.first().and_then(|id| dataset.trips.get(id)).and_then(|t| t.previous.clone());
        let next = run.last().and_then(|id| dataset.trips.get(id)).and_then(|t| t.next.clone());

        let removed: HashSet<&str> = run.iter().map(String::as_str).filter(|id| *id != base).collect();
        for id in &removed {
            dataset.remove_trip(id);
        }

        if let Some(trip) = dataset.trips.get_mut(&base) {
            trip.previous = previous;
            trip.next = next;
        }
        dataset.stop_times.insert(base.clone(), merged);

        // Neighbours outside the run must now point at the base
        for trip in dataset.trips.values_mut() {
            for link in [&mut trip.previous, &mut trip.next] {
                if link.as_deref().is_some_and(|l| removed.contains(l)) {
                    *link = Some(base.clone());
                }
            }
        }

        removed.len()
    }
}

fn run_key<'d>(dataset: &'d Dataset, trip: &str) -> Option<(&'d str, &'d str)> {
    dataset
        .trips
        .get(trip)
        .map(|t| (t.route.as_str(), t.calendar.as_str()))
}

/// Concatenate stop-times, collapsing consecutive calls at the same stop.
///
/// A collapsed call keeps the earlier arrival and sequence number and
/// everything else from the later (departing) call.
pub fn merge_stop_times(stop_times: impl IntoIterator<Item = StopTimeRecord>) -> Vec<StopTimeRecord> {
    let mut merged: Vec<StopTimeRecord> = Vec::new();

    for incoming in stop_times {
        match merged.last_mut() {
            Some(previous) if same_stop(&previous.stop, &incoming.stop) => {
                *previous = StopTimeRecord {
                    arrival: previous.arrival,
                    sequence: previous.sequence,
                    ..incoming
                };
            }
            _ => {
                let sequence = merged.len() as u32;
                merged.push(StopTimeRecord { sequence, ..incoming });
            }
        }
    }

    merged
}

/// Remove block ids from blocks with a single trip. Returns how many.
fn dissolve_lone_blocks(dataset: &mut Dataset) -> usize {
    let mut sizes: BTreeMap<String, usize> = BTreeMap::new();
    for block in dataset.trips.values().filter_map(|t| t.block.as_ref()) {
        *sizes.entry(block.clone()).or_default() += 1;
    }

    let lone: HashSet<String> = sizes
        .into_iter()
        .filter(|(_, count)| *count == 1)
        .map(|(block, _)| block)
        .collect();

    for trip in dataset.trips.values_mut() {
        if trip.block.as_ref().is_some_and(|b| lone.contains(b)) {
            trip.block = None;
        }
    }
    lone.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Names, PickupType, TimePoint};
    use crate::feed::{Table, Trip};

    fn t(s: &str) -> TimePoint {
        TimePoint::parse(s).unwrap()
    }

    fn stop_time(stop: &str, arrival: &str, departure: &str) -> StopTimeRecord {
        StopTimeRecord {
            stop: stop.into(),
            sequence: 0,
            arrival: t(arrival),
            departure: t(departure),
            platform: None,
            pickup: PickupType::Regular,
            drop_off: PickupType::Regular,
        }
    }

    fn add_trip(ds: &mut Dataset, id: &str, route: &str, block: &str, stops: Vec<StopTimeRecord>) {
        ds.trips.insert(
            id.into(),
            Trip {
                id: id.into(),
                route: route.into(),
                service: format!("{route}.Weekday"),
                calendar: "Weekday".into(),
                short_name: "Rapid".into(),
                headsign: "Ofuna".into(),
                direction: Some(0),
                block: Some(block.into()),
                exceptional: false,
                train_type: None,
                destinations: Vec::new(),
                previous: None,
                next: None,
                sign: None,
                realtime_id: None,
            },
        );
        let stops = stops
            .into_iter()
            .enumerate()
            .map(|(i, s)| StopTimeRecord { sequence: i as u32, ..s })
            .collect();
        ds.stop_times.insert(id.into(), stops);
    }

    fn chain(ds: &mut Dataset, ids: &[&str]) {
        for pair in ids.windows(2) {
            ds.trips.get_mut(pair[0]).unwrap().next = Some(pair[1].into());
            ds.trips.get_mut(pair[1]).unwrap().previous = Some(pair[0].into());
        }
    }

    /// Shonan-Shinjuku train passing through the Yokosuka line and back.
    fn yokosuka_block() -> Dataset {
        let mut ds = Dataset::new();
        add_trip(
            &mut ds,
            "JR-East.Takasaki.2801Y",
            "JR-East.Takasaki",
            "JR.0",
            vec![stop_time("JR-East.Takasaki.Omiya", "09:00", "09:01"), stop_time("JR-East.Takasaki.Akabane", "09:15", "09:16")],
        );
        add_trip(
            &mut ds,
            "JR-East.ShonanShinjuku.2801Y",
            "JR-East.Yokosuka",
            "JR.0",
            vec![stop_time("JR-East.Yokosuka.Akabane", "09:16", "09:17"), stop_time("JR-East.Yokosuka.Osaki", "09:40", "09:41")],
        );
        add_trip(
            &mut ds,
            "JR-East.Yokosuka.2801Y",
            "JR-East.Yokosuka",
            "JR.0",
            vec![stop_time("JR-East.Yokosuka.Osaki", "09:41", "09:42"), stop_time("JR-East.Yokosuka.Ofuna", "10:20", "10:20")],
        );
        chain(&mut ds, &["JR-East.Takasaki.2801Y", "JR-East.ShonanShinjuku.2801Y", "JR-East.Yokosuka.2801Y"]);
        ds.add_translations(Table::Trips, "JR-East.Yokosuka.2801Y", "trip_short_name", &Names::ja_en("快速", "Rapid"));
        ds
    }

    #[test]
    fn merges_same_route_run() {
        let mut ds = yokosuka_block();
        let config = SimplifyConfig::default();
        let report = BlockSimplifier::new(&config).simplify(&mut ds);

        assert_eq!(report.merged_runs, 1);
        assert_eq!(report.removed_trips, 1);
        assert!(!ds.trips.contains_key("JR-East.Yokosuka.2801Y"));
        assert!(ds.translations.is_empty());

        let base = &ds.trips["JR-East.ShonanShinjuku.2801Y"];
        assert_eq!(base.previous.as_deref(), Some("JR-East.Takasaki.2801Y"));
        assert_eq!(base.next, None);
        assert_eq!(base.block.as_deref(), Some("JR.0"));

        let stops = &ds.stop_times["JR-East.ShonanShinjuku.2801Y"];
        let ids: Vec<_> = stops.iter().map(|s| s.stop.as_str()).collect();
        assert_eq!(ids, vec!["JR-East.Yokosuka.Akabane", "JR-East.Yokosuka.Osaki", "JR-East.Yokosuka.Ofuna"]);
        assert_eq!(stops.iter().map(|s| s.sequence).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert_eq!(stops[1].arrival, t("09:40"));
        assert_eq!(stops[1].departure, t("09:42"));
    }

    #[test]
    fn different_headsigns_not_merged() {
        let mut ds = yokosuka_block();
        ds.trips.get_mut("JR-East.Yokosuka.2801Y").unwrap().headsign = "Zushi".into();

        let config = SimplifyConfig::default();
        let report = BlockSimplifier::new(&config).simplify(&mut ds);
        assert_eq!(report.merged_runs, 0);
        assert_eq!(ds.trips.len(), 3);
    }

    #[test]
    fn always_merge_routes_ignore_labels() {
        let mut ds = yokosuka_block();
        ds.trips.get_mut("JR-East.Yokosuka.2801Y").unwrap().headsign = "Zushi".into();

        let config = SimplifyConfig::new(vec!["JR-East.Yokosuka".into()], vec![]);
        let report = BlockSimplifier::new(&config).simplify(&mut ds);
        assert_eq!(report.merged_runs, 1);
        // Without tiers the larger id wins
        assert!(ds.trips.contains_key("JR-East.Yokosuka.2801Y"));
        assert_eq!(
            ds.trips["JR-East.Takasaki.2801Y"].next.as_deref(),
            Some("JR-East.Yokosuka.2801Y")
        );
    }

    #[test]
    fn different_calendars_not_merged() {
        let mut ds = yokosuka_block();
        ds.trips.get_mut("JR-East.Yokosuka.2801Y").unwrap().calendar = "Holiday".into();

        let config = SimplifyConfig::default();
        assert_eq!(BlockSimplifier::new(&config).simplify(&mut ds).merged_runs, 0);
    }

    #[test]
    fn lone_blocks_dissolved() {
        let mut ds = Dataset::new();
        add_trip(&mut ds, "A", "R1", "G.0", vec![stop_time("X.S1", "10:00", "10:00"), stop_time("X.S2", "10:10", "10:10")]);
        add_trip(&mut ds, "B", "R1", "G.0", vec![stop_time("X.S2", "10:10", "10:11"), stop_time("X.S3", "10:20", "10:20")]);
        add_trip(&mut ds, "C", "R2", "G.1", vec![stop_time("X.S5", "10:00", "10:00"), stop_time("X.S6", "10:10", "10:10")]);
        add_trip(&mut ds, "D", "R3", "G.1", vec![stop_time("X.S6", "10:11", "10:11"), stop_time("X.S7", "10:20", "10:20")]);

        let config = SimplifyConfig::default();
        let report = BlockSimplifier::new(&config).simplify(&mut ds);
        assert_eq!(report.dissolved_blocks, 1);
        assert_eq!(ds.trips["B"].block, None);
        assert_eq!(ds.trips["C"].block.as_deref(), Some("G.1"));
    }

    #[test]
    fn merge_collapses_only_consecutive_same_stops() {
        let merged = merge_stop_times(vec![
            stop_time("A.Shinagawa", "10:00", "10:00"),
            stop_time("A.Kawasaki", "10:10", "10:10"),
            stop_time("B.Kawasaki", "10:11", "10:12"),
            stop_time("B.Shinagawa", "10:20", "10:20"),
        ]);
        assert_eq!(merged.len(), 3);
        assert_eq!(merged[1].stop, "B.Kawasaki");
        assert_eq!(merged[1].arrival, t("10:10"));
        assert_eq!(merged[1].departure, t("10:12"));
        assert_eq!(merged[2].sequence, 2);
    }

    #[test]
    fn every_trip_numbered_from_zero_after_merge() {
        let mut ds = yokosuka_block();
        let report = BlockSimplifier::new(&SimplifyConfig::default()).simplify(&mut ds);
        assert_eq!(report.merged_runs, 1);
        assert_eq!(ds.stop_times.len(), 2);

        for stop_times in ds.stop_times.values() {
            let sequences: Vec<u32> = stop_times.iter().map(|s| s.sequence).collect();
            assert_eq!(sequences, (0..stop_times.len() as u32).collect::<Vec<_>>());
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        prop_compose! {
            /// A block of trips with random routes and labels, in time order.
            fn arb_block()(
                trips in prop::collection::vec((0..3usize, 0..2usize), 1..8),
            ) -> Dataset {
                let mut ds = Dataset::new();
                for (i, (route, label)) in trips.into_iter().enumerate() {
                    let id = format!("T{i}");
                    let start = 600 + i as u32 * 10;
                    let hm = |m: u32| format!("{:02}:{:02}", m / 60, m % 60);
                    add_trip(
                        &mut ds,
                        &id,
                        &format!("R{route}"),
                        "G.0",
                        vec![
                            stop_time(&format!("R{route}.S{i}"), &hm(start), &hm(start)),
                            stop_time(&format!("R{route}.S{}", i + 1), &hm(start + 9), &hm(start + 9)),
                        ],
                    );
                    ds.trips.get_mut(&id).unwrap().headsign = format!("H{label}");
                }
                ds
            }
        }

        proptest! {
            #[test]
            fn simplify_is_idempotent(mut ds in arb_block()) {
                let config = SimplifyConfig::default();
                let simplifier = BlockSimplifier::new(&config);
                simplifier.simplify(&mut ds);
                let once = ds.clone();

                let report = simplifier.simplify(&mut ds);
                prop_assert_eq!(report.merged_runs, 0);
                prop_assert_eq!(report.removed_trips, 0);
                prop_assert_eq!(ds, once);
            }

            #[test]
            fn merged_stop_times_are_contiguous(mut ds in arb_block()) {
                let config = SimplifyConfig::default();
                BlockSimplifier::new(&config).simplify(&mut ds);
                for stop_times in ds.stop_times.values() {
                    let sequences: Vec<u32> = stop_times.iter().map(|s| s.sequence).collect();
                    let expected: Vec<u32> = (0..stop_times.len() as u32).collect();
                    prop_assert_eq!(sequences, expected);
                }
            }
        }
    }
}
