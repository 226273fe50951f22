//! Folding near-duplicate routes into one.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use tracing::info;

use crate::feed::{Dataset, LocationType, Table};

/// A route to be merged into another.
///
/// Deserializes from either a bare route id or a full object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "MergeSourceRepr")]
pub struct MergeSource {
    pub id: String,
    /// Swap direction 0 and 1 of the moved trips.
    pub reverse_direction: bool,
    /// Mark the moved trips as exceptional.
    pub exceptional: bool,
}

impl MergeSource {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            reverse_direction: false,
            exceptional: false,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MergeSourceRepr {
    Id(String),
    Full {
        id: String,
        #[serde(default)]
        reverse_direction: bool,
        #[serde(default)]
        exceptional: bool,
    },
}

impl From<MergeSourceRepr> for MergeSource {
    fn from(repr: MergeSourceRepr) -> Self {
        match repr {
            MergeSourceRepr::Id(id) => MergeSource::new(id),
            MergeSourceRepr::Full {
                id,
                reverse_direction,
                exceptional,
            } => MergeSource {
                id,
                reverse_direction,
                exceptional,
            },
        }
    }
}

/// Apply every configured merge. Returns the number of trips moved.
pub fn merge_routes(dataset: &mut Dataset, merges: &BTreeMap<String, Vec<MergeSource>>) -> usize {
    let mut total = 0;
    for (dst, sources) in merges {
        for source in sources {
            let moved = move_trips(dataset, dst, source);
            remap_stops(dataset, &source.id, dst);
            info!(moved, from = %source.id, to = %dst, "merged route");
            total += moved;
        }
    }
    total
}

fn move_trips(dataset: &mut Dataset, dst: &str, source: &MergeSource) -> usize {
    let mut moved = 0;
    for trip in dataset.trips.values_mut().filter(|t| t.route == source.id) {
        trip.route = dst.to_string();
        if source.reverse_direction {
            trip.direction = trip.direction.and_then(|d| match d {
                0 => Some(1),
                1 => Some(0),
                _ => None,
            });
        }
        if source.exceptional {
            trip.exceptional = true;
        }
        moved += 1;
    }

    dataset.routes.remove(&source.id);
    dataset.remove_translations(Table::Routes, &source.id);
    moved
}

/// Rename stops `"{src}.X"` to `"{dst}.X"`.
///
/// When the target stop already exists the source stop is dropped and
/// its stop-times are pointed at the target instead.
fn remap_stops(dataset: &mut Dataset, src: &str, dst: &str) {
    let src_prefix = format!("{src}.");
    let dst_prefix = format!("{dst}.");

    let moving: BTreeSet<String> = dataset
        .stops
        .values()
        .filter(|s| s.location_type == LocationType::Stop && s.id.starts_with(&src_prefix))
        .map(|s| s.id.clone())
        .collect();

    let mut renames: BTreeMap<String, String> = BTreeMap::new();
    for src_stop in moving {
        let dst_stop = format!("{dst_prefix}{}", &src_stop[src_prefix.len()..]);

        if dataset.stops.contains_key(&dst_stop) {
            dataset.stops.remove(&src_stop);
            dataset.remove_translations(Table::Stops, &src_stop);
        } else if let Some(mut stop) = dataset.stops.remove(&src_stop) {
            stop.id = dst_stop.clone();
            dataset.stops.insert(dst_stop.clone(), stop);
            dataset.rename_translations(Table::Stops, &src_stop, &dst_stop);
        }
        renames.insert(src_stop, dst_stop);
    }

    if renames.is_empty() {
        return;
    }
    for stop_time in dataset.stop_times.values_mut().flatten() {
        if let Some(dst_stop) = renames.get(&stop_time.stop) {
            stop_time.stop = dst_stop.clone();
        }
    }
    for stop in dataset.stops.values_mut() {
        if let Some(dst_stop) = stop.parent.as_ref().and_then(|p| renames.get(p)) {
            stop.parent = Some(dst_stop.clone());
        }
    }
}
