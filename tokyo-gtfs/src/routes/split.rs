//! Carving limited-express services out of their parent route.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use tracing::info;

use crate::domain::first_part;
use crate::feed::{Dataset, Route};

/// Which trips of a route belong to a separate limited-express route.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LimitedExpress {
    /// Route the trips currently belong to.
    pub root_route: String,
    /// Trips whose short name contains this text are moved.
    pub short_name_match: String,
}

/// Create every configured limited-express route and move its trips.
///
/// Trips outside blocks move on their own. A matching trip inside a block
/// takes its whole block along, and every trip of that block is given
/// the matching trip's direction. Returns the number of trips moved.
pub fn separate_limited_expresses(dataset: &mut Dataset, expresses: &BTreeMap<String, LimitedExpress>) -> usize {
    let mut total = 0;
    for (route_id, express) in expresses {
        insert_route(dataset, route_id);

        let trips = matching_trips(dataset, express);
        for id in &trips {
            if let Some(trip) = dataset.trips.get_mut(id) {
                trip.route = route_id.clone();
            }
        }

        info!(moved = trips.len(), route = %route_id, "separated limited express");
        total += trips.len();
    }
    total
}

fn insert_route(dataset: &mut Dataset, route_id: &str) {
    let agency = first_part(route_id);
    let short_name = route_id
        .split_once('.')
        .map(|(_, rest)| rest)
        .unwrap_or_default();

    dataset
        .routes
        .entry(route_id.to_string())
        .or_insert_with(|| Route::new(route_id, agency, short_name));
}

/// Ids of the trips to move. Fixes directions inside matched blocks.
fn matching_trips(dataset: &mut Dataset, express: &LimitedExpress) -> BTreeSet<String> {
    let mut solo = BTreeSet::new();
    let mut blocks: BTreeMap<String, Option<u8>> = BTreeMap::new();

    for trip in dataset.trips.values().filter(|t| {
        t.route == express.root_route && t.short_name.contains(express.short_name_match.as_str())
    }) {
        match &trip.block {
            Some(block) => {
                blocks.insert(block.clone(), trip.direction);
            }
            None => {
                solo.insert(trip.id.clone());
            }
        }
    }

    for trip in dataset.trips.values_mut() {
        if let Some(direction) = trip.block.as_ref().and_then(|b| blocks.get(b)) {
            trip.direction = *direction;
            solo.insert(trip.id.clone());
        }
    }
    solo
}
