//! Parent stations built from groups of stops.

use std::collections::{BTreeMap, HashSet};

use tracing::warn;

use crate::domain::station_stem;

use super::dataset::{Dataset, LocationType, Stop, Table};

/// Stops considered to be one interchange, as sub-groups of stop ids.
pub type StationGroup = Vec<Vec<String>>;

/// Create parent stations for every group of related stops.
///
/// Stops of a group are re-split by [`station_stem`], so that one group
/// spanning several physically distinct stations yields several parents.
/// Only stems with at least two stops get a parent. Returns the number of
/// parents created.
pub fn add_parent_stations(dataset: &mut Dataset, groups: &[StationGroup]) -> usize {
    let mut used_ids: HashSet<String> = dataset.stops.keys().cloned().collect();
    let mut created = 0;

    for group in groups {
        let mut by_stem: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for id in group.iter().flatten() {
            by_stem.entry(station_stem(id)).or_default().push(id);
        }

        for (stem, children) in by_stem {
            if children.len() < 2 {
                continue;
            }

            let Some(parent) = make_parent(dataset, stem, &children, &used_ids) else {
                continue;
            };
            used_ids.insert(parent.id.clone());
            dataset.copy_translations(Table::Stops, children[0], &parent.id);
            for child in &children {
                if let Some(stop) = dataset.stops.get_mut(*child) {
                    stop.parent = Some(parent.id.clone());
                }
            }
            dataset.stops.insert(parent.id.clone(), parent);
            created += 1;
        }
    }

    created
}

fn make_parent(dataset: &Dataset, stem: &str, children: &[&str], used_ids: &HashSet<String>) -> Option<Stop> {
    let mut stops = Vec::with_capacity(children.len());
    for child in children {
        match dataset.stops.get(*child) {
            Some(stop) => stops.push(stop),
            None => {
                warn!(stop = %child, "invalid stop in group definition");
                return None;
            }
        }
    }

    Some(Stop {
        id: non_conflicting_id(used_ids, stem),
        name: stops[0].name.clone(),
        lat: mean_non_zero(stops.iter().map(|s| s.lat)),
        lon: mean_non_zero(stops.iter().map(|s| s.lon)),
        code: None,
        location_type: LocationType::Station,
        parent: None,
    })
}

/// `base`, or `base.1`, `base.2`... whichever is free first.
fn non_conflicting_id(used: &HashSet<String>, base: &str) -> String {
    if !used.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}.{n}"))
        .find(|id| !used.contains(id))
        .unwrap_or_else(|| base.to_string())
}

fn mean_non_zero(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values
        .filter(|v| *v != 0.0)
        .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    if count == 0 { 0.0 } else { sum / f64::from(count) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Language, Names};

    fn add_stop(ds: &mut Dataset, id: &str, lat: f64, lon: f64) {
        ds.stops.insert(
            id.into(),
            Stop {
                id: id.into(),
                name: format!("name of {id}"),
                lat,
                lon,
                code: None,
                location_type: LocationType::Stop,
                parent: None,
            },
        );
    }

    fn group(ids: &[&[&str]]) -> StationGroup {
        ids.iter()
            .map(|sub| sub.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn parent_created_for_shared_stem() {
        let mut ds = Dataset::new();
        add_stop(&mut ds, "Toei.Oedo.Tochomae", 35.0, 139.0);
        add_stop(&mut ds, "Toei.Oedo.Tochomae.1", 0.0, 0.0);
        add_stop(&mut ds, "TokyoMetro.Marunouchi.NishiShinjuku", 35.2, 139.2);
        ds.add_translations(Table::Stops, "Toei.Oedo.Tochomae", "stop_name", &Names::ja_en("都庁前", "Tochomae"));

        let created = add_parent_stations(
            &mut ds,
            &[group(&[&["Toei.Oedo.Tochomae", "TokyoMetro.Marunouchi.NishiShinjuku"], &["Toei.Oedo.Tochomae.1"]])],
        );
        assert_eq!(created, 1);

        let parent = &ds.stops["Tochomae"];
        assert_eq!(parent.location_type, LocationType::Station);
        assert_eq!(parent.lat, 35.0);
        assert_eq!(parent.name, "name of Toei.Oedo.Tochomae");
        assert_eq!(ds.stops["Toei.Oedo.Tochomae.1"].parent.as_deref(), Some("Tochomae"));
        assert_eq!(ds.stops["TokyoMetro.Marunouchi.NishiShinjuku"].parent, None);
        assert_eq!(ds.translation(Table::Stops, "Tochomae", "stop_name", Language::English), Some("Tochomae"));
    }

    #[test]
    fn parent_ids_do_not_conflict() {
        let mut ds = Dataset::new();
        for id in ["A.Shibuya", "B.Shibuya", "C.Shibuya", "D.Shibuya"] {
            add_stop(&mut ds, id, 35.0, 139.0);
        }
        let groups = [group(&[&["A.Shibuya", "B.Shibuya"]]), group(&[&["C.Shibuya", "D.Shibuya"]])];
        assert_eq!(add_parent_stations(&mut ds, &groups), 2);
        assert!(ds.stops.contains_key("Shibuya"));
        assert_eq!(ds.stops["D.Shibuya"].parent.as_deref(), Some("Shibuya.1"));
    }

    #[test]
    fn unknown_child_skips_group() {
        let mut ds = Dataset::new();
        add_stop(&mut ds, "A.Ueno", 35.0, 139.0);
        assert_eq!(add_parent_stations(&mut ds, &[group(&[&["A.Ueno", "B.Ueno"]])]), 0);
        assert_eq!(ds.stops.len(), 1);
    }

    #[test]
    fn mean_skips_zeros() {
        assert_eq!(mean_non_zero([0.0, 2.0, 4.0].into_iter()), 3.0);
        assert_eq!(mean_non_zero([0.0].into_iter()), 0.0);
    }
}
