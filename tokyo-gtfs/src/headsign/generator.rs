//! Rider-facing destination text.

use std::collections::{HashMap, HashSet};

use tracing::{debug, error};

use crate::domain::{Language, Names, TrainType, last_part};
use crate::feed::{Dataset, Table, Trip};

use super::config::{HeadsignConfig, LoopDirections};

/// A language a headsign is rendered in, or the feed-level default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Form {
    Default,
    In(Language),
}

impl Form {
    fn pick(self, names: &Names) -> String {
        match self {
            Form::Default => names.default_name(),
            Form::In(lang) => names.get(lang).to_string(),
        }
    }

    /// Latin-style brackets, as opposed to `【】` and `・`.
    fn is_latin(self) -> bool {
        matches!(self, Form::Default | Form::In(Language::English | Language::Korean))
    }
}

/// Fills `headsign` and its translations on every trip.
pub struct HeadsignGenerator<'a> {
    config: &'a HeadsignConfig,
    train_types: HashMap<&'a str, &'a Names>,
    reported_types: HashSet<String>,
}

impl<'a> HeadsignGenerator<'a> {
    pub fn new(config: &'a HeadsignConfig, train_types: &'a [TrainType]) -> Self {
        Self {
            config,
            train_types: train_types.iter().map(|t| (t.id.as_str(), &t.names)).collect(),
            reported_types: HashSet::new(),
        }
    }

    /// Generate headsigns for all trips. Returns the number of trips updated.
    pub fn apply(&mut self, dataset: &mut Dataset) -> usize {
        let stop_names = self.stop_names(dataset);
        let ids: Vec<String> = dataset.trips.keys().cloned().collect();

        for id in &ids {
            let Some(trip) = dataset.trips.get(id) else {
                continue;
            };
            self.check_train_type(trip);

            let default = self.render(trip, &stop_names, Form::Default);
            let mut translated = Names::default();
            for lang in Language::ALL {
                translated.set(lang, self.render(trip, &stop_names, Form::In(lang)));
            }

            if let Some(trip) = dataset.trips.get_mut(id) {
                trip.headsign = default;
            }
            dataset.set_translations(Table::Trips, id, "trip_headsign", &translated);
        }

        debug!(trips = ids.len(), "generated headsigns");
        ids.len()
    }

    /// Stop names in every language, with configured overrides applied.
    fn stop_names(&self, dataset: &Dataset) -> HashMap<String, Names> {
        let mut names: HashMap<String, Names> = dataset
            .stops
            .values()
            .map(|s| (s.id.clone(), Names::ja_en(s.name.clone(), "")))
            .collect();

        let mut translated: HashSet<&str> = HashSet::new();
        for t in dataset
            .translations
            .iter()
            .filter(|t| t.table == Table::Stops && t.field == "stop_name")
        {
            if let Some(entry) = names.get_mut(&t.record) {
                if translated.insert(t.record.as_str()) {
                    *entry = Names::default();
                }
                entry.set(t.language, t.text.clone());
            }
        }

        for (id, entry) in names.iter_mut() {
            if let Some(replacement) = self.config.override_for(id) {
                *entry = replacement.clone();
            }
        }
        names
    }

    fn check_train_type(&mut self, trip: &Trip) {
        let Some(train_type) = trip.train_type.as_deref() else {
            return;
        };
        if !self.train_types.contains_key(train_type) && self.reported_types.insert(train_type.to_string()) {
            error!(train_type, trip = %trip.id, "invalid train type");
        }
    }

    fn render(&self, trip: &Trip, stops: &HashMap<String, Names>, form: Form) -> String {
        let looped = self.config.loop_lines.get(&trip.route).zip(trip.direction);
        match looped {
            Some((directions, direction)) => self
                .render_loop(trip, directions, direction, stops, form)
                .unwrap_or_else(|| self.render_regular(trip, stops, form)),
            None => self.render_regular(trip, stops, form),
        }
    }

    fn render_regular(&self, trip: &Trip, stops: &HashMap<String, Names>, form: Form) -> String {
        if trip.destinations.is_empty() {
            return trip.sign.as_ref().map(|s| form.pick(s)).unwrap_or_default();
        }

        let (open, close, separator) = if form.is_latin() {
            ("(", ") ", " / ")
        } else {
            ("【", "】", "・")
        };

        let type_name = trip
            .train_type
            .as_deref()
            .and_then(|t| self.train_types.get(t))
            .map(|names| form.pick(names))
            .unwrap_or_default();
        let type_part = if type_name.is_empty() {
            String::new()
        } else {
            format!("{open}{type_name}{close}")
        };

        let destinations: Vec<String> = trip
            .destinations
            .iter()
            .map(|d| stop_name(stops, d, form))
            .filter(|name| !name.is_empty())
            .collect();
        let destination_part = destinations.join(separator);
        if destination_part.is_empty() {
            return String::new();
        }

        format!("{type_part}{destination_part}")
    }

    /// `None` when the direction is not one of the loop's two.
    fn render_loop(
        &self,
        trip: &Trip,
        directions: &LoopDirections,
        direction: u8,
        stops: &HashMap<String, Names>,
        form: Form,
    ) -> Option<String> {
        let direction = form.pick(directions.get(direction)?);

        // Continues as another loop trip, so there is no last stop to show
        let Some(last) = trip.destinations.last().filter(|_| trip.next.is_none()) else {
            return Some(direction);
        };

        let last = stop_name(stops, last, form);
        if last.is_empty() {
            return Some(direction);
        }
        let latin = matches!(form, Form::In(Language::English | Language::Korean));
        Some(if latin {
            format!("({direction}) {last}")
        } else {
            format!("【{direction}】{last}")
        })
    }
}

fn stop_name(stops: &HashMap<String, Names>, id: &str, form: Form) -> String {
    match stops.get(id) {
        Some(names) => form.pick(names),
        None => {
            debug!(stop = id, "destination without a stop name");
            last_part(id).to_string()
        }
    }
}
