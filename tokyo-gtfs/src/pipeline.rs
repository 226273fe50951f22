//! End-to-end conversion from source data to a [`Dataset`].
//!
//! Stages run in a fixed order:
//!
//! 1. load every configured source
//! 2. fold Sunday into Holiday
//! 3. register calendars
//! 4. reconcile declared links
//! 5. solve through-service blocks, one group at a time
//! 6. export stops and trips
//! 7. headsigns
//! 8. limited-express routes
//! 9. route merges
//! 10. block simplification
//! 11. calendar dates
//! 12. check exported agencies and routes against the curated tables

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::blocks::{BlockAssignment, BlockSolver, reconcile_links};
use crate::calendar::{CalendarResolver, DateRange, HolidaySet, merge_sunday_into_holiday};
use crate::config::PipelineConfig;
use crate::domain::{Calendar, Line, Station, Train, TrainType};
use crate::feed::{
    CalendarDate, Dataset, Route, StationGroup, Table, TripExporter, add_parent_stations,
    export_stations,
};
use crate::headsign::HeadsignGenerator;
use crate::provider::{Provider, ProviderError};
use crate::routes::{merge_routes, separate_limited_expresses};
use crate::simplify::BlockSimplifier;

/// Fatal pipeline errors.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("source {name}: {source}")]
    Provider {
        name: String,
        #[source]
        source: ProviderError,
    },

    /// Exported data references agencies or routes with no curated entry.
    #[error("missing local data: agencies {agencies:?}, routes {routes:?}")]
    MissingLocalData {
        agencies: Vec<String>,
        routes: Vec<String>,
    },
}

/// Everything read from the sources.
#[derive(Debug, Clone, Default)]
pub struct SourceData {
    pub trains: Vec<Train>,
    pub stations: Vec<Station>,
    pub calendars: Vec<Calendar>,
    pub train_types: Vec<TrainType>,
    pub lines: Vec<Line>,
    pub station_groups: Vec<StationGroup>,
    pub routes: Vec<Route>,
}

impl SourceData {
    /// Read everything a provider offers.
    pub fn load(provider: &dyn Provider) -> Result<Self, PipelineError> {
        let wrap = |source| PipelineError::Provider {
            name: provider.name().to_string(),
            source,
        };

        let data = Self {
            trains: provider.trains().map_err(wrap)?,
            stations: provider.stations().map_err(wrap)?,
            calendars: provider.calendars().map_err(wrap)?,
            train_types: provider.train_types().map_err(wrap)?,
            lines: provider.lines().map_err(wrap)?,
            station_groups: provider.station_groups().map_err(wrap)?,
            routes: provider.routes().map_err(wrap)?,
        };
        info!(
            provider = provider.name(),
            trains = data.trains.len(),
            stations = data.stations.len(),
            "loaded source"
        );
        Ok(data)
    }

    pub fn extend(&mut self, other: SourceData) {
        self.trains.extend(other.trains);
        self.stations.extend(other.stations);
        self.calendars.extend(other.calendars);
        self.train_types.extend(other.train_types);
        self.lines.extend(other.lines);
        self.station_groups.extend(other.station_groups);
        self.routes.extend(other.routes);
    }
}

/// Counters of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    pub trains_loaded: usize,
    pub blocks: usize,
    /// Through-service components that could not be turned into blocks.
    pub rejected: usize,
    pub trips_exported: usize,
    pub clones: usize,
    pub parent_stations: usize,
    pub headsigns: usize,
    pub limited_express_trips: usize,
    pub merged_route_trips: usize,
    /// Trips folded into another trip by block simplification.
    pub trips_merged: usize,
    /// Trips dropped for an invalid calendar, by agency.
    pub removed_by_agency: BTreeMap<String, usize>,
}

/// Runs every stage over the configured sources.
pub struct Pipeline<'a> {
    config: &'a PipelineConfig,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Load every configured source and convert it.
    ///
    /// `today` is the first feed day unless the config sets a start date.
    pub fn run(&self, today: NaiveDate) -> Result<(Dataset, PipelineReport), PipelineError> {
        let mut data = SourceData::default();
        for source in &self.config.sources {
            data.extend(SourceData::load(source.provider().as_ref())?);
        }
        self.run_with(data, today)
    }

    /// Convert already loaded source data.
    pub fn run_with(&self, mut data: SourceData, today: NaiveDate) -> Result<(Dataset, PipelineReport), PipelineError> {
        let config = self.config;
        let mut report = PipelineReport {
            trains_loaded: data.trains.len(),
            ..PipelineReport::default()
        };

        if config.merge_sunday {
            merge_sunday_into_holiday(&mut data.trains);
        }

        let range = DateRange::starting(config.start_date.unwrap_or(today), config.days);
        let mut resolver = CalendarResolver::new(range, &HolidaySet::new(config.holidays.iter().copied()));
        resolver.load_valid(&data.calendars);

        if config.reconcile_links {
            let changed = reconcile_links(&mut data.trains);
            debug!(changed, "reconciled trip links");
        }

        let assignment = self.solve_blocks(&data.trains, &mut report);

        let mut dataset = Dataset::new();
        self.insert_curated(&mut dataset, &data);
        export_stations(&mut dataset, &data.stations);
        report.parent_stations = add_parent_stations(&mut dataset, &data.station_groups);

        let stats = TripExporter::new(&data.lines, &assignment).export(&mut dataset, &mut resolver, &data.trains);
        report.trips_exported = stats.trips;
        report.clones = stats.clones;

        report.headsigns = HeadsignGenerator::new(&config.headsigns, &data.train_types).apply(&mut dataset);
        report.limited_express_trips = separate_limited_expresses(&mut dataset, &config.limited_expresses);
        report.merged_route_trips = merge_routes(&mut dataset, &config.route_merges);
        report.trips_merged = BlockSimplifier::new(&config.simplify).simplify(&mut dataset).removed_trips;

        export_calendar_dates(&mut dataset, &resolver);

        report.removed_by_agency = resolver.removed_by_agency().clone();
        for (agency, removed) in &report.removed_by_agency {
            warn!(agency = %agency, removed, "trips removed for invalid calendars");
        }

        check_local_data(&mut dataset)?;

        info!(
            trips = dataset.trips.len(),
            blocks = report.blocks,
            rejected = report.rejected,
            merged = report.trips_merged,
            "conversion finished"
        );
        Ok((dataset, report))
    }

    /// Solve blocks of every through-service group.
    fn solve_blocks(&self, trains: &[Train], report: &mut PipelineReport) -> BlockAssignment {
        let mut solvers: BTreeMap<&str, BlockSolver> = BTreeMap::new();
        for train in trains {
            let Some(group) = self.config.through_service.get(&train.route) else {
                continue;
            };
            solvers
                .entry(group.as_str())
                .or_insert_with(|| BlockSolver::new(group.as_str()))
                .add_train(train);
        }

        let mut assignment = BlockAssignment::default();
        for (group, solver) in solvers {
            let solved = solver.solve();
            debug!(
                group,
                blocks = solved.blocks.len(),
                rejected = solved.rejected.len(),
                "solved through-service group"
            );
            report.blocks += solved.blocks.len();
            report.rejected += solved.rejected.len();
            assignment.record(&solved);
        }
        assignment
    }

    /// Curated agencies and routes, plus the routes sources define.
    fn insert_curated(&self, dataset: &mut Dataset, data: &SourceData) {
        for agency in &self.config.agencies {
            dataset.agencies.insert(agency.id.clone(), agency.clone());
        }

        let lines: HashMap<&str, &Line> = data.lines.iter().map(|l| (l.id.as_str(), l)).collect();
        for route in self.config.routes.iter().chain(&data.routes) {
            if dataset.routes.contains_key(&route.id) {
                continue;
            }
            let mut route = route.clone();
            route.fill_text_color();
            if let Some(line) = lines.get(route.id.as_str()) {
                dataset.add_translations(Table::Routes, &route.id, "route_long_name", &line.names);
            }
            dataset.routes.insert(route.id.clone(), route);
        }
    }
}

/// Write the dates of every service still used by a trip.
fn export_calendar_dates(dataset: &mut Dataset, resolver: &CalendarResolver) {
    let used: BTreeSet<&str> = dataset.trips.values().map(|t| t.service.as_str()).collect();
    let dates: Vec<CalendarDate> = resolver
        .service_dates()
        .into_iter()
        .filter(|(service, _)| used.contains(service.as_str()))
        .flat_map(|(service, days)| {
            days.into_iter().map(move |date| CalendarDate {
                service: service.clone(),
                date,
            })
        })
        .collect();
    dataset.calendar_dates = dates;
}

/// Drop unused agencies and routes, then require an entry for every
/// referenced one.
fn check_local_data(dataset: &mut Dataset) -> Result<(), PipelineError> {
    let used_routes: BTreeSet<String> = dataset.used_routes().into_iter().map(String::from).collect();
    let unused: Vec<String> = dataset
        .routes
        .keys()
        .filter(|id| !used_routes.contains(*id))
        .cloned()
        .collect();
    for id in unused {
        dataset.routes.remove(&id);
        dataset.remove_translations(Table::Routes, &id);
    }

    let used_agencies: BTreeSet<String> = dataset.used_agencies().into_iter().map(String::from).collect();
    dataset.agencies.retain(|id, _| used_agencies.contains(id));

    let routes: Vec<String> = used_routes
        .into_iter()
        .filter(|id| !dataset.routes.contains_key(id))
        .collect();
    let agencies: Vec<String> = used_agencies
        .into_iter()
        .filter(|id| !dataset.agencies.contains_key(id))
        .collect();

    if routes.is_empty() && agencies.is_empty() {
        Ok(())
    } else {
        Err(PipelineError::MissingLocalData { agencies, routes })
    }
}
