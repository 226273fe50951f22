//! ODPT rail provider.
//!
//! Reads the JSON dumps of the Public Transportation Open Data Center API
//! (`TrainTimetable.json`, `Station.json`, `Calendar.json`,
//! `TrainType.json` and `Railway.json`) from one directory. Every record is
//! filtered to the configured operators.

mod convert;
mod types;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::{Calendar, Line, Station, Train, TrainType, strip_prefix};

use super::{Provider, ProviderError, keep_valid, read_json};

pub(crate) use convert::{first_name, parse_times};
use convert::{
    calendar_agency, convert_calendar, convert_railway, convert_station, convert_train,
    convert_train_type, is_specific,
};
use types::{CalendarRecord, RailwayRecord, StationRecord, TrainTimetable, TrainTypeRecord};

/// Directory-backed ODPT rail source.
#[derive(Debug, Clone)]
pub struct OdptProvider {
    dir: PathBuf,
    operators: BTreeSet<String>,
}

impl OdptProvider {
    /// Operators whose ODPT rail data is complete enough to use.
    pub const DEFAULT_OPERATORS: [&'static str; 6] = [
        "Toei",
        "TokyoMetro",
        "TWR",
        "MIR",
        "YokohamaMunicipal",
        "TamaMonorail",
    ];

    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            operators: Self::DEFAULT_OPERATORS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Replace the operator filter.
    pub fn with_operators<S: Into<String>>(mut self, operators: impl IntoIterator<Item = S>) -> Self {
        self.operators = operators.into_iter().map(Into::into).collect();
        self
    }

    fn provides(&self, operator: &str) -> bool {
        self.operators.contains(strip_prefix(operator))
    }
}

impl Provider for OdptProvider {
    fn name(&self) -> &str {
        "odpt"
    }

    fn trains(&self) -> Result<Vec<Train>, ProviderError> {
        let records: Vec<TrainTimetable> = read_json(&self.dir.join("TrainTimetable.json"))?;
        let trains = keep_valid(
            "train",
            records
                .iter()
                .filter(|r| self.provides(&r.operator))
                .map(|r| (r.same_as.clone(), convert_train(r))),
        );
        debug!(provider = self.name(), count = trains.len(), "loaded trains");
        Ok(trains)
    }

    fn stations(&self) -> Result<Vec<Station>, ProviderError> {
        let records: Vec<StationRecord> = read_json(&self.dir.join("Station.json"))?;
        Ok(records
            .iter()
            .filter(|r| self.provides(&r.operator))
            .map(convert_station)
            .collect())
    }

    fn calendars(&self) -> Result<Vec<Calendar>, ProviderError> {
        read_calendars(&self.dir.join("Calendar.json"), &self.operators)
    }

    fn train_types(&self) -> Result<Vec<TrainType>, ProviderError> {
        let records: Vec<TrainTypeRecord> = read_json(&self.dir.join("TrainType.json"))?;
        Ok(records
            .iter()
            .filter(|r| self.provides(&r.operator))
            .map(convert_train_type)
            .collect())
    }

    fn lines(&self) -> Result<Vec<Line>, ProviderError> {
        let records: Vec<RailwayRecord> = read_json(&self.dir.join("Railway.json"))?;
        Ok(records
            .iter()
            .filter(|r| self.provides(&r.operator))
            .map(convert_railway)
            .collect())
    }
}

/// Read an ODPT `Calendar.json`.
///
/// Weekly calendars are always kept. Specific calendars are kept only when
/// their operator is in `operators`.
pub(crate) fn read_calendars(
    path: &Path,
    operators: &BTreeSet<String>,
) -> Result<Vec<Calendar>, ProviderError> {
    let records: Vec<CalendarRecord> = read_json(path)?;
    Ok(keep_valid(
        "calendar",
        records
            .iter()
            .filter(|r| !is_specific(r) || calendar_agency(r).is_some_and(|a| operators.contains(a)))
            .map(|r| (r.same_as.clone(), convert_calendar(r))),
    ))
}
