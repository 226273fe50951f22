//! Source data providers.
//!
//! A provider reads one upstream dataset from a directory of JSON files and
//! turns it into canonical [`Train`]s, [`Station`]s and friends. Three
//! sources are supported:
//!
//! - [`OdptProvider`]: the ODPT rail API dumps (`TrainTimetable.json` etc.)
//! - [`OdptBusProvider`]: the ODPT bus API dumps (`BusTimetable.json` etc.)
//! - [`MiniTokyoProvider`]: the mini-tokyo-3d `data/` directory
//!
//! Files are read on every call, nothing is cached. Records that cannot be
//! converted are skipped with a warning; only unreadable files are errors.

mod error;
mod mini_tokyo;
mod odpt;
mod odpt_bus;

use std::path::Path;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::{Calendar, Line, Station, Train, TrainType};
use crate::feed::{Route, StationGroup};

pub use error::{ConversionError, ProviderError};
pub use mini_tokyo::MiniTokyoProvider;
pub use odpt::OdptProvider;
pub use odpt_bus::OdptBusProvider;

/// A source of canonical schedule data.
pub trait Provider {
    /// Short name used in logs.
    fn name(&self) -> &str;

    fn trains(&self) -> Result<Vec<Train>, ProviderError>;

    fn stations(&self) -> Result<Vec<Station>, ProviderError>;

    fn calendars(&self) -> Result<Vec<Calendar>, ProviderError>;

    fn train_types(&self) -> Result<Vec<TrainType>, ProviderError>;

    fn lines(&self) -> Result<Vec<Line>, ProviderError>;

    /// Groups of stops forming one interchange.
    fn station_groups(&self) -> Result<Vec<StationGroup>, ProviderError> {
        Ok(Vec::new())
    }

    /// Routes the source defines itself, for sources too large to curate.
    fn routes(&self) -> Result<Vec<Route>, ProviderError> {
        Ok(Vec::new())
    }
}

/// Read and deserialize a whole JSON file.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ProviderError> {
    debug!(path = %path.display(), "loading");
    let json = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&json).map_err(|source| ProviderError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Keep successfully converted records, warning about the rest.
pub(crate) fn keep_valid<T>(
    kind: &'static str,
    converted: impl IntoIterator<Item = (String, Result<T, ConversionError>)>,
) -> Vec<T> {
    converted
        .into_iter()
        .filter_map(|(id, result)| match result {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(kind, id = %id, error = %e, "skipping record");
                None
            }
        })
        .collect()
}

/// A JSON value given either alone or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub(crate) enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::One(value) => vec![value],
            OneOrMany::Many(values) => values,
        }
    }
}
