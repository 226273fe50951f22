//! Pipeline configuration.
//!
//! Loaded from a JSON file. Every section is optional and falls back to
//! its default, so an empty object `{}` is a valid (if not very useful)
//! configuration.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;

use crate::feed::{Agency, Route};
use crate::headsign::HeadsignConfig;
use crate::provider::{MiniTokyoProvider, OdptBusProvider, OdptProvider, Provider};
use crate::routes::{LimitedExpress, MergeSource};
use crate::simplify::SimplifyConfig;

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Format of a data source directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Odpt,
    OdptBus,
    MiniTokyo,
}

/// One data source to load.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub path: PathBuf,
    /// Operator filter. Ignored by mini-tokyo-3d; ODPT sources use their
    /// built-in lists when unset.
    #[serde(default)]
    pub operators: Option<Vec<String>>,
}

impl SourceConfig {
    pub fn new(kind: SourceKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            operators: None,
        }
    }

    /// Build the provider reading this source.
    pub fn provider(&self) -> Box<dyn Provider> {
        match self.kind {
            SourceKind::Odpt => {
                let provider = OdptProvider::new(&self.path);
                match &self.operators {
                    Some(operators) => Box::new(provider.with_operators(operators.iter().cloned())),
                    None => Box::new(provider),
                }
            }
            SourceKind::OdptBus => {
                let provider = OdptBusProvider::new(&self.path);
                match &self.operators {
                    Some(operators) => Box::new(provider.with_operators(operators.iter().cloned())),
                    None => Box::new(provider),
                }
            }
            SourceKind::MiniTokyo => Box::new(MiniTokyoProvider::new(&self.path)),
        }
    }
}

/// Everything the pipeline needs besides the source data itself.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// First day of the feed. Today when unset.
    pub start_date: Option<NaiveDate>,

    /// Length of the feed in days.
    pub days: u32,

    /// Public holidays, outside the range or not.
    pub holidays: Vec<NaiveDate>,

    /// Through-service group of each route. Routes without a group are
    /// never linked into blocks.
    pub through_service: BTreeMap<String, String>,

    /// Add missing back-links between trains before solving blocks.
    pub reconcile_links: bool,

    /// Move Sunday trains to the Holiday calendar.
    pub merge_sunday: bool,

    /// Curated agencies; every exported agency must be listed.
    pub agencies: Vec<Agency>,

    /// Curated routes; every exported rail route must be listed.
    pub routes: Vec<Route>,

    pub simplify: SimplifyConfig,

    pub headsigns: HeadsignConfig,

    /// Destination route to the routes merged into it.
    pub route_merges: BTreeMap<String, Vec<MergeSource>>,

    /// New route id to the trips split off into it.
    pub limited_expresses: BTreeMap<String, LimitedExpress>,

    pub sources: Vec<SourceConfig>,
}

impl PipelineConfig {
    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&json).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            start_date: None,
            days: 365,
            holidays: Vec::new(),
            through_service: BTreeMap::new(),
            reconcile_links: false,
            merge_sunday: true,
            agencies: Vec::new(),
            routes: Vec::new(),
            simplify: SimplifyConfig::default(),
            headsigns: HeadsignConfig::default(),
            route_merges: BTreeMap::new(),
            limited_expresses: BTreeMap::new(),
            sources: Vec::new(),
        }
    }
}
