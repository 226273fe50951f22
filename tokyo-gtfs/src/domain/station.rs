//! Stations, lines and train types as declared by the sources.

use serde::{Deserialize, Serialize};

use super::Names;

/// A stop served by trains or buses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    pub id: String,
    pub names: Names,
    pub lat: f64,
    pub lon: f64,
    /// Stop code shown to riders, e.g. "G-09".
    pub code: Option<String>,
}

impl Station {
    /// A station with no coordinates or code.
    pub fn new(id: impl Into<String>, names: Names) -> Self {
        Self {
            id: id.into(),
            names,
            lat: 0.0,
            lon: 0.0,
            code: None,
        }
    }

    /// Whether the source gave a usable position.
    pub fn has_position(&self) -> bool {
        self.lat != 0.0 || self.lon != 0.0
    }
}

/// A railway or bus line, with the direction tags its trains use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    pub id: String,
    pub names: Names,
    /// Direction tag mapped to GTFS direction 0.
    pub ascending: Option<String>,
    /// Direction tag mapped to GTFS direction 1.
    pub descending: Option<String>,
}

impl Line {
    /// GTFS direction id for a train's direction tag.
    ///
    /// # Examples
    ///
    /// ```
    /// use tokyo_gtfs::domain::{Line, Names};
    ///
    /// let line = Line {
    ///     id: "JR-East.Yamanote".into(),
    ///     names: Names::default(),
    ///     ascending: Some("OuterLoop".into()),
    ///     descending: Some("InnerLoop".into()),
    /// };
    /// assert_eq!(line.direction_id("OuterLoop"), Some(0));
    /// assert_eq!(line.direction_id("InnerLoop"), Some(1));
    /// assert_eq!(line.direction_id("Northbound"), None);
    /// ```
    pub fn direction_id(&self, direction: &str) -> Option<u8> {
        if self.ascending.as_deref() == Some(direction) {
            Some(0)
        } else if self.descending.as_deref() == Some(direction) {
            Some(1)
        } else {
            None
        }
    }
}

/// A named train category, e.g. "Rapid" or "Limited Express".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainType {
    pub id: String,
    pub names: Names,
}
