//! The output feed.
//!
//! [`Dataset`] is an in-memory, GTFS-shaped store. Trains and stations are
//! written into it by [`TripExporter`] and [`export_stations`]; the later
//! pipeline stages then edit it in place.

mod dataset;
mod export;
mod stations;

pub use dataset::{
    Agency, CalendarDate, Dataset, LocationType, Route, RouteType, Stop, StopTimeRecord, Table,
    Translation, Trip, text_color_for,
};
pub use export::{ExportStats, TripExporter, export_stations};
pub use stations::{StationGroup, add_parent_stations};
