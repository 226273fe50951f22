//! Tokyo rail and bus schedules as GTFS.
//!
//! Converts ODPT and mini-tokyo-3d data into an in-memory GTFS dataset:
//! through-service trains are linked into blocks, calendars are resolved
//! to one active service per route and date, and headsigns are generated
//! in every supported language.

pub mod blocks;
pub mod calendar;
pub mod config;
pub mod domain;
pub mod feed;
pub mod headsign;
pub mod pipeline;
pub mod provider;
pub mod routes;
pub mod simplify;
