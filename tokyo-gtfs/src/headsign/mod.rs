//! Headsign generation.
//!
//! Headsigns combine the train type with destination names, in the feed's
//! default form and in every translated language. Loop lines show their
//! direction instead.

mod config;
mod generator;

pub use config::{HeadsignConfig, LoopDirections};
pub use generator::HeadsignGenerator;
