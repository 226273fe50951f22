//! Block simplification.
//!
//! Runs after blocks are exported and routes are rearranged, so that
//! trips split only by through-service bookkeeping appear as one trip.

mod config;
mod merge;

pub use config::SimplifyConfig;
pub use merge::{BlockSimplifier, SimplifyReport, merge_stop_times};
