//! Moving trips between routes.
//!
//! [`merge_routes`] folds configured source routes into a destination
//! route, [`separate_limited_expresses`] splits limited-express trips off
//! their parent route.

mod merge;
mod split;

pub use merge::{MergeSource, merge_routes};
pub use split::{LimitedExpress, separate_limited_expresses};
