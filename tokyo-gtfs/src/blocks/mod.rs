//! Through-service block resolution.
//!
//! Trains that continue as other trains (often across operators) are
//! linked into directed graphs, either through the `previous`/`next` ids
//! declared by the source or by matching one train's last stop against
//! another's first stop. Each connected component becomes one or more
//! GTFS blocks. Only flat chains and single split/join forks are accepted.

mod error;
mod graph;
mod links;
mod signature;
mod solver;
mod topology;

#[cfg(test)]
mod solver_tests;

pub use error::BlockError;
pub use links::reconcile_links;
pub use signature::{StopTimeHash, TrainShort};
pub use solver::{
    Block, BlockAssignment, BlockMember, BlockSolver, Membership, RejectedComponent, SolveReport,
};
