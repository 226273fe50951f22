//! Block resolution errors.

/// A connected component of trains that cannot be turned into blocks.
///
/// These abort the current component only. The solver records them and
/// moves on to the next seed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BlockError {
    /// A train was reached twice while expanding a component.
    #[error("expanding block around train {train}: circular reference to {reference}")]
    CircularReference { train: String, reference: String },

    /// The component forks more than once.
    #[error("block around {seed} has {forks} forks, at most one is allowed")]
    TooManyForks { seed: String, forks: usize },

    /// A linear walk hit a node with several links.
    #[error("block around {seed}: unexpected fork at {train}")]
    UnexpectedFork { seed: String, train: String },
}
