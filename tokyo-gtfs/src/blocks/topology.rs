//! Turning an expanded component into blocks.
//!
//! Three shapes are accepted:
//!
//! ```text
//! flat:   o--o--o--o--o
//!
//! split:  o--o--o--o--o
//!                \-o--o
//!
//! join:   o--o--o--o--o
//!         o--o-/
//! ```
//!
//! Around a fork the shared leg is cloned once per unique leg, and every
//! copy takes the destinations of the branch it belongs to.

use super::error::BlockError;
use super::graph::{BlockGraph, NodeIdx};

/// A node's place in one planned block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PlannedMember {
    pub(crate) node: NodeIdx,
    /// Appended to the trip id for clones, empty otherwise.
    pub(crate) suffix: String,
    pub(crate) destinations: Vec<String>,
}

/// Split a component into blocks, each listed in travel order.
pub(crate) fn plan_blocks(graph: &BlockGraph) -> Result<Vec<Vec<PlannedMember>>, BlockError> {
    let seed = graph.node(0).train.id.as_str();

    match graph.forks().as_slice() {
        [] => plan_flat(graph, seed).map(|block| vec![block]),
        [fork] => plan_around_fork(graph, *fork, seed),
        forks => Err(BlockError::TooManyForks {
            seed: seed.to_string(),
            forks: forks.len(),
        }),
    }
}

fn plan_flat(graph: &BlockGraph, seed: &str) -> Result<Vec<PlannedMember>, BlockError> {
    let head = graph
        .nodes()
        .find(|(_, n)| n.prev.is_empty())
        .map(|(idx, _)| idx)
        .unwrap_or(0);

    let chain = graph.linked_forward(head, seed)?;
    Ok(chain
        .into_iter()
        .map(|node| PlannedMember {
            node,
            suffix: String::new(),
            destinations: graph.node(node).train.destinations.clone(),
        })
        .collect())
}

fn plan_around_fork(
    graph: &BlockGraph,
    fork: NodeIdx,
    seed: &str,
) -> Result<Vec<Vec<PlannedMember>>, BlockError> {
    let is_split = graph.node(fork).next.len() > 1;

    let (shared, unique) = if is_split {
        let shared = graph.linked_backward(fork, seed)?;
        let unique = graph
            .node(fork)
            .next
            .iter()
            .map(|&n| graph.linked_forward(n, seed))
            .collect::<Result<Vec<_>, _>>()?;
        (shared, unique)
    } else {
        let shared = graph.linked_forward(fork, seed)?;
        let unique = graph
            .node(fork)
            .prev
            .iter()
            .map(|&n| graph.linked_backward(n, seed))
            .collect::<Result<Vec<_>, _>>()?;
        (shared, unique)
    };

    let mut blocks = Vec::with_capacity(unique.len());
    for (idx, leg) in unique.iter().enumerate() {
        let number = idx + 1;
        let suffix = if number == 1 {
            String::new()
        } else {
            format!(".{number}")
        };

        // Split legs end at their own terminal, joined legs end at the shared one
        let terminal = if is_split { leg.last() } else { shared.last() };
        let destinations = terminal
            .map(|&n| graph.node(n).train.destinations.clone())
            .unwrap_or_default();

        let shared_copy = shared.iter().map(|&node| PlannedMember {
            node,
            suffix: suffix.clone(),
            destinations: destinations.clone(),
        });
        let leg_members = leg.iter().map(|&node| PlannedMember {
            node,
            suffix: String::new(),
            destinations: destinations.clone(),
        });

        let block: Vec<PlannedMember> = if is_split {
            shared_copy.chain(leg_members).collect()
        } else {
            leg_members.chain(shared_copy).collect()
        };
        blocks.push(block);
    }

    Ok(blocks)
}
