//! Arena-backed graph of trains linked by through-service.

use std::collections::HashMap;

use super::TrainShort;
use super::error::BlockError;

/// Index of a node inside a [`BlockGraph`].
pub(crate) type NodeIdx = usize;

/// Direction of a through-service link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub(crate) fn opposite(self) -> Self {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct BlockNode {
    pub(crate) train: TrainShort,
    pub(crate) prev: Vec<NodeIdx>,
    pub(crate) next: Vec<NodeIdx>,
}

/// One connected component, owned by a single resolution pass.
#[derive(Debug, Clone)]
pub(crate) struct BlockGraph {
    nodes: Vec<BlockNode>,
    by_id: HashMap<String, NodeIdx>,
}

impl BlockGraph {
    /// A graph holding only the seed train, at index 0.
    pub(crate) fn new(seed: TrainShort) -> Self {
        let mut graph = Self {
            nodes: Vec::new(),
            by_id: HashMap::new(),
        };
        graph.push(seed);
        graph
    }

    pub(crate) fn push(&mut self, train: TrainShort) -> NodeIdx {
        let idx = self.nodes.len();
        self.by_id.insert(train.id.clone(), idx);
        self.nodes.push(BlockNode {
            train,
            prev: Vec::new(),
            next: Vec::new(),
        });
        idx
    }

    /// Link `to` after `from` (forward) or before it (backward).
    pub(crate) fn link(&mut self, from: NodeIdx, to: NodeIdx, direction: Direction) {
        match direction {
            Direction::Forward => {
                self.nodes[from].next.push(to);
                self.nodes[to].prev.push(from);
            }
            Direction::Backward => {
                self.nodes[from].prev.push(to);
                self.nodes[to].next.push(from);
            }
        }
    }

    pub(crate) fn contains(&self, id: &str) -> bool {
        self.by_id.contains_key(id)
    }

    pub(crate) fn node(&self, idx: NodeIdx) -> &BlockNode {
        &self.nodes[idx]
    }

    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    pub(crate) fn nodes(&self) -> impl Iterator<Item = (NodeIdx, &BlockNode)> {
        self.nodes.iter().enumerate()
    }

    /// Nodes where the graph forks.
    ///
    /// A node with several previous and several next trains forks twice
    /// (once at each end) and is listed twice.
    pub(crate) fn forks(&self) -> Vec<NodeIdx> {
        let splits = self.nodes().filter(|(_, n)| n.next.len() > 1).map(|(i, _)| i);
        let joins = self.nodes().filter(|(_, n)| n.prev.len() > 1).map(|(i, _)| i);
        splits.chain(joins).collect()
    }

    /// Walk forward from `start` (inclusive) until the chain ends.
    pub(crate) fn linked_forward(&self, start: NodeIdx, seed: &str) -> Result<Vec<NodeIdx>, BlockError> {
        self.walk(start, seed, |n| &n.next)
    }

    /// Walk backward from `start` (inclusive), returned in forward order.
    pub(crate) fn linked_backward(&self, start: NodeIdx, seed: &str) -> Result<Vec<NodeIdx>, BlockError> {
        let mut chain = self.walk(start, seed, |n| &n.prev)?;
        chain.reverse();
        Ok(chain)
    }

    fn walk(
        &self,
        start: NodeIdx,
        seed: &str,
        links: impl Fn(&BlockNode) -> &Vec<NodeIdx>,
    ) -> Result<Vec<NodeIdx>, BlockError> {
        let mut chain = vec![start];
        let mut current = start;

        loop {
            match links(&self.nodes[current]).as_slice() {
                [] => return Ok(chain),
                [following] => {
                    current = *following;
                    chain.push(current);
                }
                _ => {
                    return Err(BlockError::UnexpectedFork {
                        seed: seed.to_string(),
                        train: self.nodes[current].train.id.clone(),
                    });
                }
            }
        }
    }
}
