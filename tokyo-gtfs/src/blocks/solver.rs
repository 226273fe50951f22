//! The block solver.
//!
//! One solver handles one through-service group. Trains are added, then
//! [`BlockSolver::solve`] repeatedly takes a remaining train as a seed,
//! expands its component in both directions, removes every train it
//! touched from all indices and turns the component into blocks.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, trace, warn};

use crate::domain::Train;

use super::error::BlockError;
use super::graph::{BlockGraph, Direction, NodeIdx};
use super::signature::{StopTimeHash, TrainShort};
use super::topology::{PlannedMember, plan_blocks};

/// One trip's place inside a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockMember {
    /// Id of the source train.
    pub train: String,
    /// Suffix of the cloned trip, empty for the original.
    pub suffix: String,
    /// Destinations after fork rewriting.
    pub destinations: Vec<String>,
}

impl BlockMember {
    /// Id of the exported trip: the train id plus the clone suffix.
    pub fn trip_id(&self) -> String {
        format!("{}{}", self.train, self.suffix)
    }

    pub fn is_clone(&self) -> bool {
        !self.suffix.is_empty()
    }
}

/// A resolved block, members in travel order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// `"{group}.{n}"`
    pub id: String,
    pub members: Vec<BlockMember>,
}

impl Block {
    /// Exported trip ids, in travel order.
    pub fn trip_ids(&self) -> Vec<String> {
        self.members.iter().map(BlockMember::trip_id).collect()
    }
}

/// A component that could not be turned into blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedComponent {
    pub seed: String,
    pub trains: Vec<String>,
    pub error: BlockError,
}

/// Outcome of solving one through-service group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolveReport {
    pub group: String,
    pub blocks: Vec<Block>,
    pub rejected: Vec<RejectedComponent>,
    /// Trains removed from the solver, in any outcome.
    pub consumed: usize,
    /// Trains skipped up front as self-contained or without stops.
    pub skipped: usize,
}

/// Resolves through-service blocks for one group.
#[derive(Debug, Clone)]
pub struct BlockSolver {
    group: String,
    trains_by_id: BTreeMap<String, TrainShort>,
    trains_by_first_sta: HashMap<StopTimeHash, Vec<String>>,
    trains_by_last_sta: HashMap<StopTimeHash, Vec<String>>,
    counter: usize,
    skipped: usize,
}

impl BlockSolver {
    /// Create a solver; block ids will be prefixed with `group`.
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            trains_by_id: BTreeMap::new(),
            trains_by_first_sta: HashMap::new(),
            trains_by_last_sta: HashMap::new(),
            counter: 0,
            skipped: 0,
        }
    }

    /// Register a train for matching.
    ///
    /// Self-contained trains and trains without stop-times are skipped.
    pub fn add_train(&mut self, train: &Train) {
        let Some(short) = TrainShort::from_train(train) else {
            warn!(train = %train.id, "train without stop-times, skipping block resolution");
            self.skipped += 1;
            return;
        };

        if short.is_self_contained() {
            self.skipped += 1;
            return;
        }

        // Single-stop trains would match anything calling at that station
        if short.matchable {
            self.trains_by_first_sta
                .entry(short.first_sta.clone())
                .or_default()
                .push(short.id.clone());
            self.trains_by_last_sta
                .entry(short.last_sta.clone())
                .or_default()
                .push(short.id.clone());
        }

        self.trains_by_id.insert(short.id.clone(), short);
    }

    /// Number of trains waiting to be resolved.
    pub fn pending(&self) -> usize {
        self.trains_by_id.len()
    }

    /// Resolve every registered train.
    ///
    /// Component failures never abort the run: they are logged with the
    /// seed id and listed in [`SolveReport::rejected`].
    pub fn solve(mut self) -> SolveReport {
        let mut report = SolveReport {
            group: self.group.clone(),
            skipped: self.skipped,
            ..SolveReport::default()
        };
        debug!(group = %self.group, trains = self.pending(), "solving blocks");

        while let Some(seed) = self.trains_by_id.values().next().cloned() {
            let seed_id = seed.id.clone();
            let mut graph = BlockGraph::new(seed);
            let expanded = self.expand(&mut graph);

            let trains: Vec<String> = graph.nodes().map(|(_, n)| n.train.id.clone()).collect();
            for (_, node) in graph.nodes() {
                self.drop_train(&node.train);
            }
            report.consumed += trains.len();

            let planned = expanded.and_then(|()| {
                if graph.len() < 2 {
                    Ok(Vec::new())
                } else {
                    plan_blocks(&graph)
                }
            });

            match planned {
                Ok(blocks) => {
                    for planned_block in blocks {
                        let block = self.make_block(&graph, planned_block);
                        trace!(block = %block.id, trips = block.members.len(), "block created");
                        report.blocks.push(block);
                    }
                }
                Err(error) => {
                    warn!(group = %self.group, seed = %seed_id, %error, "rejected block component");
                    report.rejected.push(RejectedComponent {
                        seed: seed_id,
                        trains,
                        error,
                    });
                }
            }
        }

        debug!(
            group = %report.group,
            blocks = report.blocks.len(),
            rejected = report.rejected.len(),
            "block solving complete"
        );
        report
    }

    fn make_block(&mut self, graph: &BlockGraph, planned: Vec<PlannedMember>) -> Block {
        let id = format!("{}.{}", self.group, self.counter);
        self.counter += 1;

        Block {
            id,
            members: planned
                .into_iter()
                .map(|member| BlockMember {
                    train: graph.node(member.node).train.id.clone(),
                    suffix: member.suffix,
                    destinations: member.destinations,
                })
                .collect(),
        }
    }

    /// Expand the component around the seed at index 0.
    ///
    /// Uses an explicit stack instead of recursion. Each entry expands one
    /// node in one direction, optionally ignoring the node it was reached
    /// from, so that branches not reachable in the arrival direction are
    /// still discovered.
    fn expand(&self, graph: &mut BlockGraph) -> Result<(), BlockError> {
        let mut stack: Vec<(NodeIdx, Direction, Option<NodeIdx>)> =
            vec![(0, Direction::Backward, None), (0, Direction::Forward, None)];

        while let Some((idx, direction, ignore)) = stack.pop() {
            let train = &graph.node(idx).train;
            let linked = match direction {
                Direction::Forward => self.next_trains(train),
                Direction::Backward => self.previous_trains(train),
            };
            let train_id = train.id.clone();
            let ignore_id = ignore.map(|i| graph.node(i).train.id.clone());

            for linked_id in linked {
                if ignore_id.as_deref() == Some(linked_id.as_str()) {
                    continue;
                }

                if graph.contains(&linked_id) {
                    return Err(BlockError::CircularReference {
                        train: train_id,
                        reference: linked_id,
                    });
                }

                let Some(linked_train) = self.trains_by_id.get(&linked_id) else {
                    warn!(
                        train = %train_id,
                        reference = %linked_id,
                        ?direction,
                        "referenced train does not exist or was used in a different block"
                    );
                    continue;
                };

                let new_idx = graph.push(linked_train.clone());
                graph.link(idx, new_idx, direction);

                stack.push((new_idx, direction.opposite(), Some(idx)));
                stack.push((new_idx, direction, None));
            }
        }

        Ok(())
    }

    /// Trains directly following `train`.
    ///
    /// Declared links are trusted completely. Without them, the train
    /// whose first stop matches this train's last stop is used, unless
    /// several trains match.
    fn next_trains(&self, train: &TrainShort) -> Vec<String> {
        if train.is_last {
            return Vec::new();
        }
        if let Some(next) = &train.next {
            return next.clone();
        }
        if !train.matchable {
            return Vec::new();
        }

        match self.trains_by_first_sta.get(&train.last_sta) {
            Some(candidates) if candidates.len() > 1 => {
                warn!(train = %train.id, candidates = candidates.len(), "multiple possible next trains when matching on stop-time hash");
                Vec::new()
            }
            Some(candidates) => candidates.clone(),
            None => Vec::new(),
        }
    }

    /// Trains directly preceding `train`, mirroring [`Self::next_trains`].
    fn previous_trains(&self, train: &TrainShort) -> Vec<String> {
        if train.is_first == Some(true) {
            return Vec::new();
        }
        if let Some(prev) = &train.prev {
            return prev.clone();
        }
        if !train.matchable {
            return Vec::new();
        }

        match self.trains_by_last_sta.get(&train.first_sta) {
            Some(candidates) if candidates.len() > 1 => {
                warn!(train = %train.id, candidates = candidates.len(), "multiple possible previous trains when matching on stop-time hash");
                Vec::new()
            }
            Some(candidates) => candidates.clone(),
            None => Vec::new(),
        }
    }

    /// Remove a train from every index.
    fn drop_train(&mut self, train: &TrainShort) {
        self.trains_by_id.remove(&train.id);
        remove_from_index(&mut self.trains_by_first_sta, &train.first_sta, &train.id);
        remove_from_index(&mut self.trains_by_last_sta, &train.last_sta, &train.id);
    }
}

fn remove_from_index(index: &mut HashMap<StopTimeHash, Vec<String>>, key: &StopTimeHash, id: &str) {
    if let Some(ids) = index.get_mut(key) {
        ids.retain(|i| i != id);
        if ids.is_empty() {
            index.remove(key);
        }
    }
}

/// A trip's membership in a block, as written back onto trips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub block_id: String,
    pub suffix: String,
    pub destinations: Vec<String>,
    /// Trip id of the preceding member in the block.
    pub previous: Option<String>,
    /// Trip id of the following member in the block.
    pub next: Option<String>,
}

impl Membership {
    /// Exported trip id of this membership for a train.
    pub fn trip_id(&self, train_id: &str) -> String {
        format!("{train_id}{}", self.suffix)
    }
}

/// Block memberships of every train, across groups.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockAssignment {
    memberships: BTreeMap<String, Vec<Membership>>,
}

impl BlockAssignment {
    /// Record every block of a report.
    pub fn record(&mut self, report: &SolveReport) {
        for block in &report.blocks {
            let trip_ids = block.trip_ids();
            for (pos, member) in block.members.iter().enumerate() {
                let previous = pos.checked_sub(1).map(|p| trip_ids[p].clone());
                let next = trip_ids.get(pos + 1).cloned();

                self.memberships
                    .entry(member.train.clone())
                    .or_default()
                    .push(Membership {
                        block_id: block.id.clone(),
                        suffix: member.suffix.clone(),
                        destinations: member.destinations.clone(),
                        previous,
                        next,
                    });
            }
        }
    }

    /// Memberships of a train, empty if it belongs to no block.
    pub fn memberships(&self, train_id: &str) -> &[Membership] {
        self.memberships.get(train_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Block ids assigned to a train's original trip and its clones.
    pub fn block_ids(&self, train_id: &str) -> Vec<&str> {
        self.memberships(train_id)
            .iter()
            .map(|m| m.block_id.as_str())
            .collect()
    }

    /// Number of trains with at least one membership.
    pub fn len(&self) -> usize {
        self.memberships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memberships.is_empty()
    }
}
