//! Per-branch ancestral sequence state.
//!
//! Every branch sees the root reference with exactly the substitutions of
//! the branches above it applied, so the flanks of an event must be read
//! from the sequence state at the branch's parent node, not from the root
//! reference or the final alignment. Snapshots are cached per node: a
//! node's sequence is its parent's sequence with the events of its own
//! incoming branch applied, computed once and reused by the whole subtree.

use crate::phylo::Tree;
use crate::spectrum::extract::MutationEvent;
use std::collections::HashMap;

pub struct AncestralGenomes<'a> {
    tree: &'a Tree,
    branch_events: &'a HashMap<usize, Vec<MutationEvent>>,
    root_sequence: Vec<u8>,
    snapshots: HashMap<usize, Vec<u8>>,
}

impl<'a> AncestralGenomes<'a> {
    pub fn new(
        tree: &'a Tree,
        branch_events: &'a HashMap<usize, Vec<MutationEvent>>,
        root_sequence: Vec<u8>,
    ) -> Self {
        AncestralGenomes {
            tree,
            branch_events,
            root_sequence,
            snapshots: HashMap::new(),
        }
    }

    pub fn genome_length(&self) -> usize {
        self.root_sequence.len()
    }

    /// Sequence state at a node, replaying any ancestors that have not been
    /// materialized yet. Events on one branch apply in genome order.
    pub fn sequence_at(&mut self, idx: usize) -> &[u8] {
        if idx == self.tree.root() {
            return &self.root_sequence;
        }
        if !self.snapshots.contains_key(&idx) {
            let path = self.tree.path_from_root(idx);
            let mut working = self.root_sequence.clone();
            let mut start_of_replay = 1;
            // resume from the deepest cached ancestor
            for (depth, &node) in path.iter().enumerate().skip(1).rev() {
                if let Some(snapshot) = self.snapshots.get(&node) {
                    working = snapshot.clone();
                    start_of_replay = depth + 1;
                    break;
                }
            }
            for &node in &path[start_of_replay..] {
                if let Some(events) = self.branch_events.get(&node) {
                    for event in events {
                        working[event.genome_position - 1] = event.derived;
                    }
                }
                self.snapshots.insert(node, working.clone());
            }
        }
        &self.snapshots[&idx]
    }
}
