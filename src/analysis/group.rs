//! Partitions stash calls into groups that can run on one execution path.
//!
//! Calls are first bucketed by their nearest branch-free block; calls sharing a
//! block always run together. Buckets are then merged unless they are mutually
//! exclusive, which happens in exactly two ways:
//!
//! - the two blocks sit in different arms of the same `Branch`, or
//! - the two blocks belong to different function bodies (a lambda runs when it
//!   is invoked, not when the enclosing body runs).
//!
//! An unconditional block and an arm nested below it are never exclusive: the
//! outer code runs on every path through the arm. Merging is transitive.

use std::collections::HashMap;

use itertools::Itertools;
use tracing::trace;

use crate::analysis::extract::SensitiveCall;
use crate::cancel::{CancellationToken, Cancelled};
use crate::syntax::{NodeId, NodeKind, SyntaxTree};

/// Stash calls that can execute together. Members are in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictGroup {
    pub calls: Vec<SensitiveCall>,
}

impl ConflictGroup {
    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn is_violation(&self) -> bool {
        self.calls.len() >= 2
    }
}

/// The arm chosen at every `Branch` between a block and its function body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArmPath {
    function: NodeId,
    arms: HashMap<NodeId, NodeId>,
}

impl ArmPath {
    /// Walks outward from `block` (inclusive) to the first function boundary.
    pub fn of(
        tree: &SyntaxTree,
        block: NodeId,
        cancel: &CancellationToken,
    ) -> Result<Self, Cancelled> {
        let mut arms = HashMap::new();
        for node in std::iter::once(block).chain(tree.ancestors(block)) {
            cancel.check()?;
            match tree.kind(node) {
                NodeKind::Function { .. } => {
                    return Ok(Self {
                        function: node,
                        arms,
                    });
                }
                NodeKind::Arm => {
                    if let Some(construct) = tree.parent(node)
                        && matches!(tree.kind(construct), NodeKind::Branch)
                    {
                        arms.insert(construct, node);
                    }
                }
                _ => {}
            }
        }

        Ok(Self {
            function: tree.root(),
            arms,
        })
    }

    pub fn excludes(&self, other: &ArmPath) -> bool {
        self.function != other.function
            || self
                .arms
                .iter()
                .any(|(construct, arm)| other.arms.get(construct).is_some_and(|o| o != arm))
    }
}

struct DisjointSet {
    parent: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len).collect(),
        }
    }

    fn find(&mut self, mut i: usize) -> usize {
        while self.parent[i] != i {
            self.parent[i] = self.parent[self.parent[i]];
            i = self.parent[i];
        }
        i
    }

    // Lower index wins so group roots stay in source order.
    fn union(&mut self, a: usize, b: usize) {
        let (ra, rb) = (self.find(a), self.find(b));
        if ra != rb {
            let (lo, hi) = if ra < rb { (ra, rb) } else { (rb, ra) };
            self.parent[hi] = lo;
        }
    }
}

/// Groups `calls` (in source order) and keeps only groups with two or more members.
pub fn group_conflicts(
    tree: &SyntaxTree,
    calls: &[SensitiveCall],
    cancel: &CancellationToken,
) -> Result<Vec<ConflictGroup>, Cancelled> {
    let mut index: HashMap<NodeId, usize> = HashMap::new();
    let mut buckets: Vec<(NodeId, Vec<SensitiveCall>)> = Vec::new();
    for call in calls {
        let slot = *index.entry(call.block).or_insert_with(|| {
            buckets.push((call.block, Vec::new()));
            buckets.len() - 1
        });
        buckets[slot].1.push(*call);
    }

    let paths = buckets
        .iter()
        .map(|(block, _)| ArmPath::of(tree, *block, cancel))
        .collect::<Result<Vec<_>, _>>()?;

    let mut sets = DisjointSet::new(buckets.len());
    for (i, j) in (0..buckets.len()).tuple_combinations::<(usize, usize)>() {
        cancel.check()?;
        if !paths[i].excludes(&paths[j]) {
            sets.union(i, j);
        }
    }

    let mut merged: Vec<Vec<SensitiveCall>> = vec![Vec::new(); buckets.len()];
    for (i, (_, members)) in buckets.iter().enumerate() {
        let root = sets.find(i);
        merged[root].extend(members.iter().copied());
    }

    let groups: Vec<ConflictGroup> = merged
        .into_iter()
        .map(|mut calls| {
            calls.sort_by_key(|c| (c.span, c.node));
            ConflictGroup { calls }
        })
        .filter(ConflictGroup::is_violation)
        .collect();

    trace!(
        buckets = buckets.len(),
        groups = groups.len(),
        "grouped stash calls"
    );
    Ok(groups)
}
