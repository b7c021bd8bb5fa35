//! Result assembly: union and document ordering.
//!
//! Matches come from several places at once: one set per context node of a
//! chain stage, and within a set, one alternative of a selector list after
//! another. The assembler merges them into a single duplicate-free sequence
//! in document order.
//!
//! Document order here is shadow-inclusive: a shadow root's contents sort
//! after their host and before the host's light children.

use std::collections::{HashMap, HashSet};

use crate::matcher::Descendants;
use crate::tree::{NodeKind, SelectorTree};

/// Pre-order positions of every node reachable from the top of the tree.
///
/// Built once per query and shared by every stage that needs to order its
/// results.
pub struct DocumentOrder<T: SelectorTree> {
    index: HashMap<T::Node, usize>,
}

impl<T: SelectorTree> DocumentOrder<T> {
    /// Index the whole tree containing `root`.
    ///
    /// The walk starts at the topmost node above `root`, crossing out of
    /// shadow roots through their hosts. Nodes the walk cannot see (the
    /// contents of a closed shadow root that `root` lives in) are indexed
    /// after everything else, in their order below `root`.
    pub fn new(tree: &T, root: T::Node) -> Self {
        let top = topmost(tree, root);
        let mut index = HashMap::new();
        let _ = index.insert(top, 0);
        for node in Descendants::new(tree, top, true) {
            let next = index.len();
            let _ = index.insert(node, next);
        }

        if !index.contains_key(&root) {
            for node in std::iter::once(root).chain(Descendants::new(tree, root, true)) {
                let next = index.len();
                let _ = index.entry(node).or_insert(next);
            }
        }

        Self { index }
    }

    /// Position of `node`, if it was reachable when the index was built.
    pub fn position(&self, node: T::Node) -> Option<usize> {
        self.index.get(&node).copied()
    }

    /// Merge `sets` into one sequence in document order without duplicates.
    ///
    /// Nodes missing from the index keep their relative input order and sort
    /// after all indexed nodes.
    pub fn assemble<I>(&self, sets: I) -> Vec<T::Node>
    where
        I: IntoIterator,
        I::Item: IntoIterator<Item = T::Node>,
    {
        let mut seen = HashSet::new();
        let mut merged: Vec<T::Node> = sets
            .into_iter()
            .flatten()
            .filter(|&node| seen.insert(node))
            .collect();
        merged.sort_by_key(|&node| self.position(node).unwrap_or(usize::MAX));
        merged
    }
}

/// Climb parents and shadow hosts as far as they go.
fn topmost<T: SelectorTree>(tree: &T, node: T::Node) -> T::Node {
    let mut current = node;
    loop {
        let up = match tree.kind(current) {
            NodeKind::ShadowRoot => tree.shadow_host(current),
            _ => tree.parent(current),
        };
        match up {
            Some(next) => current = next,
            None => return current,
        }
    }
}
