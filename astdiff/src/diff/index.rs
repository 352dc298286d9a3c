//! Per-tree metrics used by matching: pre-order ranks, heights and
//! structural hashes.

use crate::tree::{GenericTree, NodeId};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};

/// Read-only view of a tree with the metrics the matcher queries.
pub struct TreeIndex<'t> {
    pub(crate) tree: &'t GenericTree,
    pre_order: Vec<NodeId>,
    rank: Vec<usize>,
    height: Vec<usize>,
    hash: Vec<u64>,
    shape: Vec<u64>,
}

impl<'t> TreeIndex<'t> {
    /// Compute metrics for every node reachable from the root.
    #[must_use]
    pub fn new(tree: &'t GenericTree) -> Self {
        let len = tree.arena_len();
        let pre_order: Vec<NodeId> = tree.pre_order().collect();
        let mut rank = vec![usize::MAX; len];
        for (i, id) in pre_order.iter().enumerate() {
            rank[id.index()] = i;
        }

        let mut height = vec![0; len];
        let mut hash = vec![0; len];
        let mut shape = vec![0; len];
        for id in tree.post_order() {
            let node = tree.node(id);
            let children = node.children();

            let mut exact = FxHasher::default();
            node.node_type().hash(&mut exact);
            node.label().hash(&mut exact);
            children.len().hash(&mut exact);

            let mut blind = FxHasher::default();
            node.node_type().hash(&mut blind);
            children.len().hash(&mut blind);

            let mut tallest = 0;
            for &child in children {
                hash[child.index()].hash(&mut exact);
                shape[child.index()].hash(&mut blind);
                tallest = tallest.max(height[child.index()]);
            }
            height[id.index()] = tallest + 1;
            hash[id.index()] = exact.finish();
            shape[id.index()] = blind.finish();
        }

        Self {
            tree,
            pre_order,
            rank,
            height,
            hash,
            shape,
        }
    }

    /// Attached nodes in pre-order.
    #[must_use]
    pub fn pre_order(&self) -> &[NodeId] {
        &self.pre_order
    }

    /// Pre-order rank of `id`.
    #[must_use]
    pub fn rank(&self, id: NodeId) -> usize {
        self.rank[id.index()]
    }

    /// Height of the subtree at `id` (a leaf has height 1).
    #[must_use]
    pub fn height(&self, id: NodeId) -> usize {
        self.height[id.index()]
    }

    /// Hash over types, labels and shape of the subtree.
    #[must_use]
    pub fn hash(&self, id: NodeId) -> u64 {
        self.hash[id.index()]
    }

    /// Hash over types and shape only, ignoring labels.
    #[must_use]
    pub fn shape(&self, id: NodeId) -> u64 {
        self.shape[id.index()]
    }

    /// Subtree size at `id`.
    #[must_use]
    pub fn size(&self, id: NodeId) -> usize {
        self.tree.node(id).subtree_size()
    }

    /// Whether `node` is a proper descendant of `ancestor`, in O(1).
    #[must_use]
    pub fn is_descendant(&self, node: NodeId, ancestor: NodeId) -> bool {
        let (r, a) = (self.rank(node), self.rank(ancestor));
        r != usize::MAX && r > a && r < a + self.size(ancestor)
    }

    /// Whether the subtrees at `a` (in `self`) and `b` (in `other`) are equal,
    /// optionally ignoring labels.
    #[must_use]
    pub fn same_subtree(&self, a: NodeId, other: &TreeIndex<'_>, b: NodeId, with_labels: bool) -> bool {
        let (ha, hb) = if with_labels {
            (self.hash(a), other.hash(b))
        } else {
            (self.shape(a), other.shape(b))
        };
        if ha != hb || self.size(a) != other.size(b) {
            return false;
        }
        self.tree
            .subtree(a)
            .zip(other.tree.subtree(b))
            .all(|(x, y)| {
                let (x, y) = (self.tree.node(x), other.tree.node(y));
                x.node_type() == y.node_type()
                    && x.children().len() == y.children().len()
                    && (!with_labels || x.label() == y.label())
            })
    }
}
