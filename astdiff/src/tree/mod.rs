//! Language-agnostic syntax tree.
//!
//! Nodes live in a per-tree arena and refer to each other by [`NodeId`].
//! A node has at most one parent; attaching it twice, attaching the root, or
//! creating a cycle is a programming error and panics.
//!
//! Every node caches the size of its subtree, so [`GenericTree::size`] and
//! per-node size queries are O(1). Adapters that build whole trees at once
//! use [`TreeBuilder`], which fills in the sizes in a single pass.

mod node;
mod traversal;

pub use node::{GenericNode, NodeId, NodeType, Position};
pub use traversal::{PostOrder, PreOrder};

use compact_str::CompactString;
use std::fmt::Write as _;

/// A rooted, ordered tree of [`GenericNode`]s.
#[derive(Debug, Clone)]
pub struct GenericTree {
    nodes: Vec<GenericNode>,
    root: NodeId,
}

impl GenericTree {
    /// Create a tree containing only its root.
    #[must_use]
    pub fn new(
        node_type: NodeType,
        label: impl Into<CompactString>,
        position: Option<Position>,
    ) -> Self {
        Self {
            nodes: vec![GenericNode::new(node_type, label.into(), position)],
            root: NodeId::from_index(0),
        }
    }

    /// Allocate a detached node in this tree's arena.
    ///
    /// The node only becomes part of the tree once passed to
    /// [`attach_child`](Self::attach_child).
    pub fn build_leaf(
        &mut self,
        node_type: NodeType,
        label: impl Into<CompactString>,
        position: Option<Position>,
    ) -> NodeId {
        let id = NodeId::from_index(self.nodes.len());
        self.nodes
            .push(GenericNode::new(node_type, label.into(), position));
        id
    }

    /// Append `child` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `child` is the root, already has a parent, or is an ancestor
    /// of `parent`.
    pub fn attach_child(&mut self, parent: NodeId, child: NodeId) {
        assert!(child != self.root, "cannot attach the root node {child}");
        assert!(
            self.nodes[child.index()].parent.is_none(),
            "node {child} is already attached to a parent"
        );
        assert!(
            !self.is_ancestor_or_self(child, parent),
            "attaching {child} under {parent} would create a cycle"
        );

        let added = self.nodes[child.index()].subtree_size;
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);

        let mut current = Some(parent);
        while let Some(id) = current {
            let node = &mut self.nodes[id.index()];
            node.subtree_size += added;
            current = node.parent;
        }
    }

    /// Allocate a node and attach it under `parent` in one step.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        node_type: NodeType,
        label: impl Into<CompactString>,
        position: Option<Position>,
    ) -> NodeId {
        let id = self.build_leaf(node_type, label, position);
        self.attach_child(parent, id);
        id
    }

    /// Root handle.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes reachable from the root.
    #[must_use]
    pub fn size(&self) -> usize {
        self.nodes[self.root.index()].subtree_size
    }

    /// Number of allocated nodes, including detached ones.
    #[must_use]
    pub fn arena_len(&self) -> usize {
        self.nodes.len()
    }

    /// Node behind a handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not produced by this tree.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &GenericNode {
        &self.nodes[id.index()]
    }

    /// Node behind a handle, or `None` for a foreign handle.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&GenericNode> {
        self.nodes.get(id.index())
    }

    /// Children of `id` in source order.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.index()].children
    }

    /// Parent of `id`.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.index()].parent
    }

    /// Index of `id` among its parent's children.
    #[must_use]
    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&c| c == id)
    }

    /// Whether `ancestor` is `node` or lies on its path to the root.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.nodes[id.index()].parent;
        }
        false
    }

    /// Pre-order traversal of the whole tree.
    ///
    /// The iterator is lazy; calling this again restarts from the root and
    /// yields the same sequence.
    #[must_use]
    pub fn pre_order(&self) -> PreOrder<'_> {
        PreOrder::new(self, self.root)
    }

    /// Pre-order traversal of the subtree rooted at `id`.
    #[must_use]
    pub fn subtree(&self, id: NodeId) -> PreOrder<'_> {
        PreOrder::new(self, id)
    }

    /// Pre-order traversal of the proper descendants of `id`.
    pub fn descendants(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        PreOrder::new(self, id).skip(1)
    }

    /// Post-order traversal of the whole tree.
    #[must_use]
    pub fn post_order(&self) -> PostOrder<'_> {
        PostOrder::new(self, self.root)
    }

    /// Indented one-node-per-line rendering, mostly for diagnostics.
    #[must_use]
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        let mut stack = vec![(self.root, 0usize)];
        while let Some((id, depth)) = stack.pop() {
            let node = self.node(id);
            let _ = write!(out, "{:indent$}{}", "", node.node_type, indent = depth * 2);
            if !node.label.is_empty() {
                let _ = write!(out, " {:?}", node.label.as_str());
            }
            out.push('\n');
            for &child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }
        out
    }
}

/// Append-only construction of a [`GenericTree`].
///
/// Every pushed node is new and its parent already exists, so no cycle or
/// re-parenting checks are needed. Subtree sizes are computed once by
/// [`finish`](Self::finish), keeping construction linear in the node count.
#[derive(Debug)]
pub struct TreeBuilder {
    tree: GenericTree,
}

impl TreeBuilder {
    /// Start a tree from its root.
    #[must_use]
    pub fn new(
        node_type: NodeType,
        label: impl Into<CompactString>,
        position: Option<Position>,
    ) -> Self {
        Self {
            tree: GenericTree::new(node_type, label, position),
        }
    }

    /// Root handle.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.tree.root
    }

    /// Append a new last child under `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not produced by this builder.
    pub fn push(
        &mut self,
        parent: NodeId,
        node_type: NodeType,
        label: impl Into<CompactString>,
        position: Option<Position>,
    ) -> NodeId {
        let id = self.tree.build_leaf(node_type, label, position);
        self.tree.nodes[id.index()].parent = Some(parent);
        self.tree.nodes[parent.index()].children.push(id);
        id
    }

    /// Compute subtree sizes and hand out the tree.
    #[must_use]
    pub fn finish(mut self) -> GenericTree {
        // Children always sit after their parent in the arena.
        for i in (1..self.tree.nodes.len()).rev() {
            let size = self.tree.nodes[i].subtree_size;
            if let Some(parent) = self.tree.nodes[i].parent {
                self.tree.nodes[parent.index()].subtree_size += size;
            }
        }
        self.tree
    }
}

/// Structural and textual equality of the pre-order node sequences.
///
/// Positions are ignored: two copies of the same code at different offsets
/// are equal.
impl PartialEq for GenericTree {
    fn eq(&self, other: &Self) -> bool {
        if self.size() != other.size() {
            return false;
        }
        self.pre_order().zip(other.pre_order()).all(|(a, b)| {
            let (a, b) = (self.node(a), other.node(b));
            a.node_type == b.node_type
                && a.label == b.label
                && a.children.len() == b.children.len()
        })
    }
}

impl Eq for GenericTree {}
