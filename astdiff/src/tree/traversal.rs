//! Lazy traversal iterators over a [`GenericTree`].

use super::{GenericTree, NodeId};

/// Depth-first pre-order iterator (parent before children, source order).
pub struct PreOrder<'t> {
    tree: &'t GenericTree,
    stack: Vec<NodeId>,
}

impl<'t> PreOrder<'t> {
    pub(super) fn new(tree: &'t GenericTree, start: NodeId) -> Self {
        Self {
            tree,
            stack: vec![start],
        }
    }
}

impl Iterator for PreOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}

/// Depth-first post-order iterator (children before parent, source order).
pub struct PostOrder<'t> {
    tree: &'t GenericTree,
    // (node, index of the next child to descend into)
    stack: Vec<(NodeId, usize)>,
}

impl<'t> PostOrder<'t> {
    pub(super) fn new(tree: &'t GenericTree, start: NodeId) -> Self {
        Self {
            tree,
            stack: vec![(start, 0)],
        }
    }
}

impl Iterator for PostOrder<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        loop {
            let (id, next_child) = *self.stack.last()?;
            let children = self.tree.children(id);
            if let Some(&child) = children.get(next_child) {
                if let Some(top) = self.stack.last_mut() {
                    top.1 += 1;
                }
                self.stack.push((child, 0));
            } else {
                self.stack.pop();
                return Some(id);
            }
        }
    }
}
