//! Edit script generation from a node mapping.
//!
//! Generation follows Chawathe et al.: a working copy of tree A (with a
//! virtual root above the real root) is transformed step by step into tree B
//! while walking B breadth-first. Inserts, updates and moves are applied to
//! the copy as they are found, then every node of A left without a partner is
//! deleted. The raw script is then simplified: a subtree whose nodes are all
//! inserted (or all deleted) collapses into one tree-level action at its
//! topmost node.
//!
//! Output order is fixed: deletes, updates and moves in A's pre-order,
//! followed by inserts in B's pre-order.

use super::action::{Action, ActionNode, EditScript, Side};
use super::lcs::lcs;
use super::mapping::Mapping;
use super::DiffError;
use crate::tree::{GenericTree, NodeId};
use compact_str::CompactString;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;

const VIRTUAL_ROOT: usize = 0;

/// Working copy of tree A.
///
/// Slot 0 is the virtual root; A's node `n` lives in slot `n.index() + 1`;
/// inserted nodes are appended after that.
struct WorkTree {
    labels: Vec<CompactString>,
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    /// Partner in tree B
    partner: Vec<Option<NodeId>>,
    /// Originating node of A, `None` for the virtual root and inserted nodes
    origin: Vec<Option<NodeId>>,
    in_order: Vec<bool>,
}

impl WorkTree {
    fn from_tree(tree: &GenericTree) -> Self {
        let len = tree.arena_len() + 1;
        let mut work = Self {
            labels: Vec::with_capacity(len),
            parents: Vec::with_capacity(len),
            children: Vec::with_capacity(len),
            partner: vec![None; len],
            origin: Vec::with_capacity(len),
            in_order: vec![false; len],
        };

        work.labels.push(CompactString::default());
        work.parents.push(None);
        work.children.push(vec![tree.root().index() + 1]);
        work.origin.push(None);

        for i in 0..tree.arena_len() {
            let id = NodeId::from_index(i);
            let node = tree.node(id);
            let parent = if id == tree.root() {
                Some(VIRTUAL_ROOT)
            } else {
                node.parent().map(|p| p.index() + 1)
            };
            work.labels.push(CompactString::from(node.label()));
            work.parents.push(parent);
            work.children
                .push(node.children().iter().map(|c| c.index() + 1).collect());
            work.origin.push(Some(id));
        }
        work
    }

    fn slot_of(id: NodeId) -> usize {
        id.index() + 1
    }

    fn position(&self, slot: usize) -> Option<usize> {
        let parent = self.parents[slot]?;
        self.children[parent].iter().position(|&c| c == slot)
    }

    fn insert(&mut self, parent: usize, index: usize, label: &str) -> usize {
        let slot = self.labels.len();
        self.labels.push(CompactString::from(label));
        self.parents.push(Some(parent));
        self.children.push(Vec::new());
        self.partner.push(None);
        self.origin.push(None);
        self.in_order.push(false);
        let siblings = &mut self.children[parent];
        siblings.insert(index.min(siblings.len()), slot);
        slot
    }

    fn move_to(&mut self, slot: usize, parent: usize, index: usize) {
        if let Some(old) = self.parents[slot] {
            self.children[old].retain(|&c| c != slot);
        }
        let siblings = &mut self.children[parent];
        siblings.insert(index.min(siblings.len()), slot);
        self.parents[slot] = Some(parent);
    }
}

struct Generator<'a> {
    dst: &'a GenericTree,
    work: WorkTree,
    /// Working-copy partner of each B node
    dst_partner: Vec<Option<usize>>,
    dst_in_order: Vec<bool>,
    /// A nodes relocated by the script
    moved: Vec<bool>,
}

impl<'a> Generator<'a> {
    fn new(src: &GenericTree, dst: &'a GenericTree, mapping: &Mapping) -> Self {
        let mut work = WorkTree::from_tree(src);
        let mut dst_partner = vec![None; dst.arena_len()];
        for (a, b) in mapping.pairs() {
            let slot = WorkTree::slot_of(a);
            work.partner[slot] = Some(b);
            dst_partner[b.index()] = Some(slot);
        }
        Self {
            dst,
            work,
            dst_partner,
            dst_in_order: vec![false; dst.arena_len()],
            moved: vec![false; src.arena_len()],
        }
    }

    fn run(&mut self) -> Result<(), DiffError> {
        let mut queue = VecDeque::from([self.dst.root()]);
        while let Some(x) = queue.pop_front() {
            queue.extend(self.dst.children(x).iter().copied());

            let z = match self.dst.parent(x) {
                None => VIRTUAL_ROOT,
                Some(y) => self.dst_partner[y.index()].ok_or_else(|| {
                    DiffError::Invariant(format!("parent of destination node {x} has no partner"))
                })?,
            };

            let w = if let Some(w) = self.dst_partner[x.index()] {
                let label = self.dst.node(x).label();
                if self.work.labels[w] != label {
                    self.work.labels[w] = CompactString::from(label);
                }
                if self.work.parents[w] != Some(z) {
                    let k = self.find_pos(x)?;
                    self.relocate(w, z, k);
                }
                w
            } else {
                let k = self.find_pos(x)?;
                let w = self.work.insert(z, k, self.dst.node(x).label());
                self.work.partner[w] = Some(x);
                self.dst_partner[x.index()] = Some(w);
                w
            };

            self.work.in_order[w] = true;
            self.dst_in_order[x.index()] = true;
            self.align_children(w, x)?;
        }
        Ok(())
    }

    fn relocate(&mut self, slot: usize, parent: usize, index: usize) {
        self.work.move_to(slot, parent, index);
        if let Some(origin) = self.work.origin[slot] {
            self.moved[origin.index()] = true;
        }
    }

    fn align_children(&mut self, w: usize, x: NodeId) -> Result<(), DiffError> {
        for &c in &self.work.children[w] {
            self.work.in_order[c] = false;
        }
        for &c in self.dst.children(x) {
            self.dst_in_order[c.index()] = false;
        }

        let s1: Vec<usize> = self.work.children[w]
            .iter()
            .copied()
            .filter(|&c| {
                self.work.partner[c].is_some_and(|p| self.dst.parent(p) == Some(x))
            })
            .collect();
        let s2: Vec<NodeId> = self
            .dst
            .children(x)
            .iter()
            .copied()
            .filter(|&c| {
                self.dst_partner[c.index()].is_some_and(|p| self.work.parents[p] == Some(w))
            })
            .collect();

        let common = lcs(&s1, &s2, |&a, &b| self.work.partner[a] == Some(b));
        let mut aligned: FxHashSet<usize> = FxHashSet::default();
        for &(i, j) in &common {
            self.work.in_order[s1[i]] = true;
            self.dst_in_order[s2[j].index()] = true;
            aligned.insert(s1[i]);
        }

        for &b in &s2 {
            for &a in &s1 {
                if self.work.partner[a] == Some(b) && !aligned.contains(&a) {
                    let k = self.find_pos(b)?;
                    self.relocate(a, w, k);
                    self.work.in_order[a] = true;
                    self.dst_in_order[b.index()] = true;
                }
            }
        }
        Ok(())
    }

    /// Index in the working copy at which the partner of `x` belongs.
    fn find_pos(&self, x: NodeId) -> Result<usize, DiffError> {
        let Some(y) = self.dst.parent(x) else {
            return Ok(0);
        };
        let siblings = self.dst.children(y);

        for &c in siblings {
            if self.dst_in_order[c.index()] {
                if c == x {
                    return Ok(0);
                }
                break;
            }
        }

        let xpos = siblings
            .iter()
            .position(|&c| c == x)
            .ok_or_else(|| DiffError::Invariant(format!("node {x} is missing from its parent")))?;
        let Some(&v) = siblings[..xpos]
            .iter()
            .rev()
            .find(|c| self.dst_in_order[c.index()])
        else {
            return Ok(0);
        };

        let u = self.dst_partner[v.index()].ok_or_else(|| {
            DiffError::Invariant(format!("in-order node {v} has no partner"))
        })?;
        let upos = self.work.position(u).ok_or_else(|| {
            DiffError::Invariant(format!("working node of {v} is detached"))
        })?;
        Ok(upos + 1)
    }
}

/// Per node: whether the node and all its descendants are unmatched.
fn fully_unmatched(tree: &GenericTree, is_mapped: impl Fn(NodeId) -> bool) -> Vec<bool> {
    let mut full = vec![false; tree.arena_len()];
    for id in tree.post_order() {
        full[id.index()] =
            !is_mapped(id) && tree.children(id).iter().all(|c| full[c.index()]);
    }
    full
}

fn parent_snapshot(tree: &GenericTree, id: NodeId, side: Side) -> Option<ActionNode> {
    tree.parent(id)
        .map(|p| ActionNode::snapshot(tree, p, side))
}

/// Build the simplified, ordered edit script turning `src` into `dst`.
///
/// # Errors
///
/// Returns [`DiffError::Invariant`] when the mapping does not belong to the
/// two trees or links a detached node.
pub(crate) fn generate(
    src: &GenericTree,
    dst: &GenericTree,
    mapping: &Mapping,
) -> Result<EditScript, DiffError> {
    if mapping.src_len() != src.arena_len() || mapping.dst_len() != dst.arena_len() {
        return Err(DiffError::Invariant(
            "mapping was computed for different trees".to_string(),
        ));
    }
    for (a, b) in mapping.pairs() {
        if !src.is_ancestor_or_self(src.root(), a) || !dst.is_ancestor_or_self(dst.root(), b) {
            return Err(DiffError::Invariant(format!(
                "mapping links detached node {a} -> {b}"
            )));
        }
    }

    let mut generator = Generator::new(src, dst, mapping);
    generator.run()?;

    let deleted = fully_unmatched(src, |id| mapping.is_src_mapped(id));
    let inserted = fully_unmatched(dst, |id| mapping.is_dst_mapped(id));
    let mut actions = Vec::new();

    for a in src.pre_order() {
        if mapping.is_src_mapped(a) {
            continue;
        }
        if src.parent(a).is_some_and(|p| deleted[p.index()]) {
            continue;
        }
        let node = ActionNode::snapshot(src, a, Side::Src);
        if deleted[a.index()] && node.subtree_size > 1 {
            actions.push(Action::TreeDelete { node });
        } else {
            actions.push(Action::SingleDelete { node });
        }
    }

    for a in src.pre_order() {
        let Some(b) = mapping.dst_of(a) else {
            continue;
        };
        let (old, new) = (src.node(a).label(), dst.node(b).label());
        if old != new {
            actions.push(Action::SingleUpdate {
                node: ActionNode::snapshot(src, a, Side::Src),
                old_label: CompactString::from(old),
                new_label: CompactString::from(new),
            });
        }
    }

    for a in src.pre_order() {
        if !generator.moved[a.index()] {
            continue;
        }
        let b = mapping.dst_of(a).ok_or_else(|| {
            DiffError::Invariant(format!("moved node {a} has no partner"))
        })?;
        actions.push(Action::TreeMove {
            node: ActionNode::snapshot(src, a, Side::Src),
            old_parent: parent_snapshot(src, a, Side::Src),
            new_parent: parent_snapshot(dst, b, Side::Dst),
            old_index: src.index_in_parent(a).unwrap_or(0),
            new_index: dst.index_in_parent(b).unwrap_or(0),
        });
    }

    for b in dst.pre_order() {
        if mapping.is_dst_mapped(b) {
            continue;
        }
        if dst.parent(b).is_some_and(|p| inserted[p.index()]) {
            continue;
        }
        let node = ActionNode::snapshot(dst, b, Side::Dst);
        let parent = parent_snapshot(dst, b, Side::Dst);
        let index = dst.index_in_parent(b).unwrap_or(0);
        if inserted[b.index()] && node.subtree_size > 1 {
            actions.push(Action::TreeInsert {
                node,
                parent,
                index,
            });
        } else {
            actions.push(Action::SingleInsert {
                node,
                parent,
                index,
            });
        }
    }

    Ok(EditScript::new(actions))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::action::ActionKind;
    use crate::tree::NodeType;

    fn list(items: &[&str]) -> GenericTree {
        let mut tree = GenericTree::new(NodeType::Block, "", None);
        let root = tree.root();
        for item in items {
            tree.add_child(root, NodeType::Identifier, *item, None);
        }
        tree
    }

    /// Map nodes with equal labels, roots to roots.
    fn by_label(a: &GenericTree, b: &GenericTree) -> Mapping {
        let mut mapping = Mapping::new(a.arena_len(), b.arena_len());
        mapping.link(a.root(), b.root());
        for &x in a.children(a.root()) {
            for &y in b.children(b.root()) {
                if a.node(x).label() == b.node(y).label() && mapping.both_unmapped(x, y) {
                    mapping.link(x, y);
                }
            }
        }
        mapping
    }

    #[test]
    fn test_swapped_siblings_produce_one_move() {
        let a = list(&["x", "y", "z"]);
        let b = list(&["z", "x", "y"]);
        let script = generate(&a, &b, &by_label(&a, &b)).unwrap();
        assert_eq!(script.len(), 1);
        match &script.actions()[0] {
            Action::TreeMove {
                node,
                old_index,
                new_index,
                ..
            } => {
                assert_eq!(node.label, "z");
                assert_eq!(*old_index, 2);
                assert_eq!(*new_index, 0);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_unmatched_leaves_are_single_actions() {
        let a = list(&["x", "gone"]);
        let b = list(&["x", "new"]);
        let script = generate(&a, &b, &by_label(&a, &b)).unwrap();
        let kinds: Vec<_> = script.iter().map(Action::kind).collect();
        assert_eq!(kinds, vec![ActionKind::SingleDelete, ActionKind::SingleInsert]);
    }

    #[test]
    fn test_unmatched_subtree_collapses_to_tree_insert() {
        let a = list(&["x"]);
        let mut b = list(&["x"]);
        let root = b.root();
        let call = b.add_child(root, NodeType::Call, "", None);
        b.add_child(call, NodeType::Identifier, "print", None);
        let args = b.add_child(call, NodeType::Arguments, "", None);
        b.add_child(args, NodeType::Literal, "1", None);

        let script = generate(&a, &b, &by_label(&a, &b)).unwrap();
        assert_eq!(script.len(), 1);
        match &script.actions()[0] {
            Action::TreeInsert {
                node,
                parent,
                index,
            } => {
                assert_eq!(node.node_type, NodeType::Call);
                assert_eq!(node.subtree_size, 4);
                assert_eq!(parent.as_ref().map(|p| p.id), Some(b.root()));
                assert_eq!(*index, 1);
            }
            other => panic!("unexpected action {other:?}"),
        }
    }

    #[test]
    fn test_partially_unmatched_parent_stays_single() {
        // A: Block[x]   B: Block[Call[x]]  (x kept, Call new)
        let a = list(&["x"]);
        let mut b = GenericTree::new(NodeType::Block, "", None);
        let root = b.root();
        let call = b.add_child(root, NodeType::Call, "", None);
        let x = b.add_child(call, NodeType::Identifier, "x", None);

        let mut mapping = Mapping::new(a.arena_len(), b.arena_len());
        mapping.link(a.root(), b.root());
        mapping.link(a.children(a.root())[0], x);

        let script = generate(&a, &b, &mapping).unwrap();
        let kinds: Vec<_> = script.iter().map(Action::kind).collect();
        assert_eq!(kinds, vec![ActionKind::TreeMove, ActionKind::SingleInsert]);
    }

    #[test]
    fn test_unmatched_roots_yield_tree_delete_and_insert() {
        let a = list(&["x", "y"]);
        let mut b = GenericTree::new(NodeType::Unit, "", None);
        let root = b.root();
        b.add_child(root, NodeType::Literal, "1", None);

        let mapping = Mapping::new(a.arena_len(), b.arena_len());
        let script = generate(&a, &b, &mapping).unwrap();
        let kinds: Vec<_> = script.iter().map(Action::kind).collect();
        assert_eq!(kinds, vec![ActionKind::TreeDelete, ActionKind::TreeInsert]);
        assert!(script.actions()[1].node().id == b.root());
    }

    #[test]
    fn test_action_order_is_fixed() {
        let a = list(&["keep", "old", "z", "gone"]);
        let b = list(&["z", "keep", "new", "added"]);
        let mut mapping = by_label(&a, &b);
        // old -> new is a relabel
        mapping.link(a.children(a.root())[1], b.children(b.root())[2]);

        let script = generate(&a, &b, &mapping).unwrap();
        let kinds: Vec<_> = script.iter().map(Action::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActionKind::SingleDelete,
                ActionKind::SingleUpdate,
                ActionKind::TreeMove,
                ActionKind::SingleInsert
            ]
        );
    }

    #[test]
    fn test_foreign_mapping_is_rejected() {
        let a = list(&["x"]);
        let b = list(&["x"]);
        let mapping = Mapping::new(7, 7);
        let err = generate(&a, &b, &mapping).unwrap_err();
        assert!(matches!(err, DiffError::Invariant(_)));
    }
}
