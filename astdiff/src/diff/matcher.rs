//! GumTree-style node matching.
//!
//! Matching runs in two phases:
//!
//! 1. **Top-down**: the largest isomorphic subtrees are matched greedily,
//!    tallest first. Subtrees that are isomorphic to more than one candidate
//!    are resolved afterwards by the similarity of their parents, then by
//!    size, then by source order.
//! 2. **Bottom-up**: container nodes whose descendants were matched are paired
//!    with the best same-typed candidate by Dice similarity. Each new pair
//!    runs a recovery pass over its children (LCS on exact subtrees, LCS on
//!    label-blind subtrees, then unique-type histogram matching) to catch
//!    renamed leaves and small subtrees the first phase skipped.
//!
//! Every choice breaks ties by pre-order rank, so the same two trees always
//! produce the same mapping. Matching always runs from the lesser tree to
//! the greater one under [`tree_order`], so swapping the inputs yields the
//! transposed mapping.

use super::index::TreeIndex;
use super::lcs::lcs;
use super::mapping::Mapping;
use crate::tree::{GenericTree, NodeId, NodeType};
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Matcher tuning knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Minimum subtree height considered by the top-down phase
    pub min_height: usize,
    /// Minimum Dice similarity for a bottom-up container match
    pub min_dice: f64,
    /// Largest subtree (in nodes) the recovery pass descends into
    pub max_recovery_size: usize,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            min_height: 2,
            min_dice: 0.5,
            max_recovery_size: 1000,
        }
    }
}

/// Computes a [`Mapping`] between two trees.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatcherConfig,
}

impl Matcher {
    /// Create a matcher with the given configuration.
    #[must_use]
    pub fn new(config: MatcherConfig) -> Self {
        Self { config }
    }

    /// Match `src` against `dst`.
    #[must_use]
    pub fn match_trees(&self, src: &GenericTree, dst: &GenericTree) -> Mapping {
        let src = TreeIndex::new(src);
        let dst = TreeIndex::new(dst);
        self.match_indexed(&src, &dst)
    }

    pub(crate) fn match_indexed(&self, src: &TreeIndex<'_>, dst: &TreeIndex<'_>) -> Mapping {
        if tree_order(src, dst) == Ordering::Greater {
            return self.match_oriented(dst, src).transposed();
        }
        self.match_oriented(src, dst)
    }

    fn match_oriented(&self, src: &TreeIndex<'_>, dst: &TreeIndex<'_>) -> Mapping {
        let mut state = MatchState {
            config: self.config,
            src,
            dst,
            mapping: Mapping::new(src.tree.arena_len(), dst.tree.arena_len()),
        };

        // A root without children leaves nothing to match beyond the roots.
        if src.tree.size() <= 1 || dst.tree.size() <= 1 {
            state.match_roots();
            return state.mapping;
        }

        state.top_down();
        state.bottom_up();
        state.mapping
    }
}

struct MatchState<'a, 't> {
    config: MatcherConfig,
    src: &'a TreeIndex<'t>,
    dst: &'a TreeIndex<'t>,
    mapping: Mapping,
}

/// Nodes grouped by height, popped tallest first.
struct HeightQueue<'a, 't> {
    index: &'a TreeIndex<'t>,
    buckets: BTreeMap<usize, Vec<NodeId>>,
}

impl<'a, 't> HeightQueue<'a, 't> {
    fn new(index: &'a TreeIndex<'t>, start: NodeId) -> Self {
        let mut queue = Self {
            index,
            buckets: BTreeMap::new(),
        };
        queue.push(start);
        queue
    }

    fn push(&mut self, id: NodeId) {
        self.buckets
            .entry(self.index.height(id))
            .or_default()
            .push(id);
    }

    fn peek_max(&self) -> usize {
        self.buckets.keys().next_back().copied().unwrap_or(0)
    }

    fn pop(&mut self) -> Vec<NodeId> {
        let mut nodes = self
            .buckets
            .pop_last()
            .map(|(_, nodes)| nodes)
            .unwrap_or_default();
        nodes.sort_by_key(|&id| self.index.rank(id));
        nodes
    }

    fn open(&mut self, id: NodeId) {
        for &child in self.index.tree.children(id) {
            self.push(child);
        }
    }
}

impl MatchState<'_, '_> {
    fn match_roots(&mut self) {
        let (a, b) = (self.src.tree.root(), self.dst.tree.root());
        if self.mapping.both_unmapped(a, b)
            && self.src.tree.node(a).node_type() == self.dst.tree.node(b).node_type()
        {
            self.mapping.link(a, b);
        }
    }

    // ------------------------------------------------------------------
    // Top-down phase
    // ------------------------------------------------------------------

    fn top_down(&mut self) {
        let min_height = self.config.min_height.max(1);
        let src_counts = hash_counts(self.src);
        let dst_counts = hash_counts(self.dst);

        let mut src_queue = HeightQueue::new(self.src, self.src.tree.root());
        let mut dst_queue = HeightQueue::new(self.dst, self.dst.tree.root());
        let mut ambiguous: Vec<(NodeId, NodeId)> = Vec::new();

        while src_queue.peek_max().min(dst_queue.peek_max()) >= min_height {
            let (hs, hd) = (src_queue.peek_max(), dst_queue.peek_max());
            if hs != hd {
                if hs > hd {
                    for id in src_queue.pop() {
                        src_queue.open(id);
                    }
                } else {
                    for id in dst_queue.pop() {
                        dst_queue.open(id);
                    }
                }
                continue;
            }

            let src_nodes = src_queue.pop();
            let dst_nodes = dst_queue.pop();

            let mut dst_by_hash: FxHashMap<u64, Vec<NodeId>> = FxHashMap::default();
            for &d in &dst_nodes {
                dst_by_hash.entry(self.dst.hash(d)).or_default().push(d);
            }

            let mut held_src: FxHashSet<NodeId> = FxHashSet::default();
            let mut held_dst: FxHashSet<NodeId> = FxHashSet::default();
            for &s in &src_nodes {
                let hash = self.src.hash(s);
                let Some(candidates) = dst_by_hash.get(&hash) else {
                    continue;
                };
                for &d in candidates {
                    if !self.src.same_subtree(s, self.dst, d, true) {
                        continue;
                    }
                    let unique = src_counts.get(&hash) == Some(&1)
                        && dst_counts.get(&hash) == Some(&1);
                    if unique {
                        self.link_subtrees(s, d);
                    } else {
                        ambiguous.push((s, d));
                        held_src.insert(s);
                        held_dst.insert(d);
                    }
                }
            }

            for &s in &src_nodes {
                if !self.mapping.is_src_mapped(s) && !held_src.contains(&s) {
                    src_queue.open(s);
                }
            }
            for &d in &dst_nodes {
                if !self.mapping.is_dst_mapped(d) && !held_dst.contains(&d) {
                    dst_queue.open(d);
                }
            }
        }

        self.resolve_ambiguous(ambiguous);
    }

    fn resolve_ambiguous(&mut self, mut candidates: Vec<(NodeId, NodeId)>) {
        if candidates.is_empty() {
            return;
        }
        let mut scored: Vec<(f64, (NodeId, NodeId))> = candidates
            .drain(..)
            .map(|(s, d)| {
                let dice = match (self.src.tree.parent(s), self.dst.tree.parent(d)) {
                    (Some(ps), Some(pd)) => self.dice(ps, pd),
                    _ => 0.0,
                };
                (dice, (s, d))
            })
            .collect();

        scored.sort_by(|(da, (sa, ta)), (db, (sb, tb))| {
            db.total_cmp(da)
                .then_with(|| self.src.size(*sb).cmp(&self.src.size(*sa)))
                .then_with(|| self.src.rank(*sa).cmp(&self.src.rank(*sb)))
                .then_with(|| self.dst.rank(*ta).cmp(&self.dst.rank(*tb)))
        });

        for (_, (s, d)) in scored {
            if self.mapping.both_unmapped(s, d) {
                self.link_subtrees(s, d);
            }
        }
    }

    /// Link two subtrees node by node in pre-order, skipping any pair where
    /// one side is already mapped.
    fn link_subtrees(&mut self, s: NodeId, d: NodeId) {
        let pairs: Vec<(NodeId, NodeId)> = self
            .src
            .tree
            .subtree(s)
            .zip(self.dst.tree.subtree(d))
            .collect();
        for (x, y) in pairs {
            if self.mapping.both_unmapped(x, y) {
                self.mapping.link(x, y);
            }
        }
    }

    // ------------------------------------------------------------------
    // Bottom-up phase
    // ------------------------------------------------------------------

    fn bottom_up(&mut self) {
        let src_root = self.src.tree.root();
        let order: Vec<NodeId> = self.src.tree.post_order().collect();
        for s in order {
            if s == src_root {
                let d = self.dst.tree.root();
                if self.mapping.both_unmapped(s, d)
                    && self.src.tree.node(s).node_type() == self.dst.tree.node(d).node_type()
                {
                    self.mapping.link(s, d);
                }
                if self.mapping.has(s, d) {
                    self.recover(s, d);
                }
                break;
            }
            if self.mapping.is_src_mapped(s) || self.src.tree.node(s).is_leaf() {
                continue;
            }

            let mut best: Option<(f64, NodeId)> = None;
            for d in self.candidates(s) {
                let sim = self.dice(s, d);
                let better = match best {
                    None => true,
                    Some((score, current)) => match sim.total_cmp(&score) {
                        Ordering::Greater => true,
                        Ordering::Equal => self.dst.rank(d) < self.dst.rank(current),
                        Ordering::Less => false,
                    },
                };
                if better {
                    best = Some((sim, d));
                }
            }

            if let Some((sim, d)) = best {
                if sim > self.config.min_dice {
                    self.mapping.link(s, d);
                    self.recover(s, d);
                }
            }
        }
    }

    /// Unmapped, non-root destination ancestors (with the same type as `s`)
    /// of the partners of `s`'s matched descendants.
    fn candidates(&self, s: NodeId) -> Vec<NodeId> {
        let wanted = self.src.tree.node(s).node_type();
        let dst_root = self.dst.tree.root();
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut found = Vec::new();

        for desc in self.src.tree.descendants(s) {
            let Some(seed) = self.mapping.dst_of(desc) else {
                continue;
            };
            let mut current = seed;
            while let Some(parent) = self.dst.tree.parent(current) {
                if !visited.insert(parent) {
                    break;
                }
                if parent != dst_root
                    && !self.mapping.is_dst_mapped(parent)
                    && self.dst.tree.node(parent).node_type() == wanted
                {
                    found.push(parent);
                }
                current = parent;
            }
        }
        found.sort_by_key(|&d| self.dst.rank(d));
        found
    }

    /// Dice coefficient of the mapped descendants of `s` and `d`.
    fn dice(&self, s: NodeId, d: NodeId) -> f64 {
        let src_desc = self.src.size(s) - 1;
        let dst_desc = self.dst.size(d) - 1;
        if src_desc + dst_desc == 0 {
            return 0.0;
        }
        let common = self
            .src
            .tree
            .descendants(s)
            .filter_map(|x| self.mapping.dst_of(x))
            .filter(|&y| self.dst.is_descendant(y, d))
            .count();
        2.0 * common as f64 / (src_desc + dst_desc) as f64
    }

    // ------------------------------------------------------------------
    // Recovery
    // ------------------------------------------------------------------

    fn recover(&mut self, s: NodeId, d: NodeId) {
        let limit = self.config.max_recovery_size;
        if self.src.size(s) >= limit || self.dst.size(d) >= limit {
            return;
        }
        self.lcs_children(s, d, true);
        self.lcs_children(s, d, false);
        self.histogram(s, d);
    }

    fn unmapped_src_children(&self, s: NodeId) -> Vec<NodeId> {
        self.src
            .tree
            .children(s)
            .iter()
            .copied()
            .filter(|&c| !self.mapping.is_src_mapped(c))
            .collect()
    }

    fn unmapped_dst_children(&self, d: NodeId) -> Vec<NodeId> {
        self.dst
            .tree
            .children(d)
            .iter()
            .copied()
            .filter(|&c| !self.mapping.is_dst_mapped(c))
            .collect()
    }

    fn lcs_children(&mut self, s: NodeId, d: NodeId, with_labels: bool) {
        let src_children = self.unmapped_src_children(s);
        let dst_children = self.unmapped_dst_children(d);
        let pairs = lcs(&src_children, &dst_children, |&x, &y| {
            self.src.same_subtree(x, self.dst, y, with_labels)
        });
        for (i, j) in pairs {
            self.link_subtrees(src_children[i], dst_children[j]);
        }
    }

    fn histogram(&mut self, s: NodeId, d: NodeId) {
        let src_children = self.unmapped_src_children(s);
        let dst_children = self.unmapped_dst_children(d);

        let mut src_groups: Vec<(NodeType, Vec<NodeId>)> = Vec::new();
        for &c in &src_children {
            let ty = self.src.tree.node(c).node_type();
            match src_groups.iter_mut().find(|(t, _)| t == ty) {
                Some((_, group)) => group.push(c),
                None => src_groups.push((ty.clone(), vec![c])),
            }
        }

        let mut matched = Vec::new();
        for (ty, group) in &src_groups {
            if group.len() != 1 {
                continue;
            }
            let mut same: Vec<NodeId> = dst_children
                .iter()
                .copied()
                .filter(|&c| self.dst.tree.node(c).node_type() == ty)
                .collect();
            if same.len() == 1 {
                if let Some(dc) = same.pop() {
                    matched.push((group[0], dc));
                }
            }
        }

        for (sc, dc) in matched {
            if self.mapping.both_unmapped(sc, dc) {
                self.mapping.link(sc, dc);
                self.recover(sc, dc);
            }
        }
    }
}

/// Total order over trees: size first, then node type, label and arity in
/// pre-order. Two trees compare equal exactly when they are equal.
fn tree_order(a: &TreeIndex<'_>, b: &TreeIndex<'_>) -> Ordering {
    a.tree.size().cmp(&b.tree.size()).then_with(|| {
        a.pre_order()
            .iter()
            .zip(b.pre_order())
            .map(|(&x, &y)| {
                let (x, y) = (a.tree.node(x), b.tree.node(y));
                x.node_type()
                    .cmp(y.node_type())
                    .then_with(|| x.label().cmp(y.label()))
                    .then_with(|| x.children().len().cmp(&y.children().len()))
            })
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    })
}

fn hash_counts(index: &TreeIndex<'_>) -> FxHashMap<u64, usize> {
    let mut counts = FxHashMap::default();
    for &id in index.pre_order() {
        *counts.entry(index.hash(id)).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `fn <name>() { return <value>; }` repeated for each entry.
    fn program(functions: &[(&str, &str)]) -> GenericTree {
        let mut tree = GenericTree::new(NodeType::Unit, "", None);
        let root = tree.root();
        for (name, value) in functions {
            let func = tree.add_child(root, NodeType::FunctionDecl, "", None);
            tree.add_child(func, NodeType::Identifier, *name, None);
            let body = tree.add_child(func, NodeType::Block, "", None);
            let ret = tree.add_child(body, NodeType::ReturnStmt, "", None);
            tree.add_child(ret, NodeType::Literal, *value, None);
        }
        tree
    }

    #[test]
    fn test_identical_trees_map_every_node() {
        let a = program(&[("f", "1"), ("g", "2")]);
        let b = program(&[("f", "1"), ("g", "2")]);
        let mapping = Matcher::default().match_trees(&a, &b);
        assert_eq!(mapping.len(), a.size());
        for (s, d) in mapping.pairs() {
            assert_eq!(a.node(s).label(), b.node(d).label());
        }
    }

    #[test]
    fn test_renamed_leaf_is_recovered() {
        let a = program(&[("f", "1")]);
        let b = program(&[("renamed", "1")]);
        let mapping = Matcher::default().match_trees(&a, &b);
        assert_eq!(mapping.len(), a.size());
        let ident_a = a
            .pre_order()
            .find(|&id| a.node(id).label() == "f")
            .unwrap();
        let partner = mapping.dst_of(ident_a).unwrap();
        assert_eq!(b.node(partner).label(), "renamed");
    }

    #[test]
    fn test_reordered_functions_keep_partners() {
        let a = program(&[("f", "1"), ("g", "2")]);
        let b = program(&[("g", "2"), ("f", "1")]);
        let mapping = Matcher::default().match_trees(&a, &b);
        assert_eq!(mapping.len(), a.size());
        for (s, d) in mapping.pairs() {
            assert_eq!(a.node(s).label(), b.node(d).label());
        }
    }

    #[test]
    fn test_duplicate_subtrees_prefer_source_order() {
        let a = program(&[("f", "1"), ("f", "1")]);
        let b = program(&[("f", "1"), ("f", "1")]);
        let mapping = Matcher::default().match_trees(&a, &b);
        let first_a = a.children(a.root())[0];
        let first_b = b.children(b.root())[0];
        assert_eq!(mapping.dst_of(first_a), Some(first_b));
    }

    #[test]
    fn test_single_root_trees() {
        let a = GenericTree::new(NodeType::Unknown, "", None);
        let b = program(&[("f", "1")]);
        let mapping = Matcher::default().match_trees(&a, &b);
        assert!(mapping.is_empty());

        let c = GenericTree::new(NodeType::Unit, "", None);
        let mapping = Matcher::default().match_trees(&c, &b);
        assert_eq!(mapping.len(), 1);
        assert!(mapping.has(c.root(), b.root()));
    }

    #[test]
    fn test_swapped_inputs_give_transposed_mapping() {
        // Unit[Call[Block[a], a]] against Unit[Call[x, b]]: both leaves of B
        // fit the lone leaf of A equally well.
        let mut a = GenericTree::new(NodeType::Unit, "", None);
        let root = a.root();
        let call = a.add_child(root, NodeType::Call, "", None);
        let block = a.add_child(call, NodeType::Block, "", None);
        a.add_child(block, NodeType::Identifier, "a", None);
        a.add_child(call, NodeType::Identifier, "a", None);

        let mut b = GenericTree::new(NodeType::Unit, "", None);
        let root = b.root();
        let call = b.add_child(root, NodeType::Call, "", None);
        b.add_child(call, NodeType::Identifier, "x", None);
        b.add_child(call, NodeType::Identifier, "b", None);

        let forward = Matcher::default().match_trees(&a, &b);
        let backward = Matcher::default().match_trees(&b, &a);
        assert_eq!(backward.transposed(), forward);
    }

    #[test]
    fn test_tree_order_is_antisymmetric() {
        let a = program(&[("f", "1")]);
        let b = program(&[("g", "1")]);
        let (ia, ib) = (TreeIndex::new(&a), TreeIndex::new(&b));
        assert_eq!(tree_order(&ia, &ib), Ordering::Less);
        assert_eq!(tree_order(&ib, &ia), Ordering::Greater);
        assert_eq!(tree_order(&ia, &TreeIndex::new(&a.clone())), Ordering::Equal);
    }

    #[test]
    fn test_matching_is_deterministic() {
        let a = program(&[("f", "1"), ("g", "1"), ("h", "3")]);
        let b = program(&[("g", "1"), ("x", "1"), ("h", "4")]);
        let first = Matcher::default().match_trees(&a, &b);
        for _ in 0..5 {
            assert_eq!(Matcher::default().match_trees(&a, &b), first);
        }
    }
}
