//! Edit actions and edit scripts.

use crate::tree::{GenericTree, NodeId, NodeType, Position};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tree of a pair a node belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The first tree (A)
    Src,
    /// The second tree (B)
    Dst,
}

/// Snapshot of the node an action refers to.
///
/// Snapshots are taken from the original trees, so they stay valid after the
/// diff finishes and carry everything reporting and scoring need.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionNode {
    /// Tree the node lives in
    pub side: Side,
    /// Handle inside that tree
    pub id: NodeId,
    /// Syntax category
    pub node_type: NodeType,
    /// Node text (empty for structural nodes)
    pub label: CompactString,
    /// Source location, if known
    pub position: Option<Position>,
    /// Size of the subtree rooted at the node
    pub subtree_size: usize,
}

impl ActionNode {
    pub(crate) fn snapshot(tree: &GenericTree, id: NodeId, side: Side) -> Self {
        let node = tree.node(id);
        Self {
            side,
            id,
            node_type: node.node_type().clone(),
            label: CompactString::from(node.label()),
            position: node.position(),
            subtree_size: node.subtree_size(),
        }
    }
}

/// Action category, used for weighting and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// One node inserted
    SingleInsert,
    /// One node deleted
    SingleDelete,
    /// One node relabelled
    SingleUpdate,
    /// Whole subtree inserted
    TreeInsert,
    /// Whole subtree deleted
    TreeDelete,
    /// Matched subtree relocated
    TreeMove,
}

impl ActionKind {
    /// Every kind, in display order.
    pub const ALL: [Self; 6] = [
        Self::SingleInsert,
        Self::SingleDelete,
        Self::SingleUpdate,
        Self::TreeInsert,
        Self::TreeDelete,
        Self::TreeMove,
    ];

    /// Kebab-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SingleInsert => "single-insert",
            Self::SingleDelete => "single-delete",
            Self::SingleUpdate => "single-update",
            Self::TreeInsert => "tree-insert",
            Self::TreeDelete => "tree-delete",
            Self::TreeMove => "tree-move",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One edit operation transforming tree A into tree B.
///
/// Deleted, updated and moved nodes are snapshots from A; inserted nodes and
/// their parents are snapshots from B. A parent of `None` stands for the
/// virtual root above the tree's real root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    /// A leaf of B with no counterpart in A
    SingleInsert {
        /// Inserted node
        node: ActionNode,
        /// Parent in B
        parent: Option<ActionNode>,
        /// Position among the parent's children in B
        index: usize,
    },
    /// A node of A with no counterpart in B
    SingleDelete {
        /// Deleted node
        node: ActionNode,
    },
    /// A matched node whose label changed
    SingleUpdate {
        /// Updated node
        node: ActionNode,
        /// Label in A
        old_label: CompactString,
        /// Label in B
        new_label: CompactString,
    },
    /// A subtree of B none of whose nodes has a counterpart in A
    TreeInsert {
        /// Root of the inserted subtree
        node: ActionNode,
        /// Parent in B
        parent: Option<ActionNode>,
        /// Position among the parent's children in B
        index: usize,
    },
    /// A subtree of A none of whose nodes has a counterpart in B
    TreeDelete {
        /// Root of the deleted subtree
        node: ActionNode,
    },
    /// A matched subtree that changed parent or sibling position
    TreeMove {
        /// Moved node
        node: ActionNode,
        /// Parent in A
        old_parent: Option<ActionNode>,
        /// Parent in B
        new_parent: Option<ActionNode>,
        /// Position among the parent's children in A
        old_index: usize,
        /// Position among the parent's children in B
        new_index: usize,
    },
}

impl Action {
    /// Category of this action.
    #[must_use]
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::SingleInsert { .. } => ActionKind::SingleInsert,
            Self::SingleDelete { .. } => ActionKind::SingleDelete,
            Self::SingleUpdate { .. } => ActionKind::SingleUpdate,
            Self::TreeInsert { .. } => ActionKind::TreeInsert,
            Self::TreeDelete { .. } => ActionKind::TreeDelete,
            Self::TreeMove { .. } => ActionKind::TreeMove,
        }
    }

    /// The node acted on.
    #[must_use]
    pub fn node(&self) -> &ActionNode {
        match self {
            Self::SingleInsert { node, .. }
            | Self::SingleDelete { node }
            | Self::SingleUpdate { node, .. }
            | Self::TreeInsert { node, .. }
            | Self::TreeDelete { node }
            | Self::TreeMove { node, .. } => node,
        }
    }

    /// Number of nodes this action accounts for when scoring.
    #[must_use]
    pub fn cardinality(&self) -> usize {
        self.node().subtree_size
    }
}

/// Ordered list of actions. Empty means the trees match completely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EditScript {
    actions: Vec<Action>,
}

impl EditScript {
    /// Wrap an already ordered action list.
    #[must_use]
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    /// Script with no actions.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Actions in script order.
    #[must_use]
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Iterate over actions in script order.
    pub fn iter(&self) -> std::slice::Iter<'_, Action> {
        self.actions.iter()
    }

    /// Number of actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    /// Whether the script has no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of actions of one kind.
    #[must_use]
    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind() == kind).count()
    }
}

impl<'a> IntoIterator for &'a EditScript {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}
