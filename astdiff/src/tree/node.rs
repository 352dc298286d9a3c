//! Node-level types of the generic tree.

use compact_str::CompactString;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;

/// Handle of a node inside one [`GenericTree`](super::GenericTree) arena.
///
/// Handles are only meaningful for the tree that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn from_index(index: usize) -> Self {
        // Arena sizes beyond u32::MAX nodes are not representable.
        #[allow(clippy::cast_possible_truncation)]
        Self(index as u32)
    }

    /// Position of this node in the arena.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Source location a node originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Line number (1-indexed)
    pub line: u32,
    /// Column within the line (0-indexed, in bytes)
    pub column: u32,
}

impl Position {
    /// Create a position from a 1-indexed line and 0-indexed column.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Shared syntax-category taxonomy.
///
/// Each language adapter collapses its grammar's node kinds into these
/// categories. Kinds without a shared category keep their grammar name in
/// [`NodeType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum NodeType {
    /// Whole compilation unit (file)
    Unit,
    /// Import / use / include directive
    Import,
    /// Package or module declaration
    Package,
    /// Class, struct, enum, interface, trait or object declaration
    TypeDecl,
    /// Function, method or constructor declaration
    FunctionDecl,
    /// Formal parameter list
    Parameters,
    /// One formal parameter
    Parameter,
    /// Statement block or declaration body
    Block,
    /// Local or field variable declaration
    VariableDecl,
    /// Assignment (plain or compound)
    Assignment,
    /// Conditional statement or expression
    IfStmt,
    /// Any loop
    LoopStmt,
    /// Switch / match / when
    SwitchStmt,
    /// One arm of a switch-like construct
    CaseClause,
    /// Return
    ReturnStmt,
    /// Break
    BreakStmt,
    /// Continue
    ContinueStmt,
    /// Throw / raise / panic-like statement
    ThrowStmt,
    /// Try statement
    TryStmt,
    /// Catch / except clause
    CatchClause,
    /// Expression used as a statement
    ExpressionStmt,
    /// Function or method call
    Call,
    /// Call argument list
    Arguments,
    /// Binary operation
    BinaryExpr,
    /// Unary operation
    UnaryExpr,
    /// Member / field access
    FieldAccess,
    /// Index / subscript expression
    IndexExpr,
    /// Lambda or closure
    Lambda,
    /// Identifier reference or declaration name
    Identifier,
    /// Type reference
    TypeRef,
    /// Literal value
    Literal,
    /// Modifier or annotation
    Modifier,
    /// Region the grammar could not parse
    Error,
    /// Root of a file no adapter understands
    Unknown,
    /// Grammar kind without a shared category
    Other(CompactString),
}

impl NodeType {
    /// Display name of the category.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Unit => "Unit",
            Self::Import => "Import",
            Self::Package => "Package",
            Self::TypeDecl => "TypeDecl",
            Self::FunctionDecl => "FunctionDecl",
            Self::Parameters => "Parameters",
            Self::Parameter => "Parameter",
            Self::Block => "Block",
            Self::VariableDecl => "VariableDecl",
            Self::Assignment => "Assignment",
            Self::IfStmt => "IfStmt",
            Self::LoopStmt => "LoopStmt",
            Self::SwitchStmt => "SwitchStmt",
            Self::CaseClause => "CaseClause",
            Self::ReturnStmt => "ReturnStmt",
            Self::BreakStmt => "BreakStmt",
            Self::ContinueStmt => "ContinueStmt",
            Self::ThrowStmt => "ThrowStmt",
            Self::TryStmt => "TryStmt",
            Self::CatchClause => "CatchClause",
            Self::ExpressionStmt => "ExpressionStmt",
            Self::Call => "Call",
            Self::Arguments => "Arguments",
            Self::BinaryExpr => "BinaryExpr",
            Self::UnaryExpr => "UnaryExpr",
            Self::FieldAccess => "FieldAccess",
            Self::IndexExpr => "IndexExpr",
            Self::Lambda => "Lambda",
            Self::Identifier => "Identifier",
            Self::TypeRef => "TypeRef",
            Self::Literal => "Literal",
            Self::Modifier => "Modifier",
            Self::Error => "Error",
            Self::Unknown => "Unknown",
            Self::Other(kind) => kind,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One node of a generic tree.
#[derive(Debug, Clone)]
pub struct GenericNode {
    pub(crate) node_type: NodeType,
    pub(crate) label: CompactString,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: SmallVec<[NodeId; 4]>,
    pub(crate) position: Option<Position>,
    pub(crate) subtree_size: usize,
}

impl GenericNode {
    pub(crate) fn new(node_type: NodeType, label: CompactString, position: Option<Position>) -> Self {
        Self {
            node_type,
            label,
            parent: None,
            children: SmallVec::new(),
            position,
            subtree_size: 1,
        }
    }

    /// Syntax category.
    #[must_use]
    pub fn node_type(&self) -> &NodeType {
        &self.node_type
    }

    /// Associated text; empty for structural nodes.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Parent handle, `None` for the root and detached nodes.
    #[must_use]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in source order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Originating location, if known.
    #[must_use]
    pub fn position(&self) -> Option<Position> {
        self.position
    }

    /// Number of nodes in the subtree rooted here (including this node).
    #[must_use]
    pub fn subtree_size(&self) -> usize {
        self.subtree_size
    }

    /// Whether this node has no children.
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}
