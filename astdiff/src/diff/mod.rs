//! Tree differencing: node matching and edit script generation.
//!
//! [`diff`] is the entry point. It short-circuits on equal trees and
//! otherwise runs the [`Matcher`] followed by the edit script generator.

pub mod action;
mod edit_script;
pub mod index;
pub mod lcs;
pub mod mapping;
pub mod matcher;

pub use action::{Action, ActionKind, ActionNode, EditScript, Side};
pub use mapping::Mapping;
pub use matcher::{Matcher, MatcherConfig};

use crate::tree::GenericTree;

/// Errors raised while differencing two trees.
#[derive(Debug, thiserror::Error)]
pub enum DiffError {
    /// An internal consistency check failed.
    #[error("Diff invariant violated: {0}")]
    Invariant(String),
}

/// Compute the edit script turning `a` into `b`.
///
/// Trees that are equal (same types, labels and shape in pre-order) produce
/// an empty script without running the matcher.
///
/// # Errors
///
/// Returns [`DiffError::Invariant`] if script generation finds the mapping
/// inconsistent with the trees.
pub fn diff(a: &GenericTree, b: &GenericTree, config: &MatcherConfig) -> Result<EditScript, DiffError> {
    if a == b {
        return Ok(EditScript::empty());
    }
    let mapping = Matcher::new(*config).match_trees(a, b);
    edit_script::generate(a, b, &mapping)
}

/// Generate the edit script for an externally computed mapping.
///
/// # Errors
///
/// Returns [`DiffError::Invariant`] if `mapping` was not built for `a` and
/// `b` or links nodes outside either tree.
pub fn diff_with_mapping(
    a: &GenericTree,
    b: &GenericTree,
    mapping: &Mapping,
) -> Result<EditScript, DiffError> {
    edit_script::generate(a, b, mapping)
}
