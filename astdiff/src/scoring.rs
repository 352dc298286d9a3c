//! Turning edit scripts into similarity scores.
//!
//! Each action costs the size of the subtree it touches times the weight of
//! its kind. The ceiling of a pair is the reference tree size times a
//! per-node constant; the score is what is left of the ceiling after paying
//! for the script, and similarity is that score as a fraction of the ceiling.

use crate::config::ConfigError;
use crate::detector::PairResult;
use crate::diff::{ActionKind, EditScript};
use serde::{Deserialize, Serialize};

/// Default points per node of the reference tree.
pub const DEFAULT_PER_NODE_CEILING: f64 = 10.0;

/// Weight of each action kind.
///
/// Single-node edits default to `1.0`; whole-subtree inserts and deletes to
/// `5.0`, since replacing entire blocks says more about dissimilarity than
/// token tweaks do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ComparisonParams {
    /// Weight of [`ActionKind::SingleInsert`]
    pub single_insert: f64,
    /// Weight of [`ActionKind::SingleUpdate`]
    pub single_update: f64,
    /// Weight of [`ActionKind::SingleDelete`]
    pub single_delete: f64,
    /// Weight of [`ActionKind::TreeMove`]
    pub tree_move: f64,
    /// Weight of [`ActionKind::TreeInsert`]
    pub tree_insert: f64,
    /// Weight of [`ActionKind::TreeDelete`]
    pub tree_delete: f64,
}

impl Default for ComparisonParams {
    fn default() -> Self {
        Self {
            single_insert: 1.0,
            single_update: 1.0,
            single_delete: 1.0,
            tree_move: 1.0,
            tree_insert: 5.0,
            tree_delete: 5.0,
        }
    }
}

impl ComparisonParams {
    /// Weight configured for `kind`.
    #[must_use]
    pub fn weight(&self, kind: ActionKind) -> f64 {
        match kind {
            ActionKind::SingleInsert => self.single_insert,
            ActionKind::SingleUpdate => self.single_update,
            ActionKind::SingleDelete => self.single_delete,
            ActionKind::TreeMove => self.tree_move,
            ActionKind::TreeInsert => self.tree_insert,
            ActionKind::TreeDelete => self.tree_delete,
        }
    }

    /// Replace the weight for `kind`.
    pub fn set_weight(&mut self, kind: ActionKind, weight: f64) {
        let slot = match kind {
            ActionKind::SingleInsert => &mut self.single_insert,
            ActionKind::SingleUpdate => &mut self.single_update,
            ActionKind::SingleDelete => &mut self.single_delete,
            ActionKind::TreeMove => &mut self.tree_move,
            ActionKind::TreeInsert => &mut self.tree_insert,
            ActionKind::TreeDelete => &mut self.tree_delete,
        };
        *slot = weight;
    }

    /// Check that every weight is finite and non-negative.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidWeight`] naming the first bad weight.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in ActionKind::ALL {
            let weight = self.weight(kind);
            if !weight.is_finite() || weight < 0.0 {
                return Err(ConfigError::InvalidWeight { kind, weight });
            }
        }
        Ok(())
    }
}

/// Score of one compared pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchScore {
    /// Points left after paying for the edit script
    pub score: u64,
    /// Points available for this pair
    pub max_score: u64,
    /// `score / max_score`, or 0 when `max_score` is 0
    pub similarity: f64,
}

/// Weighted cost of a script: Σ subtree size × weight of the action kind.
#[must_use]
pub fn total_cost(script: &EditScript, params: &ComparisonParams) -> f64 {
    script
        .iter()
        .map(|action| action.cardinality() as f64 * params.weight(action.kind()))
        .sum()
}

/// Computes [`MatchScore`]s. Pure and safe to share between threads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scorer {
    per_node_ceiling: f64,
}

impl Default for Scorer {
    fn default() -> Self {
        Self::new(DEFAULT_PER_NODE_CEILING)
    }
}

impl Scorer {
    /// Scorer granting `per_node_ceiling` points per reference node.
    ///
    /// Negative or non-finite ceilings are treated as 0.
    #[must_use]
    pub fn new(per_node_ceiling: f64) -> Self {
        let per_node_ceiling = if per_node_ceiling.is_finite() && per_node_ceiling > 0.0 {
            per_node_ceiling
        } else {
            0.0
        };
        Self { per_node_ceiling }
    }

    /// Points granted per reference node.
    #[must_use]
    pub fn per_node_ceiling(&self) -> f64 {
        self.per_node_ceiling
    }

    /// Score a script against a reference tree size.
    ///
    /// A missing script (the diff never ran) scores 0.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn score_script(
        &self,
        script: Option<&EditScript>,
        params: &ComparisonParams,
        reference_size: usize,
    ) -> MatchScore {
        let max = (reference_size as f64 * self.per_node_ceiling).round();
        let max_score = max as u64;
        let score = match script {
            Some(script) => (max - total_cost(script, params)).round().clamp(0.0, max) as u64,
            None => 0,
        };
        let similarity = if max_score == 0 {
            0.0
        } else {
            score as f64 / max_score as f64
        };
        MatchScore {
            score,
            max_score,
            similarity,
        }
    }

    /// Score a finished pair using the weights it was compared with.
    #[must_use]
    pub fn score(&self, result: &PairResult) -> MatchScore {
        self.score_script(result.script.as_ref(), &result.params, result.reference_size)
    }
}
