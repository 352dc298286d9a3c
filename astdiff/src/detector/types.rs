use super::source::FileId;
use crate::diff::EditScript;
use crate::lang::{BuildQuality, Language};
use crate::scoring::{ComparisonParams, MatchScore};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A file as seen by the batch after its tree was built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRef {
    /// Identifier of the source file
    pub id: FileId,
    /// Display name of the source file
    pub display_name: String,
    /// Language the file was parsed as
    pub language: Language,
    /// Fidelity of the built tree
    pub quality: BuildQuality,
    /// Number of lines in the file
    pub total_lines: usize,
    /// Number of nodes in the built tree
    pub tree_size: usize,
}

/// Outcome of diffing one pair of files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairResult {
    /// First file of the pair
    pub first: FileRef,
    /// Second file of the pair
    pub second: FileRef,
    /// Edit script from the first tree to the second; `None` if diffing failed
    pub script: Option<EditScript>,
    /// Weights the pair is scored with
    pub params: ComparisonParams,
    /// Larger of the two tree sizes
    pub reference_size: usize,
}

/// Why a pair could not be compared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureKind {
    /// Edit script generation found inconsistent data
    Invariant(String),
    /// The comparison panicked
    Panicked(String),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invariant(msg) => write!(f, "invariant violation: {msg}"),
            Self::Panicked(msg) => write!(f, "panicked: {msg}"),
        }
    }
}

/// Status of one compared pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "failure", rename_all = "lowercase")]
pub enum PairStatus {
    /// Both trees were clean and the diff completed
    Success,
    /// The diff completed, but at least one tree is partial or a placeholder
    Degraded,
    /// The diff did not complete
    Failed(FailureKind),
}

impl PairStatus {
    /// Whether the pair produced an edit script.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    /// Short label for tables.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Success => "ok",
            Self::Degraded => "degraded",
            Self::Failed(_) => "failed",
        }
    }
}

/// A scored pair, as collected by the detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRecord {
    /// Positions of the two files in [`BatchOutcome::files`]
    pub index: (usize, usize),
    /// Diff outcome
    pub result: PairResult,
    /// Completion status
    pub status: PairStatus,
    /// Score of the pair
    pub score: MatchScore,
}

/// Everything a batch produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Built files, sorted by display name then id
    pub files: Vec<FileRef>,
    /// Completed pairs in pair-generation order
    pub pairs: Vec<PairRecord>,
    /// Whether the batch stopped early; unfinished pairs are absent
    pub cancelled: bool,
}

impl BatchOutcome {
    /// Number of pairs that did not complete.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.pairs
            .iter()
            .filter(|p| !p.status.is_completed())
            .count()
    }

    /// Number of pairs compared against at least one partial tree.
    #[must_use]
    pub fn degraded_count(&self) -> usize {
        self.pairs
            .iter()
            .filter(|p| p.status == PairStatus::Degraded)
            .count()
    }
}
