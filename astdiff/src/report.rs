//! Match groups built from a finished batch.
//!
//! A match group pairs the two compared files with the pair's score and a
//! flat, display-ready view of its edit script.

use crate::constants::MATCH_GROUP_REASON;
use crate::detector::{BatchOutcome, FileId, FileRef, PairRecord, PairStatus};
use crate::diff::{Action, ActionKind};
use crate::scoring::MatchScore;
use serde::Serialize;
use std::fmt::Write as _;
use std::ops::Range;

/// One file of a match group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchEntry {
    /// Identifier of the file
    pub file_id: FileId,
    /// Display name of the file
    pub display_name: String,
    /// Score of the pair the file belongs to
    pub score: MatchScore,
    /// Lines covered by the match (always the whole file)
    pub lines: Range<usize>,
}

impl MatchEntry {
    fn new(file: &FileRef, score: MatchScore) -> Self {
        Self {
            file_id: file.id,
            display_name: file.display_name.clone(),
            score,
            lines: 0..file.total_lines,
        }
    }
}

/// Flattened view of one edit action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionView {
    /// Action kind
    pub kind: ActionKind,
    /// Syntax category of the affected node
    pub node_type: String,
    /// Node text, when it has any
    pub text: Option<String>,
    /// 1-indexed line, when known
    pub line: Option<u32>,
    /// 0-indexed column, when known
    pub column: Option<u32>,
}

impl ActionView {
    /// View of `action`, describing the node it acts on.
    #[must_use]
    pub fn from_action(action: &Action) -> Self {
        let node = action.node();
        Self {
            kind: action.kind(),
            node_type: node.node_type.as_str().to_owned(),
            text: (!node.label.is_empty()).then(|| node.label.to_string()),
            line: node.position.map(|p| p.line),
            column: node.position.map(|p| p.column),
        }
    }

    /// One-line description, e.g.
    /// `Action: single-update, Node: [Identifier] "run", Line: 3, Position: 9`.
    ///
    /// The text is quoted and escaped as a JSON string.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut line = format!("Action: {}, Node: [{}]", self.kind, self.node_type);
        if let Some(text) = &self.text {
            let quoted = serde_json::to_string(text).unwrap_or_else(|_| format!("\"{text}\""));
            let _ = write!(line, " {quoted}");
        }
        if let (Some(l), Some(c)) = (self.line, self.column) {
            let _ = write!(line, ", Line: {l}, Position: {c}");
        }
        line
    }
}

/// Report unit for one compared pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchGroup {
    /// The two files of the pair
    pub entries: [MatchEntry; 2],
    /// Fixed reason label
    pub reason: &'static str,
    /// Completion status of the pair
    pub status: PairStatus,
    /// Score of the pair
    pub score: MatchScore,
    /// Edit actions, in script order (empty for failed pairs)
    pub actions: Vec<ActionView>,
}

/// Turns batch outcomes into match groups.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostProcessor;

impl PostProcessor {
    /// One group per pair, in pair order.
    #[must_use]
    pub fn process(&self, outcome: &BatchOutcome) -> Vec<MatchGroup> {
        outcome.pairs.iter().map(Self::group).collect()
    }

    fn group(record: &PairRecord) -> MatchGroup {
        let actions = record
            .result
            .script
            .as_ref()
            .map(|script| script.iter().map(ActionView::from_action).collect())
            .unwrap_or_default();
        MatchGroup {
            entries: [
                MatchEntry::new(&record.result.first, record.score),
                MatchEntry::new(&record.result.second, record.score),
            ],
            reason: MATCH_GROUP_REASON,
            status: record.status.clone(),
            score: record.score,
            actions,
        }
    }
}
