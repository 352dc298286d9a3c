//! End-to-end scenarios for pairwise comparison.
#![allow(clippy::unwrap_used, clippy::panic)]

use astdiff::detector::{
    AstDiffDetector, BatchOutcome, CancellationToken, DetectorOptions, MemoryFile, PairRecord,
    PairStatus,
};
use astdiff::diff::{Action, ActionKind, EditScript};
use astdiff::lang::{AdapterRegistry, BuildOutcome, BuildQuality, Language, LanguageAdapter};
use astdiff::tree::NodeType;
use std::sync::Arc;

const CALC: &str = "\
class Calc {
    int add(int a, int b) {
        return a + b;
    }

    int sub(int a, int b) {
        return a - b;
    }
}
";

const CALC_WITH_NEG: &str = "\
class Calc {
    int add(int a, int b) {
        return a + b;
    }

    int sub(int a, int b) {
        return a - b;
    }

    int neg(int a) {
        return -a;
    }
}
";

const UNRELATED: &str = "\
class Printer {
    void print(String[] lines) {
        for (String line : lines) {
            System.out.println(line.trim());
        }
        if (lines.length == 0) {
            throw new IllegalStateException(\"empty\");
        }
    }
}
";

fn run(files: &[MemoryFile]) -> BatchOutcome {
    AstDiffDetector::default()
        .run(files, &CancellationToken::new())
        .unwrap()
}

fn only_pair(files: &[MemoryFile]) -> PairRecord {
    let mut outcome = run(files);
    assert_eq!(outcome.pairs.len(), 1);
    outcome.pairs.remove(0)
}

fn script(record: &PairRecord) -> &EditScript {
    record.result.script.as_ref().unwrap()
}

#[test]
fn test_identical_files_score_one() {
    let record = only_pair(&[
        MemoryFile::new(1, "A.java", CALC),
        MemoryFile::new(2, "B.java", CALC),
    ]);
    assert_eq!(record.status, PairStatus::Success);
    assert!(script(&record).is_empty());
    assert!((record.score.similarity - 1.0).abs() < f64::EPSILON);
    assert_eq!(record.score.score, record.score.max_score);
}

#[test]
fn test_renamed_variable_gives_only_updates() {
    let before = "\
class Counter {
    int count(int total) {
        int result = total + 1;
        return result;
    }
}
";
    let after = before.replace("result", "sum");
    let record = only_pair(&[
        MemoryFile::new(1, "A.java", before),
        MemoryFile::new(2, "B.java", after),
    ]);

    let script = script(&record);
    assert_eq!(script.len(), 2);
    for action in script {
        match action {
            Action::SingleUpdate {
                old_label,
                new_label,
                ..
            } => {
                assert_eq!(old_label.as_str(), "result");
                assert_eq!(new_label.as_str(), "sum");
            }
            other => panic!("unexpected action {other:?}"),
        }
    }
    assert!(record.score.similarity < 1.0);
    assert!(record.score.similarity > 0.9);
}

#[test]
fn test_appended_method_is_a_single_tree_insert() {
    let record = only_pair(&[
        MemoryFile::new(1, "A.java", CALC),
        MemoryFile::new(2, "B.java", CALC_WITH_NEG),
    ]);
    let script = script(&record);

    assert_eq!(script.count(ActionKind::TreeInsert), 1);
    assert_eq!(script.count(ActionKind::TreeDelete), 0);
    assert_eq!(script.count(ActionKind::SingleDelete), 0);
    let insert = script
        .iter()
        .find(|a| a.kind() == ActionKind::TreeInsert)
        .unwrap();
    assert_eq!(insert.node().node_type, NodeType::FunctionDecl);
    assert!(insert.cardinality() > 1);

    let unrelated = only_pair(&[
        MemoryFile::new(1, "A.java", CALC),
        MemoryFile::new(3, "C.java", UNRELATED),
    ]);
    assert!(record.score.similarity < 1.0);
    assert!(record.score.similarity > unrelated.score.similarity);
}

#[test]
fn test_reverse_direction_mirrors_inserts() {
    let forward = only_pair(&[
        MemoryFile::new(1, "A.java", CALC),
        MemoryFile::new(2, "B.java", CALC_WITH_NEG),
    ]);
    let backward = only_pair(&[
        MemoryFile::new(1, "A.java", CALC_WITH_NEG),
        MemoryFile::new(2, "B.java", CALC),
    ]);

    let f = script(&forward);
    let b = script(&backward);
    assert_eq!(
        f.count(ActionKind::TreeInsert),
        b.count(ActionKind::TreeDelete)
    );
    assert_eq!(
        f.count(ActionKind::SingleInsert),
        b.count(ActionKind::SingleDelete)
    );
    let inserted = f.iter().find(|a| a.kind() == ActionKind::TreeInsert).unwrap();
    let deleted = b.iter().find(|a| a.kind() == ActionKind::TreeDelete).unwrap();
    assert_eq!(inserted.node().node_type, deleted.node().node_type);
    assert_eq!(inserted.cardinality(), deleted.cardinality());
}

#[test]
fn test_batch_of_three_is_stable() {
    let files = vec![
        MemoryFile::new(30, "z/Z.java", UNRELATED),
        MemoryFile::new(10, "x/X.java", CALC),
        MemoryFile::new(20, "y/Y.java", CALC_WITH_NEG),
    ];
    let first = run(&files);
    let second = run(&files);

    assert!(!first.cancelled);
    let names: Vec<_> = first.files.iter().map(|f| f.display_name.as_str()).collect();
    assert_eq!(names, vec!["x/X.java", "y/Y.java", "z/Z.java"]);
    let indices: Vec<_> = first.pairs.iter().map(|p| p.index).collect();
    assert_eq!(indices, vec![(0, 1), (0, 2), (1, 2)]);
    assert_eq!(first, second);
}

#[test]
fn test_empty_batch_has_no_pairs() {
    let outcome = run(&Vec::<MemoryFile>::new());
    assert!(outcome.files.is_empty());
    assert!(outcome.pairs.is_empty());
    assert!(!outcome.cancelled);
}

#[test]
fn test_single_file_batch_is_a_self_pair() {
    let outcome = run(&[MemoryFile::new(1, "lib.rs", "fn main() { let x = 1; }")]);
    assert_eq!(outcome.pairs.len(), 1);
    assert_eq!(outcome.pairs[0].index, (0, 0));
    assert!((outcome.pairs[0].score.similarity - 1.0).abs() < f64::EPSILON);
}

#[test]
fn test_cancelled_batch_returns_cleanly() {
    let token = CancellationToken::new();
    token.cancel();
    let files = vec![
        MemoryFile::new(1, "A.java", CALC),
        MemoryFile::new(2, "B.java", CALC_WITH_NEG),
        MemoryFile::new(3, "C.java", UNRELATED),
    ];
    let outcome = AstDiffDetector::default().run(&files, &token).unwrap();
    assert!(outcome.cancelled);
    assert!(outcome.pairs.is_empty());
}

#[test]
fn test_cancel_during_pairs_keeps_finished_pairs() {
    let token = CancellationToken::new();
    let handle = token.clone();
    let options = DetectorOptions {
        jobs: 1,
        ..DetectorOptions::default()
    };
    let detector = AstDiffDetector::new(options)
        .with_pair_hook(Arc::new(move |_: &PairRecord| handle.cancel()));
    let files = vec![
        MemoryFile::new(1, "A.java", CALC),
        MemoryFile::new(2, "B.java", CALC_WITH_NEG),
        MemoryFile::new(3, "C.java", UNRELATED),
        MemoryFile::new(4, "D.java", CALC),
    ];

    let outcome = detector.run(&files, &token).unwrap();
    assert!(outcome.cancelled);
    assert_eq!(outcome.files.len(), 4);
    assert_eq!(outcome.pairs.len(), 1);

    let kept = &outcome.pairs[0];
    assert!(kept.status.is_completed());
    assert!(kept.result.script.is_some());
    let uncancelled = run(&files);
    let same = uncancelled
        .pairs
        .iter()
        .find(|p| p.index == kept.index)
        .unwrap();
    assert_eq!(same, kept);
}

struct PanickingAdapter;

impl LanguageAdapter for PanickingAdapter {
    fn language(&self) -> Language {
        Language::Go
    }

    fn build(&self, _source: &[u8]) -> BuildOutcome {
        panic!("grammar exploded");
    }
}

#[test]
fn test_panicking_adapter_only_affects_its_file() {
    let mut registry = AdapterRegistry::default();
    registry.register(Language::Go, Arc::new(PanickingAdapter));
    let detector = AstDiffDetector::default().with_registry(registry);
    let files = vec![
        MemoryFile::new(1, "a.go", "package a\n"),
        MemoryFile::new(2, "b.rs", "fn add(a: i32, b: i32) -> i32 { a + b }\n"),
        MemoryFile::new(3, "c.rs", "fn sub(a: i32, b: i32) -> i32 { a - b }\n"),
    ];

    let outcome = detector.run(&files, &CancellationToken::new()).unwrap();
    assert!(!outcome.cancelled);
    assert_eq!(outcome.files[0].language, Language::Go);
    assert_eq!(outcome.files[0].quality, BuildQuality::Unsupported);
    assert_eq!(outcome.files[0].tree_size, 1);
    assert_eq!(outcome.pairs.len(), 3);

    for pair in &outcome.pairs {
        let expected = if pair.index.0 == 0 {
            PairStatus::Degraded
        } else {
            PairStatus::Success
        };
        assert_eq!(pair.status, expected);
    }
}

#[test]
fn test_unknown_extension_degrades() {
    let outcome = run(&[
        MemoryFile::new(1, "A.java", CALC),
        MemoryFile::new(2, "notes.txt", "just some text\n"),
    ]);
    assert_eq!(outcome.files[1].language, Language::Unknown);
    assert_eq!(outcome.files[1].quality, BuildQuality::Unsupported);

    let pair = &outcome.pairs[0];
    assert_eq!(pair.status, PairStatus::Degraded);
    assert!(pair.result.script.is_some());
    assert!(pair.score.similarity < 1.0);
    assert_eq!(outcome.degraded_count(), 1);
    assert_eq!(outcome.failed_count(), 0);
}

#[test]
fn test_syntax_error_degrades_but_completes() {
    let broken = "class Calc {\n    int add(int a, int b) {\n        return a + ;\n    }\n}\n";
    let outcome = run(&[
        MemoryFile::new(1, "A.java", CALC),
        MemoryFile::new(2, "B.java", broken),
    ]);
    assert_eq!(outcome.files[1].quality, BuildQuality::Recovered);
    assert_eq!(outcome.pairs[0].status, PairStatus::Degraded);
    assert!(outcome.pairs[0].status.is_completed());
}

#[test]
fn test_languages_can_be_mixed() {
    let outcome = run(&[
        MemoryFile::new(1, "a.go", "package a\n\nfunc Add(a, b int) int { return a + b }\n"),
        MemoryFile::new(2, "a.py", "def add(a, b):\n    return a + b\n"),
        MemoryFile::new(3, "a.rs", "fn add(a: i32, b: i32) -> i32 { a + b }\n"),
        MemoryFile::new(4, "a.kt", "fun add(a: Int, b: Int): Int = a + b\n"),
    ]);
    assert_eq!(outcome.pairs.len(), 6);
    for pair in &outcome.pairs {
        assert!((0.0..=1.0).contains(&pair.score.similarity));
        assert!(pair.status.is_completed());
    }
}
