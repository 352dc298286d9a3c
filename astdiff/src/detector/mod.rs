//! Pairwise orchestration of tree building, diffing and scoring.
//!
//! A batch runs in two parallel phases on a dedicated rayon pool:
//!
//! 1. every file is parsed once into a shared, immutable tree;
//! 2. every pair of files is diffed and scored.
//!
//! Files are sorted by display name (then id) first, so pair order and
//! results are the same on every run. Each file and each pair is isolated: a
//! panicking adapter leaves a placeholder tree for its file, and a failure or
//! panic in one comparison is recorded on that pair. The batch goes on.

mod cancel;
mod source;
mod types;

pub use cancel::CancellationToken;
pub use source::{count_lines, FileId, MemoryFile, SourceFile};
pub use types::{BatchOutcome, FailureKind, FileRef, PairRecord, PairResult, PairStatus};

use crate::config::ConfigError;
use crate::constants::WORKER_THREAD_PREFIX;
use crate::diff::{diff, EditScript, MatcherConfig};
use crate::lang::{AdapterRegistry, BuildOutcome, BuildQuality, Language};
use crate::scoring::{ComparisonParams, Scorer, DEFAULT_PER_NODE_CEILING};
use crate::tree::GenericTree;
use indicatif::ProgressBar;
use rayon::prelude::*;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

/// Errors that prevent a batch from starting.
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// Weights or ceiling are invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The worker pool could not be created.
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Settings of one detector run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectorOptions {
    /// Action weights
    pub params: ComparisonParams,
    /// Matcher tuning
    pub matcher: MatcherConfig,
    /// Points granted per reference node
    pub per_node_ceiling: f64,
    /// Worker threads; 0 uses one per logical core
    pub jobs: usize,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            params: ComparisonParams::default(),
            matcher: MatcherConfig::default(),
            per_node_ceiling: DEFAULT_PER_NODE_CEILING,
            jobs: 0,
        }
    }
}

/// Index pairs to compare among `n` files.
///
/// No files give no pairs; a single file is paired with itself; otherwise
/// every `(i, j)` with `i < j`, in lexicographic order.
#[must_use]
pub fn pair_combinations(n: usize) -> Vec<(usize, usize)> {
    match n {
        0 => Vec::new(),
        1 => vec![(0, 0)],
        _ => (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect(),
    }
}

/// Called with every finished pair, on the worker thread that compared it.
pub type PairHook = Arc<dyn Fn(&PairRecord) + Send + Sync>;

/// A file whose tree has been built.
struct BuiltFile {
    file: FileRef,
    tree: Arc<GenericTree>,
}

/// Compares every pair of a set of files.
#[derive(Default)]
pub struct AstDiffDetector {
    options: DetectorOptions,
    registry: AdapterRegistry,
    progress_bar: Option<Arc<ProgressBar>>,
    pair_hook: Option<PairHook>,
}

impl fmt::Debug for AstDiffDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AstDiffDetector")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .field("progress_bar", &self.progress_bar.is_some())
            .field("pair_hook", &self.pair_hook.is_some())
            .finish()
    }
}

impl AstDiffDetector {
    /// Detector with the built-in language adapters.
    #[must_use]
    pub fn new(options: DetectorOptions) -> Self {
        Self {
            options,
            registry: AdapterRegistry::default(),
            progress_bar: None,
            pair_hook: None,
        }
    }

    /// Replace the adapter registry.
    #[must_use]
    pub fn with_registry(mut self, registry: AdapterRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Report progress (one tick per file and per pair) on `progress_bar`.
    #[must_use]
    pub fn with_progress_bar(mut self, progress_bar: Arc<ProgressBar>) -> Self {
        self.progress_bar = Some(progress_bar);
        self
    }

    /// Run `hook` on each pair as soon as it is scored.
    #[must_use]
    pub fn with_pair_hook(mut self, hook: PairHook) -> Self {
        self.pair_hook = Some(hook);
        self
    }

    /// Options of this detector.
    #[must_use]
    pub fn options(&self) -> &DetectorOptions {
        &self.options
    }

    /// Run a batch over `files`.
    ///
    /// Cancellation is checked before each file build and each pair. A
    /// cancelled batch returns the pairs finished so far with
    /// [`BatchOutcome::cancelled`] set.
    ///
    /// # Errors
    ///
    /// Returns [`DetectError`] if the options are invalid or the worker pool
    /// cannot be started. Per-file and per-pair problems never fail the batch.
    pub fn run<F: SourceFile>(
        &self,
        files: &[F],
        cancel: &CancellationToken,
    ) -> Result<BatchOutcome, DetectError> {
        self.options.params.validate()?;
        let ceiling = self.options.per_node_ceiling;
        if !ceiling.is_finite() || ceiling < 0.0 {
            return Err(ConfigError::InvalidCeiling(ceiling).into());
        }

        let mut order: Vec<usize> = (0..files.len()).collect();
        order.sort_by(|&a, &b| {
            files[a]
                .display_name()
                .cmp(files[b].display_name())
                .then_with(|| files[a].id().cmp(&files[b].id()))
        });
        let pairs = pair_combinations(files.len());

        if let Some(pb) = &self.progress_bar {
            pb.set_length((files.len() + pairs.len()) as u64);
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.options.jobs)
            .thread_name(|i| format!("{WORKER_THREAD_PREFIX}-{i}"))
            .build()?;

        let outcome = pool.install(|| self.run_phases(files, &order, &pairs, cancel));
        tracing::info!(
            files = outcome.files.len(),
            pairs = outcome.pairs.len(),
            failed = outcome.failed_count(),
            degraded = outcome.degraded_count(),
            cancelled = outcome.cancelled,
            "batch finished"
        );
        Ok(outcome)
    }

    fn run_phases<F: SourceFile>(
        &self,
        files: &[F],
        order: &[usize],
        pairs: &[(usize, usize)],
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        let built: Vec<Option<BuiltFile>> = order
            .par_iter()
            .map(|&i| {
                if cancel.is_cancelled() {
                    return None;
                }
                Some(self.build_file(&files[i]))
            })
            .collect();

        let Some(built) = built.into_iter().collect::<Option<Vec<BuiltFile>>>() else {
            return BatchOutcome {
                files: Vec::new(),
                pairs: Vec::new(),
                cancelled: true,
            };
        };

        let records: Vec<Option<PairRecord>> = pairs
            .par_iter()
            .map(|&(i, j)| {
                if cancel.is_cancelled() {
                    return None;
                }
                let record = self.compare(&built[i], &built[j], (i, j));
                if let Some(hook) = &self.pair_hook {
                    hook(&record);
                }
                Some(record)
            })
            .collect();

        let cancelled = cancel.is_cancelled() || records.iter().any(Option::is_none);
        BatchOutcome {
            files: built.into_iter().map(|b| b.file).collect(),
            pairs: records.into_iter().flatten().collect(),
            cancelled,
        }
    }

    fn build_file<F: SourceFile>(&self, source: &F) -> BuiltFile {
        let name = source.display_name();
        let contents = source.contents();
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.registry.build(name, &contents)))
            .unwrap_or_else(|payload| {
                let language = Language::from_display_name(name);
                tracing::error!(
                    file = %name,
                    %language,
                    panic = %panic_message(payload.as_ref()),
                    "tree building panicked, comparing the file as an empty tree"
                );
                BuildOutcome::unsupported(language)
            });
        let file = FileRef {
            id: source.id(),
            display_name: name.to_owned(),
            language: outcome.language,
            quality: outcome.quality,
            total_lines: source.total_line_count(),
            tree_size: outcome.tree.size(),
        };
        if let Some(pb) = &self.progress_bar {
            pb.inc(1);
        }
        BuiltFile {
            file,
            tree: Arc::new(outcome.tree),
        }
    }

    fn compare(&self, a: &BuiltFile, b: &BuiltFile, index: (usize, usize)) -> PairRecord {
        let degraded = a.file.quality != BuildQuality::Clean || b.file.quality != BuildQuality::Clean;
        let completed = if degraded {
            PairStatus::Degraded
        } else {
            PairStatus::Success
        };

        let (script, status) = if Arc::ptr_eq(&a.tree, &b.tree) {
            (Some(EditScript::empty()), completed)
        } else {
            let matcher = self.options.matcher;
            match panic::catch_unwind(AssertUnwindSafe(|| diff(&a.tree, &b.tree, &matcher))) {
                Ok(Ok(script)) => (Some(script), completed),
                Ok(Err(err)) => {
                    tracing::warn!(
                        first = %a.file.display_name,
                        second = %b.file.display_name,
                        error = %err,
                        "comparison failed"
                    );
                    (None, PairStatus::Failed(FailureKind::Invariant(err.to_string())))
                }
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    tracing::warn!(
                        first = %a.file.display_name,
                        second = %b.file.display_name,
                        panic = %message,
                        "comparison panicked"
                    );
                    (None, PairStatus::Failed(FailureKind::Panicked(message)))
                }
            }
        };

        let result = PairResult {
            first: a.file.clone(),
            second: b.file.clone(),
            script,
            params: self.options.params,
            reference_size: a.tree.size().max(b.tree.size()),
        };
        let score = Scorer::new(self.options.per_node_ceiling).score(&result);
        tracing::debug!(
            first = %a.file.display_name,
            second = %b.file.display_name,
            actions = result.script.as_ref().map_or(0, EditScript::len),
            similarity = score.similarity,
            "compared pair"
        );

        if let Some(pb) = &self.progress_bar {
            pb.inc(1);
        }
        PairRecord {
            index,
            result,
            status,
            score,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pair_combinations() {
        assert!(pair_combinations(0).is_empty());
        assert_eq!(pair_combinations(1), vec![(0, 0)]);
        assert_eq!(pair_combinations(2), vec![(0, 1)]);
        assert_eq!(
            pair_combinations(4),
            vec![(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]
        );
        assert_eq!(pair_combinations(10).len(), 45);
    }

    #[test]
    fn test_files_are_sorted_by_display_name() {
        let files = vec![
            MemoryFile::new(1, "b.py", "x = 1\n"),
            MemoryFile::new(2, "a.py", "x = 2\n"),
            MemoryFile::new(0, "a.py", "x = 1\n"),
        ];
        let outcome = AstDiffDetector::default()
            .run(&files, &CancellationToken::new())
            .unwrap();
        let ids: Vec<_> = outcome.files.iter().map(|f| f.id.0).collect();
        assert_eq!(ids, vec![0, 2, 1]);
        assert_eq!(outcome.pairs.len(), 3);
        assert_eq!(outcome.pairs[0].index, (0, 1));
        assert_eq!(outcome.pairs[0].result.first.id, FileId(0));
    }

    #[test]
    fn test_single_file_is_paired_with_itself() {
        let files = vec![MemoryFile::new(1, "Main.java", "class Main { void f() {} }")];
        let outcome = AstDiffDetector::default()
            .run(&files, &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.pairs.len(), 1);
        let pair = &outcome.pairs[0];
        assert_eq!(pair.index, (0, 0));
        assert_eq!(pair.result.script.as_ref().map(EditScript::len), Some(0));
        assert!((pair.score.similarity - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_pre_cancelled_batch_returns_nothing() {
        let files = vec![
            MemoryFile::new(1, "a.rs", "fn a() {}"),
            MemoryFile::new(2, "b.rs", "fn b() {}"),
        ];
        let token = CancellationToken::new();
        token.cancel();
        let outcome = AstDiffDetector::default().run(&files, &token).unwrap();
        assert!(outcome.cancelled);
        assert!(outcome.pairs.is_empty());
    }

    struct CountedFile {
        inner: MemoryFile,
        lines: usize,
    }

    impl SourceFile for CountedFile {
        fn id(&self) -> FileId {
            self.inner.id()
        }

        fn display_name(&self) -> &str {
            self.inner.display_name()
        }

        fn contents(&self) -> std::borrow::Cow<'_, [u8]> {
            self.inner.contents()
        }

        fn total_line_count(&self) -> usize {
            self.lines
        }
    }

    #[test]
    fn test_line_count_comes_from_the_source() {
        let files = vec![CountedFile {
            inner: MemoryFile::new(1, "a.rs", "fn a() {}\n"),
            lines: 42,
        }];
        let outcome = AstDiffDetector::default()
            .run(&files, &CancellationToken::new())
            .unwrap();
        assert_eq!(outcome.files[0].total_lines, 42);
    }

    #[test]
    fn test_invalid_options_fail_fast() {
        let mut options = DetectorOptions::default();
        options.params.tree_insert = -2.0;
        let files = vec![MemoryFile::new(1, "a.rs", "fn a() {}")];
        let err = AstDiffDetector::new(options)
            .run(&files, &CancellationToken::new())
            .unwrap_err();
        assert!(matches!(err, DetectError::Config(_)));
    }
}
