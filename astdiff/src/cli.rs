use clap::{Args, Parser};
use std::path::PathBuf;

/// Help text for configuration file options, shown at the bottom of --help.
const CONFIG_HELP: &str = "\
CONFIGURATION FILE (.astdiff.toml):
  Create this file in your project root to set defaults.

  [astdiff]
  jobs = 4                   # Worker threads (0: one per core)
  per_node_ceiling = 10.0    # Points per node of the larger tree
  exclude_folders = [\"build\", \"target\"]

  [astdiff.weights]
  single_insert = 1.0
  single_delete = 1.0
  single_update = 1.0
  tree_move = 1.0
  tree_insert = 5.0
  tree_delete = 5.0

  [astdiff.matcher]
  min_height = 2             # Smallest subtree height matched top-down
  min_dice = 0.5             # Container match threshold
  max_recovery_size = 1000   # Skip recovery for larger subtrees

LOGGING:
  Set ASTDIFF_LOG to a tracing filter (e.g. ASTDIFF_LOG=astdiff=debug).
";

/// Options for output formatting and verbosity.
#[derive(Args, Debug, Default, Clone)]
pub struct OutputOptions {
    /// Output raw JSON.
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output (settings and per-pair debug logs on stderr).
    #[arg(short, long)]
    pub verbose: bool,

    /// List the edit actions of every pair below the summary table.
    #[arg(long)]
    pub details: bool,
}

/// Per-action weight overrides.
#[derive(Args, Debug, Default, Clone)]
pub struct WeightArgs {
    /// Weight of single-node inserts.
    #[arg(long, value_name = "W")]
    pub weight_single_insert: Option<f64>,

    /// Weight of single-node deletes.
    #[arg(long, value_name = "W")]
    pub weight_single_delete: Option<f64>,

    /// Weight of label updates.
    #[arg(long, value_name = "W")]
    pub weight_single_update: Option<f64>,

    /// Weight of subtree moves.
    #[arg(long, value_name = "W")]
    pub weight_tree_move: Option<f64>,

    /// Weight of whole-subtree inserts.
    #[arg(long, value_name = "W")]
    pub weight_tree_insert: Option<f64>,

    /// Weight of whole-subtree deletes.
    #[arg(long, value_name = "W")]
    pub weight_tree_delete: Option<f64>,
}

/// Command line interface configuration using `clap`.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "astdiff - structural similarity between source files",
    long_about = None,
    after_help = CONFIG_HELP
)]
pub struct Cli {
    /// Files or directories to compare.
    /// Directories are searched for files of supported languages;
    /// files named explicitly are always compared.
    /// When no paths are provided, defaults to the current directory.
    pub paths: Vec<PathBuf>,

    /// Output formatting options.
    #[command(flatten)]
    pub output: OutputOptions,

    /// Number of worker threads (0: one per logical core).
    #[arg(short, long)]
    pub jobs: Option<usize>,

    /// Points granted per node of the larger tree of a pair.
    #[arg(long, value_name = "C")]
    pub per_node_ceiling: Option<f64>,

    /// Action weight overrides.
    #[command(flatten)]
    pub weights: WeightArgs,

    /// Folders to exclude while searching directories.
    #[arg(long, alias = "exclude-folder")]
    pub exclude_folders: Vec<String>,
}
