use rustc_hash::FxHashSet;
use std::sync::OnceLock;

/// Name of the per-project configuration file.
pub const CONFIG_FILENAME: &str = ".astdiff.toml";

/// Environment variable holding the log filter directive.
pub const LOG_ENV_VAR: &str = "ASTDIFF_LOG";

/// Log filter used when [`LOG_ENV_VAR`] is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Reason attached to every match group.
pub const MATCH_GROUP_REASON: &str = "AST Diff Match Group";

/// Prefix of worker thread names in the comparison pool.
pub const WORKER_THREAD_PREFIX: &str = "astdiff-worker";

/// Set of folders to exclude by default.
pub fn get_default_exclude_folders() -> &'static FxHashSet<&'static str> {
    static SET: OnceLock<FxHashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| {
        let mut s = FxHashSet::default();
        s.insert(".git");
        s.insert(".hg");
        s.insert(".svn");
        s.insert(".idea");
        s.insert(".gradle");
        s.insert("target");
        s.insert("build");
        s.insert("out");
        s.insert("dist");
        s.insert("node_modules");
        s.insert("vendor");
        s.insert("__pycache__");
        s.insert("venv");
        s.insert(".venv");
        s
    })
}

pub use get_default_exclude_folders as DEFAULT_EXCLUDE_FOLDERS;
