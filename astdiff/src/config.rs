use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::CONFIG_FILENAME;
use crate::diff::{ActionKind, MatcherConfig};
use crate::scoring::ComparisonParams;

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML for this schema.
    #[error("Failed to parse {path}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying TOML error
        #[source]
        source: toml::de::Error,
    },
    /// An action weight is negative or not a number.
    #[error("Invalid weight for {kind}: {weight} (must be a finite, non-negative number)")]
    InvalidWeight {
        /// Action kind the weight belongs to
        kind: ActionKind,
        /// Rejected value
        weight: f64,
    },
    /// The per-node ceiling is negative or not a number.
    #[error("Invalid per-node ceiling: {0} (must be a finite, non-negative number)")]
    InvalidCeiling(f64),
}

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration struct.
pub struct Config {
    #[serde(default)]
    /// The main configuration section.
    pub astdiff: AstDiffConfig,
    /// The path to the configuration file this was loaded from.
    /// Set during `load_from_path`, `None` if using defaults or programmatic config.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
/// Configuration options of the `[astdiff]` table.
pub struct AstDiffConfig {
    /// Worker threads (0 or unset: one per logical core).
    pub jobs: Option<usize>,
    /// Points granted per node of the reference tree.
    pub per_node_ceiling: Option<f64>,
    /// Folder names skipped while collecting files.
    pub exclude_folders: Option<Vec<String>>,
    /// Action weights (`[astdiff.weights]`).
    #[serde(default)]
    pub weights: ComparisonParams,
    /// Matcher tuning (`[astdiff.matcher]`).
    #[serde(default)]
    pub matcher: MatcherConfig,
}

impl AstDiffConfig {
    /// Check weights and ceiling.
    ///
    /// # Errors
    ///
    /// Returns the first invalid value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if let Some(ceiling) = self.per_node_ceiling {
            if !ceiling.is_finite() || ceiling < 0.0 {
                return Err(ConfigError::InvalidCeiling(ceiling));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Loads configuration from default locations (.astdiff.toml in current directory).
    #[must_use]
    pub fn load() -> Self {
        Self::load_from_path(Path::new("."))
    }

    /// Loads configuration starting from a specific path and traversing up.
    ///
    /// A file that cannot be read or parsed is reported with a warning and
    /// the defaults are used instead.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        let mut current = path.to_path_buf();
        if current.is_file() {
            current.pop();
        }

        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return match Self::load_file(&candidate) {
                    Ok(config) => config,
                    Err(err) => {
                        tracing::warn!(error = %err, "ignoring configuration file");
                        Self::default()
                    }
                };
            }

            if !current.pop() {
                break;
            }
        }

        Self::default()
    }

    /// Parse one configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] or [`ConfigError::Parse`].
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = toml::from_str::<Config>(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.config_file_path = Some(path.to_path_buf());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_path_no_config() {
        let dir = TempDir::new().unwrap();
        let config = Config::load_from_path(dir.path());
        assert!(config.astdiff.jobs.is_none());
        assert!(config.config_file_path.is_none());
        assert_eq!(config.astdiff.weights, ComparisonParams::default());
    }

    #[test]
    fn test_load_from_path_reads_tables() {
        let dir = TempDir::new().unwrap();
        let mut file = std::fs::File::create(dir.path().join(CONFIG_FILENAME)).unwrap();
        writeln!(
            file,
            r"[astdiff]
jobs = 3
per_node_ceiling = 20.0

[astdiff.weights]
tree_insert = 8.0

[astdiff.matcher]
min_dice = 0.6
"
        )
        .unwrap();

        let config = Config::load_from_path(dir.path());
        assert_eq!(config.astdiff.jobs, Some(3));
        assert_eq!(config.astdiff.per_node_ceiling, Some(20.0));
        assert!((config.astdiff.weights.tree_insert - 8.0).abs() < f64::EPSILON);
        assert!((config.astdiff.weights.tree_delete - 5.0).abs() < f64::EPSILON);
        assert!((config.astdiff.matcher.min_dice - 0.6).abs() < f64::EPSILON);
        assert_eq!(config.astdiff.matcher.min_height, 2);
        assert!(config.config_file_path.is_some());
    }

    #[test]
    fn test_load_from_path_traverses_up() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("src").join("main");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "[astdiff]\njobs = 2\n").unwrap();

        let config = Config::load_from_path(&nested);
        assert_eq!(config.astdiff.jobs, Some(2));
    }

    #[test]
    fn test_load_from_file_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "[astdiff]\njobs = 5\n").unwrap();
        let source = dir.path().join("Main.java");
        std::fs::write(&source, "class Main {}").unwrap();

        let config = Config::load_from_path(&source);
        assert_eq!(config.astdiff.jobs, Some(5));
    }

    #[test]
    fn test_invalid_file_falls_back_to_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[astdiff]\njobs = \"many\"\n").unwrap();

        assert!(matches!(Config::load_file(&path), Err(ConfigError::Parse { .. })));
        let config = Config::load_from_path(dir.path());
        assert!(config.astdiff.jobs.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AstDiffConfig::default();
        assert!(config.validate().is_ok());
        config.per_node_ceiling = Some(-1.0);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidCeiling(_))));
        config.per_node_ceiling = None;
        config.weights.single_update = f64::INFINITY;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWeight { .. })));
    }
}
