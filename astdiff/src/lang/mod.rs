//! Language adapters: turning source bytes into a [`GenericTree`].
//!
//! Each supported language is backed by a tree-sitter grammar. The adapter
//! walks the concrete syntax tree and keeps only meaningful nodes (see
//! [`grammar`] for the canonicalisation rules), mapping
//! grammar kinds into the shared [`NodeType`] taxonomy.
//!
//! Files whose extension has no registered adapter are handled by the
//! [`UnknownAdapter`], which yields a one-node tree instead of failing.

pub mod grammar;
mod taxonomy;

pub use grammar::TreeSitterAdapter;

use crate::tree::{GenericTree, NodeType};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Source language of a file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Java
    Java,
    /// Kotlin (sources and scripts)
    Kotlin,
    /// Rust
    Rust,
    /// Go
    Go,
    /// C and C++
    Cpp,
    /// Python
    Python,
    /// Anything else
    Unknown,
}

impl Language {
    /// Every language with a grammar.
    pub const SUPPORTED: [Self; 6] = [
        Self::Java,
        Self::Kotlin,
        Self::Rust,
        Self::Go,
        Self::Cpp,
        Self::Python,
    ];

    /// Language for a file extension (without the dot, any case).
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "java" => Self::Java,
            "kt" | "kts" => Self::Kotlin,
            "rs" => Self::Rust,
            "go" => Self::Go,
            "c" | "h" | "cc" | "cpp" | "cxx" | "hh" | "hpp" | "hxx" => Self::Cpp,
            "py" => Self::Python,
            _ => Self::Unknown,
        }
    }

    /// Language for a display name, using the text after the last `.`.
    #[must_use]
    pub fn from_display_name(name: &str) -> Self {
        match name.rsplit_once('.') {
            Some((stem, ext))
                if !stem.is_empty() && !stem.ends_with(|c: char| c == '/' || c == '\\') =>
            {
                Self::from_extension(ext)
            }
            _ => Self::Unknown,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Java => "java",
            Self::Kotlin => "kotlin",
            Self::Rust => "rust",
            Self::Go => "go",
            Self::Cpp => "cpp",
            Self::Python => "python",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How faithfully a tree represents its source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildQuality {
    /// The grammar parsed the file without errors
    Clean,
    /// The grammar recovered from syntax errors; the tree is partial
    Recovered,
    /// No grammar was available; the tree is a single placeholder node
    Unsupported,
}

/// Result of building one file's tree.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    /// The canonical tree
    pub tree: GenericTree,
    /// Language the file was parsed as
    pub language: Language,
    /// Fidelity of the tree
    pub quality: BuildQuality,
}

impl BuildOutcome {
    /// One-node placeholder for files that cannot be parsed.
    #[must_use]
    pub fn unsupported(language: Language) -> Self {
        Self {
            tree: GenericTree::new(NodeType::Unknown, "", None),
            language,
            quality: BuildQuality::Unsupported,
        }
    }
}

/// Errors raised by a grammar front-end.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    /// The grammar could not be loaded into the parser.
    #[error("Failed to load {language} grammar: {message}")]
    Grammar {
        /// Language whose grammar failed
        language: Language,
        /// Parser error text
        message: String,
    },
    /// The parser gave up without producing a tree.
    #[error("Parser produced no tree for {0} source")]
    NoTree(Language),
}

/// Converts source bytes of one language into a [`GenericTree`].
///
/// Adapters are shared across worker threads and must not keep per-build
/// mutable state.
pub trait LanguageAdapter: Send + Sync {
    /// Language handled by this adapter.
    fn language(&self) -> Language;

    /// Build the canonical tree for `source`.
    ///
    /// Must not fail: syntax errors give a partial tree marked
    /// [`BuildQuality::Recovered`], and an unusable grammar gives a
    /// placeholder tree marked [`BuildQuality::Unsupported`].
    fn build(&self, source: &[u8]) -> BuildOutcome;
}

/// Adapter for files no grammar understands.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownAdapter;

impl LanguageAdapter for UnknownAdapter {
    fn language(&self) -> Language {
        Language::Unknown
    }

    fn build(&self, source: &[u8]) -> BuildOutcome {
        tracing::warn!(
            bytes = source.len(),
            "no grammar for this file type, comparing it as an empty tree"
        );
        BuildOutcome::unsupported(Language::Unknown)
    }
}

/// Maps languages to adapters.
///
/// [`AdapterRegistry::default`] registers every built-in grammar; further
/// adapters can be plugged in with [`register`](Self::register).
#[derive(Clone)]
pub struct AdapterRegistry {
    adapters: FxHashMap<Language, Arc<dyn LanguageAdapter>>,
    fallback: Arc<dyn LanguageAdapter>,
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        for language in Language::SUPPORTED {
            if let Some(adapter) = TreeSitterAdapter::for_language(language) {
                registry.register(language, Arc::new(adapter));
            }
        }
        registry
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut languages: Vec<_> = self.adapters.keys().copied().collect();
        languages.sort();
        f.debug_struct("AdapterRegistry")
            .field("languages", &languages)
            .finish_non_exhaustive()
    }
}

impl AdapterRegistry {
    /// Registry with no grammars; every file goes to the fallback adapter.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            adapters: FxHashMap::default(),
            fallback: Arc::new(UnknownAdapter),
        }
    }

    /// Register (or replace) the adapter for `language`.
    ///
    /// Returns the adapter previously registered for that language.
    pub fn register(
        &mut self,
        language: Language,
        adapter: Arc<dyn LanguageAdapter>,
    ) -> Option<Arc<dyn LanguageAdapter>> {
        self.adapters.insert(language, adapter)
    }

    /// Whether a dedicated adapter exists for `language`.
    #[must_use]
    pub fn supports(&self, language: Language) -> bool {
        self.adapters.contains_key(&language)
    }

    /// Adapter for `language`, falling back to [`UnknownAdapter`].
    #[must_use]
    pub fn adapter_for(&self, language: Language) -> &dyn LanguageAdapter {
        self.adapters
            .get(&language)
            .map_or(self.fallback.as_ref(), |adapter| adapter.as_ref())
    }

    /// Detect the language of `display_name` and build its tree.
    #[must_use]
    pub fn build(&self, display_name: &str, source: &[u8]) -> BuildOutcome {
        let language = Language::from_display_name(display_name);
        let _span = tracing::debug_span!("build", file = %display_name, %language).entered();
        let mut outcome = self.adapter_for(language).build(source);
        outcome.language = language;
        tracing::debug!(
            nodes = outcome.tree.size(),
            quality = ?outcome.quality,
            "built tree"
        );
        outcome
    }
}
