//! Language-aware content reduction.
//!
//! Every file goes through the same outer steps: line endings are normalized,
//! a language transform runs (levels 2 and 3 only), and the whitespace
//! finalizer collapses blank lines and strips trailing whitespace. Language
//! transforms are looked up once per file in a registry keyed by
//! [`Language`]; anything without an entry gets the whitespace-only
//! optimizer.
//!
//! A transform that cannot tokenize its input safely reports
//! [`Outcome::WhitespaceOnly`] and the file is processed at level 1.

mod json;
mod lexer;
mod markup;
mod profile;
mod source;
mod whitespace;

use crate::language::Language;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

pub(crate) use whitespace::{finalize, normalize_line_endings};

/// Optimization aggressiveness. Each level includes everything the previous
/// one does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OptimizationLevel {
    /// Line endings, trailing whitespace and blank-line runs only.
    Whitespace = 1,
    /// Adds re-indentation, punctuation spacing and single-line comment removal.
    Structure = 2,
    /// Adds removal of every comment form, JSON minification and markup
    /// inter-tag whitespace removal.
    Aggressive = 3,
}

impl OptimizationLevel {
    /// Parses a numeric level (1-3).
    #[must_use]
    pub const fn from_number(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Whitespace),
            2 => Some(Self::Structure),
            3 => Some(Self::Aggressive),
            _ => None,
        }
    }

    /// Returns the numeric level.
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }
}

impl Default for OptimizationLevel {
    fn default() -> Self {
        Self::Structure
    }
}

impl fmt::Display for OptimizationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Settings that decide which rules a language optimizer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OptimizationConfig {
    /// Aggressiveness tier
    pub level: OptimizationLevel,

    /// Keep single-line comments at level 2 (ignored at level 3)
    pub preserve_comments: bool,

    /// Keep documentation literals verbatim at every level
    pub preserve_docstrings: bool,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            level: OptimizationLevel::default(),
            preserve_comments: false,
            preserve_docstrings: true,
        }
    }
}

impl OptimizationConfig {
    /// Creates a configuration for the given level with default flags.
    #[must_use]
    pub fn with_level(level: OptimizationLevel) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }
}

/// Why a transform declined to go beyond whitespace normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    /// A string literal runs past its line or the end of the file.
    UnterminatedString,
    /// A block comment never closes.
    UnterminatedComment,
    /// A tag, CDATA section or raw element never closes.
    UnterminatedMarkup,
    /// JSON content does not parse.
    InvalidJson,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::UnterminatedString => "unterminated string literal",
            Self::UnterminatedComment => "unterminated block comment",
            Self::UnterminatedMarkup => "unterminated markup construct",
            Self::InvalidJson => "content is not valid JSON",
        };
        f.write_str(label)
    }
}

/// Result of a language transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Transformed content, still subject to whitespace finalization.
    Optimized(String),
    /// Input could not be processed safely; apply the level-1 transform only.
    WhitespaceOnly(FallbackReason),
}

/// A per-language transform.
pub trait LanguageOptimizer: Send + Sync {
    /// Transforms newline-normalized content at level 2 or 3.
    fn transform(&self, content: &str, config: &OptimizationConfig) -> Outcome;
}

/// Transform for languages whose comment syntax is unknown: it leaves
/// everything to the whitespace finalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceOptimizer;

impl LanguageOptimizer for WhitespaceOptimizer {
    fn transform(&self, content: &str, _config: &OptimizationConfig) -> Outcome {
        Outcome::Optimized(content.to_string())
    }
}

/// Optimized content plus the fallback that was taken, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Optimized {
    /// Resulting content
    pub content: String,

    /// Set when the language transform was skipped
    pub fallback: Option<FallbackReason>,
}

/// Registry of language optimizers bound to one configuration.
#[derive(Clone)]
pub struct Optimizer {
    config: OptimizationConfig,
    registry: HashMap<Language, Arc<dyn LanguageOptimizer>>,
    fallback: Arc<dyn LanguageOptimizer>,
}

impl fmt::Debug for Optimizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut languages: Vec<_> = self.registry.keys().map(|l| l.label()).collect();
        languages.sort_unstable();
        f.debug_struct("Optimizer")
            .field("config", &self.config)
            .field("languages", &languages)
            .finish()
    }
}

impl Optimizer {
    /// Builds the registry for the given configuration.
    #[must_use]
    pub fn new(config: OptimizationConfig) -> Self {
        let mut registry: HashMap<Language, Arc<dyn LanguageOptimizer>> = HashMap::new();

        for &language in Language::all() {
            if let Some(profile) = profile::source_profile(language) {
                registry.insert(language, Arc::new(source::SourceOptimizer::new(profile)));
            }
        }
        registry.insert(Language::Html, Arc::new(markup::MarkupOptimizer::html()));
        registry.insert(Language::Xml, Arc::new(markup::MarkupOptimizer::xml()));
        registry.insert(Language::Json, Arc::new(json::JsonOptimizer));

        Self {
            config,
            registry,
            fallback: Arc::new(WhitespaceOptimizer),
        }
    }

    /// Returns the active configuration.
    #[must_use]
    pub const fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// Resolves the transform for a language, falling back to whitespace-only.
    #[must_use]
    pub fn resolve(&self, language: Language) -> &dyn LanguageOptimizer {
        self.registry
            .get(&language)
            .map_or(self.fallback.as_ref(), |optimizer| optimizer.as_ref())
    }

    /// Optimizes `content` for `language`.
    #[must_use]
    pub fn optimize(&self, content: &str, language: Language) -> Optimized {
        let normalized = normalize_line_endings(content);

        if self.config.level == OptimizationLevel::Whitespace {
            return Optimized {
                content: finalize(&normalized),
                fallback: None,
            };
        }

        match self.resolve(language).transform(&normalized, &self.config) {
            Outcome::Optimized(transformed) => Optimized {
                content: finalize(&transformed),
                fallback: None,
            },
            Outcome::WhitespaceOnly(reason) => {
                debug!("Falling back to whitespace-only optimization ({language}): {reason}");
                Optimized {
                    content: finalize(&normalized),
                    fallback: Some(reason),
                }
            }
        }
    }
}

/// Optimizes content with a one-off registry.
#[must_use]
pub fn optimize(content: &str, language: Language, config: &OptimizationConfig) -> String {
    Optimizer::new(*config).optimize(content, language).content
}
