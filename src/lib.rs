//! # repo2txt
//!
//! Converts a source repository into a single token-efficient text file for
//! LLM context windows.
//!
//! ## Features
//!
//! - Deterministic traversal with directory pruning and optional `.gitignore` support
//! - Glob ignore rules, extension lists, size limits and a binary-content heuristic
//! - Per-language whitespace and structure reduction in three levels
//! - Simple, Markdown, JSON Lines and compact output, optionally chunked by size
//! - Atomic file writes
//!
//! ## Quick Start
//!
//! ```no_run
//! use repo2txt::{Config, OutputFormat, Pipeline};
//!
//! # fn main() -> anyhow::Result<()> {
//! let config = Config::builder()
//!     .root_dir("./my-project")
//!     .output("context.md")
//!     .format(OutputFormat::Markdown)
//!     .chunk_size(500_000)
//!     .build()?;
//!
//! Pipeline::new(config)?.run()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library follows a pipeline architecture:
//! 1. **Walker**: yields files in file-name order, pruning excluded directories
//! 2. **Filter**: decides per file from path, size and content
//! 3. **Optimizer**: applies the language transform for the configured level
//! 4. **Serializer**: renders entries and packs them into chunks
//! 5. **Writer**: persists the chunks

#![warn(
    missing_docs,
    rust_2018_idioms,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery
)]
#![allow(clippy::module_name_repetitions)]

mod acquire;
mod config;
mod error;
mod file;
mod filter;
mod language;
mod optimize;
mod pattern;
mod pipeline;
mod serializer;
mod splitter;
mod walker;
mod writer;

pub use acquire::{ClonedRepository, RepositoryInfo, clone_repository};
pub use config::{Config, ConfigBuilder, OutputFormat};
pub use error::{Error, Result};
pub use file::{ContentKind, SNIFF_LEN, SourceFile, classify_content};
pub use filter::{
    DEFAULT_EXCLUDE_DIRS, DEFAULT_EXCLUDE_EXTENSIONS, DEFAULT_EXCLUDE_FILES, DEFAULT_MAX_FILE_SIZE,
    ExclusionReason, FileFilter, FilterConfig, FilterDecision, normalize_extension,
};
pub use language::Language;
pub use optimize::{
    FallbackReason, LanguageOptimizer, OptimizationConfig, OptimizationLevel, Optimized,
    Optimizer, Outcome, WhitespaceOptimizer, optimize,
};
pub use pattern::{
    DEFAULT_IGNORE_RULES, PatternMatcher, load_ignore_file, matches, write_example_ignore_file,
};
pub use pipeline::{Pipeline, PipelineStats};
pub use serializer::{Preamble, Serializer, serialize};
pub use splitter::{OutputChunk, Splitter};
pub use walker::{RepositoryWalker, Walk, WalkStats};
pub use writer::Writer;

/// Runs the complete conversion pipeline with the given configuration.
///
/// This is the main entry point for the library.
///
/// # Errors
///
/// Returns an error if:
/// - Configuration is invalid
/// - A built-in template fails to parse
/// - The output cannot be written
///
/// # Examples
///
/// ```no_run
/// use repo2txt::{Config, run};
///
/// # fn main() -> anyhow::Result<()> {
/// let config = Config::builder()
///     .root_dir(".")
///     .output("../context.txt")
///     .build()?;
///
/// run(config)?;
/// # Ok(())
/// # }
/// ```
pub fn run(config: Config) -> Result<PipelineStats> {
    Pipeline::new(config)?.run()
}
