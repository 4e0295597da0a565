//! File inclusion rules.
//!
//! Decisions are made in a fixed order and the first matching rule wins.
//! Path-based rules run before the walker reads a file; the content rule runs
//! on the bytes afterwards.

use crate::file::{ContentKind, classify_content, is_likely_binary};
use crate::pattern::PatternMatcher;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

/// Default maximum file size in bytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_000_000;

/// Directories skipped by default.
pub const DEFAULT_EXCLUDE_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "__pycache__",
    "venv",
    ".env",
    ".venv",
    "dist",
    "build",
];

/// File names skipped by default.
pub const DEFAULT_EXCLUDE_FILES: &[&str] =
    &[".DS_Store", ".gitignore", "package-lock.json", "yarn.lock"];

/// Extensions skipped by default.
pub const DEFAULT_EXCLUDE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "ico", "svg", "woff", "woff2", "ttf", "eot", "pdf", "zip", "gz",
    "tar", "mp3", "mp4", "avi", "mov", "exe", "bin", "dat", "db", "sqlite", "pyc",
];

/// Configuration for file filtering.
#[derive(Debug, Clone)]
pub struct FilterConfig {
    exclude_dirs: BTreeSet<String>,
    exclude_files: BTreeSet<String>,
    include_extensions: BTreeSet<String>,
    exclude_extensions: BTreeSet<String>,
    max_file_size: u64,
    patterns: PatternMatcher,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: to_set(DEFAULT_EXCLUDE_DIRS),
            exclude_files: to_set(DEFAULT_EXCLUDE_FILES),
            include_extensions: BTreeSet::new(),
            exclude_extensions: DEFAULT_EXCLUDE_EXTENSIONS
                .iter()
                .map(|e| normalize_extension(e))
                .collect(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            patterns: PatternMatcher::empty(),
        }
    }
}

impl FilterConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration that excludes nothing.
    #[must_use]
    pub fn permissive() -> Self {
        Self {
            exclude_dirs: BTreeSet::new(),
            exclude_files: BTreeSet::new(),
            include_extensions: BTreeSet::new(),
            exclude_extensions: BTreeSet::new(),
            max_file_size: u64::MAX,
            patterns: PatternMatcher::empty(),
        }
    }

    /// Replaces the excluded directory names.
    #[must_use]
    pub fn exclude_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_dirs = names.into_iter().map(|n| n.as_ref().to_string()).collect();
        self
    }

    /// Replaces the excluded file names.
    #[must_use]
    pub fn exclude_files<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_files = names.into_iter().map(|n| n.as_ref().to_string()).collect();
        self
    }

    /// Sets the extension allowlist; an empty list allows every extension.
    #[must_use]
    pub fn include_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.include_extensions = normalize_extensions(extensions);
        self
    }

    /// Replaces the extension denylist.
    #[must_use]
    pub fn exclude_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.exclude_extensions = normalize_extensions(extensions);
        self
    }

    /// Sets the maximum file size in bytes.
    #[must_use]
    pub const fn max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    /// Sets the compiled ignore rules.
    #[must_use]
    pub fn patterns(mut self, patterns: PatternMatcher) -> Self {
        self.patterns = patterns;
        self
    }

    /// Returns the maximum file size in bytes.
    #[must_use]
    pub const fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size
    }

    /// Returns the compiled ignore rules.
    #[must_use]
    pub const fn ignore_rules(&self) -> &PatternMatcher {
        &self.patterns
    }
}

fn to_set(items: &[&str]) -> BTreeSet<String> {
    items.iter().map(ToString::to_string).collect()
}

fn normalize_extensions<I, S>(extensions: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .map(|e| normalize_extension(e.as_ref()))
        .filter(|e| !e.is_empty())
        .collect()
}

/// Lowercases an extension and strips a leading dot.
#[must_use]
pub fn normalize_extension(extension: &str) -> String {
    extension.trim().trim_start_matches('.').to_ascii_lowercase()
}

/// Why a file was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExclusionReason {
    /// A directory component is in the exclusion list
    ExcludedDirectory(String),
    /// The file name is in the exclusion list
    ExcludedFile,
    /// An ignore rule matched
    IgnorePattern(String),
    /// The allowlist is set and does not name the extension
    NotIncludedExtension,
    /// The extension is in the denylist
    ExcludedExtension,
    /// The file is larger than the limit
    TooLarge {
        /// File size in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },
    /// The content looks binary
    Binary,
    /// The content is not valid UTF-8
    NotText,
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExcludedDirectory(dir) => write!(f, "inside excluded directory '{dir}'"),
            Self::ExcludedFile => f.write_str("excluded file name"),
            Self::IgnorePattern(rule) => write!(f, "matches ignore pattern '{rule}'"),
            Self::NotIncludedExtension => f.write_str("extension not in include list"),
            Self::ExcludedExtension => f.write_str("excluded extension"),
            Self::TooLarge { size, limit } => write!(f, "too large ({size} > {limit} bytes)"),
            Self::Binary => f.write_str("binary content"),
            Self::NotText => f.write_str("not valid UTF-8"),
        }
    }
}

/// Outcome of filtering one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterDecision {
    /// Keep the file
    Include,
    /// Leave the file out
    Exclude(ExclusionReason),
}

impl FilterDecision {
    /// Returns true for [`FilterDecision::Include`].
    #[must_use]
    pub const fn is_included(&self) -> bool {
        matches!(self, Self::Include)
    }

    /// Returns the exclusion reason, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<&ExclusionReason> {
        match self {
            Self::Include => None,
            Self::Exclude(reason) => Some(reason),
        }
    }
}

/// Decides which files make it into the output.
#[derive(Debug, Clone)]
pub struct FileFilter {
    config: FilterConfig,
}

impl FileFilter {
    /// Creates a filter from a configuration.
    #[must_use]
    pub const fn new(config: FilterConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &FilterConfig {
        &self.config
    }

    /// Full decision for a file: path rules, then size, then content.
    #[must_use]
    pub fn should_include(&self, relative_path: &str, size: u64, content: &[u8]) -> FilterDecision {
        match self.check_metadata(relative_path, size) {
            FilterDecision::Include => self.check_content(content),
            excluded => excluded,
        }
    }

    /// Rules that need only the path and size.
    #[must_use]
    pub fn check_metadata(&self, relative_path: &str, size: u64) -> FilterDecision {
        let config = &self.config;
        let mut components: Vec<&str> = relative_path.split('/').collect();
        let file_name = components.pop().unwrap_or_default();

        if let Some(dir) = components.iter().find(|c| config.exclude_dirs.contains(**c)) {
            return FilterDecision::Exclude(ExclusionReason::ExcludedDirectory((*dir).to_string()));
        }

        if config.exclude_files.contains(file_name) {
            return FilterDecision::Exclude(ExclusionReason::ExcludedFile);
        }

        if let Some(rule) = config.patterns.matching_rule(relative_path) {
            return FilterDecision::Exclude(ExclusionReason::IgnorePattern(rule.to_string()));
        }

        let extension = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(normalize_extension)
            .unwrap_or_default();

        if !config.include_extensions.is_empty() && !config.include_extensions.contains(&extension) {
            return FilterDecision::Exclude(ExclusionReason::NotIncludedExtension);
        }

        if config.exclude_extensions.contains(&extension) {
            return FilterDecision::Exclude(ExclusionReason::ExcludedExtension);
        }

        if size > config.max_file_size {
            return FilterDecision::Exclude(ExclusionReason::TooLarge {
                size,
                limit: config.max_file_size,
            });
        }

        FilterDecision::Include
    }

    /// Content rule: binary heuristic, then UTF-8 validity.
    #[must_use]
    pub fn check_content(&self, content: &[u8]) -> FilterDecision {
        match classify_content(content) {
            ContentKind::Text => FilterDecision::Include,
            ContentKind::Binary => FilterDecision::Exclude(ExclusionReason::Binary),
            ContentKind::NotText => FilterDecision::Exclude(ExclusionReason::NotText),
        }
    }

    /// Applies the content rule to bytes read from disk and decodes them in
    /// the same pass.
    ///
    /// # Errors
    ///
    /// Returns the exclusion reason for binary or non-UTF-8 content.
    pub fn decode_content(&self, bytes: Vec<u8>) -> Result<String, ExclusionReason> {
        if is_likely_binary(&bytes) {
            return Err(ExclusionReason::Binary);
        }
        String::from_utf8(bytes).map_err(|_| ExclusionReason::NotText)
    }

    /// Returns false for directories that must not be entered.
    #[must_use]
    pub fn should_descend(&self, relative_dir: &str) -> bool {
        let name = relative_dir.rsplit('/').next().unwrap_or(relative_dir);
        !self.config.exclude_dirs.contains(name)
            && !self.config.patterns.is_match(relative_dir)
            && !self.config.patterns.covers_directory(relative_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filter(config: FilterConfig) -> FileFilter {
        FileFilter::new(config)
    }

    fn reason(decision: FilterDecision) -> Option<ExclusionReason> {
        decision.reason().cloned()
    }

    #[test]
    fn test_defaults_exclude_common_noise() {
        let f = filter(FilterConfig::default());
        assert_eq!(
            reason(f.check_metadata("node_modules/x/index.js", 10)),
            Some(ExclusionReason::ExcludedDirectory("node_modules".to_string()))
        );
        assert_eq!(
            reason(f.check_metadata("web/package-lock.json", 10)),
            Some(ExclusionReason::ExcludedFile)
        );
        assert_eq!(
            reason(f.check_metadata("img/logo.PNG", 10)),
            Some(ExclusionReason::ExcludedExtension)
        );
        assert!(f.check_metadata("src/main.rs", 10).is_included());
    }

    #[test]
    fn test_denylist_wins_over_allowlist() {
        let f = filter(
            FilterConfig::permissive()
                .include_extensions([".py", "rs"])
                .exclude_extensions(["PY"]),
        );
        assert_eq!(
            reason(f.check_metadata("a.py", 1)),
            Some(ExclusionReason::ExcludedExtension)
        );
        assert!(f.check_metadata("a.rs", 1).is_included());
        assert_eq!(
            reason(f.check_metadata("a.go", 1)),
            Some(ExclusionReason::NotIncludedExtension)
        );
        assert_eq!(
            reason(f.check_metadata("Makefile", 1)),
            Some(ExclusionReason::NotIncludedExtension)
        );
    }

    #[test]
    fn test_rule_order_is_fixed() {
        let patterns = PatternMatcher::new(["**/*.log"]).unwrap();
        let f = filter(
            FilterConfig::default()
                .patterns(patterns)
                .exclude_files(["skip.log"])
                .max_file_size(5),
        );

        // directory beats file name, file name beats pattern, pattern beats size
        assert!(matches!(
            reason(f.check_metadata("build/skip.log", 100)),
            Some(ExclusionReason::ExcludedDirectory(_))
        ));
        assert_eq!(reason(f.check_metadata("skip.log", 100)), Some(ExclusionReason::ExcludedFile));
        assert_eq!(
            reason(f.check_metadata("app.log", 100)),
            Some(ExclusionReason::IgnorePattern("**/*.log".to_string()))
        );
        assert_eq!(
            reason(f.check_metadata("app.txt", 100)),
            Some(ExclusionReason::TooLarge { size: 100, limit: 5 })
        );
    }

    #[test]
    fn test_null_byte_excludes_even_allowlisted_file() {
        let f = filter(FilterConfig::default().include_extensions(["py"]));
        let decision = f.should_include("main.py", 3, b"a\0b");
        assert_eq!(reason(decision), Some(ExclusionReason::Binary));
    }

    #[test]
    fn test_invalid_utf8_is_not_text() {
        let f = filter(FilterConfig::default());
        let decision = f.should_include("notes.txt", 3, &[b'a', 0xc3, b'(']);
        assert_eq!(reason(decision), Some(ExclusionReason::NotText));
        assert!(f.should_include("notes.txt", 2, b"ok").is_included());
    }

    #[test]
    fn test_decode_content_matches_content_rule() {
        let f = filter(FilterConfig::default());
        assert_eq!(f.decode_content(b"fn main() {}\n".to_vec()), Ok("fn main() {}\n".to_string()));
        assert_eq!(f.decode_content(b"a\0b".to_vec()), Err(ExclusionReason::Binary));
        assert_eq!(f.decode_content(vec![b'a', 0xc3, b'(']), Err(ExclusionReason::NotText));
    }

    #[test]
    fn test_should_descend() {
        let patterns = PatternMatcher::new(["**/cache/**", "docs/*.md"]).unwrap();
        let f = filter(FilterConfig::default().patterns(patterns));
        assert!(!f.should_descend(".git"));
        assert!(!f.should_descend("web/node_modules"));
        assert!(!f.should_descend("src/cache"));
        assert!(f.should_descend("docs"));
        assert!(f.should_descend("src"));
    }

    #[test]
    fn test_reason_labels() {
        assert_eq!(ExclusionReason::Binary.to_string(), "binary content");
        assert_eq!(
            ExclusionReason::TooLarge { size: 10, limit: 5 }.to_string(),
            "too large (10 > 5 bytes)"
        );
    }
}
