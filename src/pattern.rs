//! Glob-style ignore rules.
//!
//! Rules support `**` (zero or more whole path segments), `*` (any run of
//! characters inside one segment) and `?` (one character inside a segment).
//! Everything else matches literally and matching is anchored to the whole
//! relative path. Rules only ever add exclusions; there is no negation.

use crate::error::{Error, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Rules that apply unless explicitly disabled.
pub const DEFAULT_IGNORE_RULES: &[&str] = &[
    "**/*.min.js",
    "**/*.min.css",
    "**/*.map",
    "**/Cargo.lock",
];

const EXAMPLE_IGNORE_FILE: &str = "\
# Example ignore file for repo2txt
# One glob pattern per line; blank lines and lines starting with '#' are skipped.
#   *  matches any characters inside a single path segment
#   ** matches any number of directories (including none)
#   ?  matches a single character

# Scratch and tooling directories
**/temp/**
**/logs/**
**/backup/**
**/cache/**
**/.vscode/**
**/.idea/**

# Test data that rarely helps a model
**/test/fixtures/**
**/test/data/**
**/docs/examples/**

# Individual files
**/settings.dev.json
**/*-backup.*
**/*.log
";

/// Compiled set of ignore rules.
///
/// Rules are deduplicated and kept sorted, so the order in which they were
/// supplied never matters.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    rules: Vec<String>,
    set: GlobSet,
    // `prefix/**` rules with the suffix removed
    directories: GlobSet,
}

impl PatternMatcher {
    /// Compiles the given rules.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPattern`] for a rule that cannot be compiled.
    pub fn new<I, S>(rules: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rules: BTreeSet<String> = rules
            .into_iter()
            .map(|rule| rule.as_ref().trim().to_string())
            .filter(|rule| !rule.is_empty())
            .collect();

        let mut builder = GlobSetBuilder::new();
        let mut directories = GlobSetBuilder::new();
        for rule in &rules {
            builder.add(compile(rule)?);
            if let Some(prefix) = rule.strip_suffix("/**").filter(|p| !p.is_empty()) {
                directories.add(compile(prefix)?);
            }
        }

        Ok(Self {
            rules: rules.into_iter().collect(),
            set: build_set(&builder)?,
            directories: build_set(&directories)?,
        })
    }

    /// Creates a matcher with no rules; it never matches.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            set: GlobSet::empty(),
            directories: GlobSet::empty(),
        }
    }

    /// Returns true if any rule matches the `/`-separated relative path.
    #[must_use]
    pub fn is_match(&self, relative_path: &str) -> bool {
        !self.rules.is_empty() && self.set.is_match(relative_path)
    }

    /// Returns true if some rule matches every path below `relative_dir`,
    /// so the directory need not be walked at all.
    #[must_use]
    pub fn covers_directory(&self, relative_dir: &str) -> bool {
        !self.rules.is_empty() && self.directories.is_match(relative_dir)
    }

    /// Returns the first rule (in sorted order) matching the path.
    #[must_use]
    pub fn matching_rule(&self, relative_path: &str) -> Option<&str> {
        self.set
            .matches(relative_path)
            .into_iter()
            .min()
            .map(|index| self.rules[index].as_str())
    }

    /// Returns the compiled rules.
    #[must_use]
    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Returns the number of compiled rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for PatternMatcher {
    fn default() -> Self {
        Self::empty()
    }
}

/// Matches a single pattern against a relative path.
///
/// # Errors
///
/// Returns [`Error::InvalidPattern`] if the pattern cannot be compiled.
pub fn matches(pattern: &str, relative_path: &str) -> Result<bool> {
    Ok(compile(pattern)?.compile_matcher().is_match(relative_path))
}

/// Reads ignore rules from a file: one rule per line, `#` starts a comment
/// line, blank lines are skipped.
///
/// # Errors
///
/// Returns an IO error if the file cannot be read.
pub fn load_ignore_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(parse_ignore_lines(&content))
}

fn parse_ignore_lines(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(ToString::to_string)
        .collect()
}

/// Writes a commented example ignore file.
///
/// # Errors
///
/// Returns an IO error if the file cannot be written.
pub fn write_example_ignore_file(path: &Path) -> Result<()> {
    fs::write(path, EXAMPLE_IGNORE_FILE).map_err(|e| Error::io(path, e))
}

fn build_set(builder: &GlobSetBuilder) -> Result<GlobSet> {
    builder
        .build()
        .map_err(|e| Error::config(format!("Failed to build glob set: {e}")))
}

fn compile(pattern: &str) -> Result<globset::Glob> {
    GlobBuilder::new(&escape_literals(pattern))
        .literal_separator(true)
        .backslash_escape(false)
        .build()
        .map_err(|e| Error::invalid_pattern(pattern, e.kind().to_string()))
}

/// Wraps characters globset would treat as syntax in single-character
/// classes so they match themselves.
fn escape_literals(pattern: &str) -> String {
    let mut escaped = String::with_capacity(pattern.len());
    for ch in pattern.chars() {
        match ch {
            '[' | ']' | '{' | '}' => {
                escaped.push('[');
                escaped.push(ch);
                escaped.push(']');
            }
            _ => escaped.push(ch),
        }
    }
    escaped
}
