use crate::error::{Error, Result};
use crate::filter::FilterConfig;
use crate::optimize::{OptimizationConfig, OptimizationLevel};
use crate::pattern::{DEFAULT_IGNORE_RULES, PatternMatcher, load_ignore_file};
use std::path::PathBuf;
use tracing::debug;

const DEFAULT_OUTPUT_STEM: &str = "repo2txt";

/// Output format of the generated file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `File: <path>` header followed by the content
    Simple,
    /// Markdown heading and fenced code block per file
    Markdown,
    /// One JSON object per line
    Jsonl,
    /// `=== <path> (<language>) ===` header followed by the content
    #[default]
    Compact,
}

impl OutputFormat {
    /// Returns the file extension for this format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Simple | Self::Compact => "txt",
            Self::Markdown => "md",
            Self::Jsonl => "jsonl",
        }
    }

    /// Returns the template name for this format.
    #[must_use]
    pub const fn template_name(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Markdown => "markdown",
            Self::Jsonl => "jsonl",
            Self::Compact => "compact",
        }
    }
}

/// Configuration for a conversion run.
///
/// Use [`Config::builder()`] to construct a new configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Config {
    /// Root directory to convert
    pub root_dir: PathBuf,

    /// Output file path; numbered siblings are written when chunked
    pub output: PathBuf,

    /// Output format
    pub format: OutputFormat,

    /// Maximum chunk size in bytes; `None` writes a single file
    pub chunk_size: Option<usize>,

    /// Resolved file filter settings, ignore rules included
    pub filter: FilterConfig,

    /// Optimization level and preservation flags
    pub optimization: OptimizationConfig,

    /// Prepend origin URL, branch and last commit
    pub include_repo_info: bool,

    /// Prepend a generation timestamp
    pub timestamp: bool,

    /// Honor `.gitignore` files in the tree
    pub respect_gitignore: bool,

    /// Log every exclusion at info level
    pub verbose_ignore: bool,

    /// Dry run mode (no file writes)
    pub dry_run: bool,
}

impl Config {
    /// Creates a new configuration builder.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use repo2txt::{Config, OutputFormat};
    ///
    /// let config = Config::builder()
    ///     .root_dir("./my-project")
    ///     .output("context.md")
    ///     .format(OutputFormat::Markdown)
    ///     .chunk_size(200_000)
    ///     .build()
    ///     .expect("valid configuration");
    /// ```
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Root directory doesn't exist or is not a directory
    /// - Output path is empty or names an existing directory
    pub fn validate(&self) -> Result<()> {
        if !self.root_dir.exists() {
            return Err(Error::config(format!(
                "Root directory does not exist: {}",
                self.root_dir.display()
            )));
        }

        if !self.root_dir.is_dir() {
            return Err(Error::config(format!(
                "Root path is not a directory: {}",
                self.root_dir.display()
            )));
        }

        if self.output.as_os_str().is_empty() {
            return Err(Error::config("Output path must not be empty"));
        }

        if self.output.is_dir() {
            return Err(Error::config(format!(
                "Output path is a directory: {}",
                self.output.display()
            )));
        }

        Ok(())
    }
}

/// Builder for creating a [`Config`].
#[derive(Debug)]
pub struct ConfigBuilder {
    root_dir: Option<PathBuf>,
    output: Option<PathBuf>,
    format: OutputFormat,
    chunk_size: Option<usize>,
    filter: FilterConfig,
    ignore_patterns: Vec<String>,
    ignore_file: Option<PathBuf>,
    use_default_ignores: bool,
    optimization: OptimizationConfig,
    include_repo_info: bool,
    timestamp: bool,
    respect_gitignore: bool,
    verbose_ignore: bool,
    dry_run: bool,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self {
            root_dir: None,
            output: None,
            format: OutputFormat::default(),
            chunk_size: None,
            filter: FilterConfig::default(),
            ignore_patterns: Vec::new(),
            ignore_file: None,
            use_default_ignores: true,
            optimization: OptimizationConfig::default(),
            include_repo_info: false,
            timestamp: false,
            respect_gitignore: false,
            verbose_ignore: false,
            dry_run: false,
        }
    }
}

impl ConfigBuilder {
    /// Sets the root directory to convert.
    #[must_use]
    pub fn root_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.root_dir = Some(path.into());
        self
    }

    /// Sets the output file path.
    #[must_use]
    pub fn output(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Sets the output format.
    #[must_use]
    pub const fn format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the maximum chunk size in bytes. Zero disables chunking.
    #[must_use]
    pub const fn chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = if bytes == 0 { None } else { Some(bytes) };
        self
    }

    /// Replaces the excluded directory names.
    #[must_use]
    pub fn exclude_dirs<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter = self.filter.exclude_dirs(names);
        self
    }

    /// Replaces the excluded file names.
    #[must_use]
    pub fn exclude_files<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter = self.filter.exclude_files(names);
        self
    }

    /// Restricts the run to these extensions.
    #[must_use]
    pub fn include_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter = self.filter.include_extensions(extensions);
        self
    }

    /// Replaces the excluded extensions.
    #[must_use]
    pub fn exclude_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.filter = self.filter.exclude_extensions(extensions);
        self
    }

    /// Sets the maximum file size in bytes.
    #[must_use]
    pub fn max_file_size(mut self, bytes: u64) -> Self {
        self.filter = self.filter.max_file_size(bytes);
        self
    }

    /// Adds ignore patterns.
    #[must_use]
    pub fn ignore_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore_patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    /// Reads additional ignore patterns from a file at build time.
    #[must_use]
    pub fn ignore_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.ignore_file = Some(path.into());
        self
    }

    /// Enables or disables the built-in ignore rules.
    #[must_use]
    pub const fn use_default_ignores(mut self, enabled: bool) -> Self {
        self.use_default_ignores = enabled;
        self
    }

    /// Sets the whole optimization configuration.
    #[must_use]
    pub const fn optimization(mut self, config: OptimizationConfig) -> Self {
        self.optimization = config;
        self
    }

    /// Sets the optimization level.
    #[must_use]
    pub const fn level(mut self, level: OptimizationLevel) -> Self {
        self.optimization.level = level;
        self
    }

    /// Keeps single-line comments at level 2.
    #[must_use]
    pub const fn preserve_comments(mut self, enabled: bool) -> Self {
        self.optimization.preserve_comments = enabled;
        self
    }

    /// Keeps docstrings and doc comments at every level.
    #[must_use]
    pub const fn preserve_docstrings(mut self, enabled: bool) -> Self {
        self.optimization.preserve_docstrings = enabled;
        self
    }

    /// Prepends repository information read through `git`.
    #[must_use]
    pub const fn include_repo_info(mut self, enabled: bool) -> Self {
        self.include_repo_info = enabled;
        self
    }

    /// Prepends a generation timestamp.
    #[must_use]
    pub const fn timestamp(mut self, enabled: bool) -> Self {
        self.timestamp = enabled;
        self
    }

    /// Honors `.gitignore` files in the tree.
    #[must_use]
    pub const fn respect_gitignore(mut self, enabled: bool) -> Self {
        self.respect_gitignore = enabled;
        self
    }

    /// Logs every exclusion at info level.
    #[must_use]
    pub const fn verbose_ignore(mut self, enabled: bool) -> Self {
        self.verbose_ignore = enabled;
        self
    }

    /// Enables dry run mode (no file writes).
    #[must_use]
    pub const fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    /// Builds the configuration.
    ///
    /// Built-in rules, ignore-file rules and explicit patterns are merged
    /// into one compiled rule set here.
    ///
    /// # Errors
    ///
    /// Returns an error if the ignore file cannot be read, a pattern does
    /// not compile, or validation fails.
    pub fn build(self) -> Result<Config> {
        let mut rules = self.ignore_patterns;

        if self.use_default_ignores {
            rules.extend(DEFAULT_IGNORE_RULES.iter().map(ToString::to_string));
        }

        if let Some(path) = &self.ignore_file {
            let loaded = load_ignore_file(path).map_err(|e| {
                Error::config(format!("Cannot read ignore file {}: {e}", path.display()))
            })?;
            debug!("Loaded {} ignore patterns from {}", loaded.len(), path.display());
            rules.extend(loaded);
        }

        let patterns = PatternMatcher::new(&rules)?;
        debug!("Using {} ignore patterns", patterns.len());

        let output = self.output.unwrap_or_else(|| {
            PathBuf::from(format!("{DEFAULT_OUTPUT_STEM}.{}", self.format.extension()))
        });

        let config = Config {
            root_dir: self.root_dir.unwrap_or_else(|| PathBuf::from(".")),
            output,
            format: self.format,
            chunk_size: self.chunk_size,
            filter: self.filter.patterns(patterns),
            optimization: self.optimization,
            include_repo_info: self.include_repo_info,
            timestamp: self.timestamp,
            respect_gitignore: self.respect_gitignore,
            verbose_ignore: self.verbose_ignore,
            dry_run: self.dry_run,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    #[test]
    fn test_default_config() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder().root_dir(temp.path()).build().unwrap();

        assert_eq!(config.format, OutputFormat::Compact);
        assert_eq!(config.output, PathBuf::from("repo2txt.txt"));
        assert_eq!(config.chunk_size, None);
        assert_eq!(config.optimization.level, OptimizationLevel::Structure);
        assert!(!config.optimization.preserve_comments);
        assert!(config.optimization.preserve_docstrings);
        assert!(config.filter.ignore_rules().is_match("web/app.min.js"));
    }

    #[test]
    fn test_invalid_root_dir() {
        let result = Config::builder()
            .root_dir("/nonexistent/path/that/should/not/exist")
            .build();

        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = assert_fs::TempDir::new().unwrap();
        let file = temp.child("file.txt");
        file.write_str("x").unwrap();

        assert!(Config::builder().root_dir(file.path()).build().is_err());
    }

    #[test]
    fn test_empty_output_rejected() {
        let temp = assert_fs::TempDir::new().unwrap();
        let result = Config::builder().root_dir(temp.path()).output("").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_pattern_rejected() {
        let temp = assert_fs::TempDir::new().unwrap();
        let result = Config::builder()
            .root_dir(temp.path())
            .ignore_patterns(["a/**b"])
            .build();

        assert!(matches!(result, Err(Error::InvalidPattern { .. })));
    }

    #[test]
    fn test_ignore_sources_are_merged() {
        let temp = assert_fs::TempDir::new().unwrap();
        let ignore = temp.child(".repo2txtignore");
        ignore.write_str("# comment\n\n**/*.log\n").unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .ignore_file(ignore.path())
            .ignore_patterns(["docs/**"])
            .build()
            .unwrap();

        let rules = config.filter.ignore_rules();
        assert!(rules.is_match("var/debug.log"));
        assert!(rules.is_match("docs/index.md"));
        assert!(rules.is_match("Cargo.lock"));
        assert_eq!(rules.len(), DEFAULT_IGNORE_RULES.len() + 2);
    }

    #[test]
    fn test_default_ignores_can_be_disabled() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder()
            .root_dir(temp.path())
            .use_default_ignores(false)
            .build()
            .unwrap();

        assert!(config.filter.ignore_rules().is_empty());
    }

    #[test]
    fn test_missing_ignore_file_is_config_error() {
        let temp = assert_fs::TempDir::new().unwrap();
        let result = Config::builder()
            .root_dir(temp.path())
            .ignore_file(temp.path().join("missing"))
            .build();

        assert!(result.unwrap_err().is_config());
    }

    #[test]
    fn test_zero_chunk_size_disables_chunking() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = Config::builder()
            .root_dir(temp.path())
            .chunk_size(0)
            .build()
            .unwrap();
        assert_eq!(config.chunk_size, None);
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(OutputFormat::Markdown.extension(), "md");
        assert_eq!(OutputFormat::Jsonl.extension(), "jsonl");
        assert_eq!(OutputFormat::Compact.template_name(), "compact");
    }
}
