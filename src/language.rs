//! Language detection from file extensions.

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Languages the optimizer distinguishes.
///
/// Anything unrecognized is [`Language::Text`], which only ever receives
/// whitespace normalization because its comment syntax is unknown.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Html,
    Css,
    Scss,
    Sass,
    Java,
    C,
    Cpp,
    Go,
    Rust,
    Ruby,
    Php,
    Swift,
    Kotlin,
    Bash,
    Markdown,
    Json,
    Xml,
    Yaml,
    Toml,
    Sql,
    R,
    Dart,
    Text,
}

static EXTENSIONS: Lazy<HashMap<&'static str, Language>> = Lazy::new(|| {
    use Language::*;
    [
        ("py", Python),
        ("js", JavaScript),
        ("jsx", JavaScript),
        ("mjs", JavaScript),
        ("cjs", JavaScript),
        ("ts", TypeScript),
        ("tsx", TypeScript),
        ("html", Html),
        ("htm", Html),
        ("css", Css),
        ("scss", Scss),
        ("sass", Sass),
        ("java", Java),
        ("c", C),
        ("h", C),
        ("cpp", Cpp),
        ("cc", Cpp),
        ("cxx", Cpp),
        ("hpp", Cpp),
        ("hh", Cpp),
        ("go", Go),
        ("rs", Rust),
        ("rb", Ruby),
        ("php", Php),
        ("swift", Swift),
        ("kt", Kotlin),
        ("kts", Kotlin),
        ("sh", Bash),
        ("bash", Bash),
        ("zsh", Bash),
        ("md", Markdown),
        ("json", Json),
        ("xml", Xml),
        ("yml", Yaml),
        ("yaml", Yaml),
        ("toml", Toml),
        ("sql", Sql),
        ("r", R),
        ("dart", Dart),
    ]
    .into_iter()
    .collect()
});

impl Language {
    /// Detects the language from a path's extension (case-insensitive).
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map_or(Self::Text, Self::from_extension)
    }

    /// Detects the language from a bare extension, with or without the dot.
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.trim_start_matches('.').to_ascii_lowercase();
        EXTENSIONS.get(ext.as_str()).copied().unwrap_or(Self::Text)
    }

    /// Returns the label used in output headers and code fences.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Html => "html",
            Self::Css => "css",
            Self::Scss => "scss",
            Self::Sass => "sass",
            Self::Java => "java",
            Self::C => "c",
            Self::Cpp => "cpp",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Ruby => "ruby",
            Self::Php => "php",
            Self::Swift => "swift",
            Self::Kotlin => "kotlin",
            Self::Bash => "bash",
            Self::Markdown => "markdown",
            Self::Json => "json",
            Self::Xml => "xml",
            Self::Yaml => "yaml",
            Self::Toml => "toml",
            Self::Sql => "sql",
            Self::R => "r",
            Self::Dart => "dart",
            Self::Text => "text",
        }
    }

    /// Every language, in declaration order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        use Language::*;
        &[
            Python, JavaScript, TypeScript, Html, Css, Scss, Sass, Java, C, Cpp, Go, Rust, Ruby,
            Php, Swift, Kotlin, Bash, Markdown, Json, Xml, Yaml, Toml, Sql, R, Dart, Text,
        ]
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_common_extensions() {
        assert_eq!(Language::from_path(Path::new("main.py")), Language::Python);
        assert_eq!(Language::from_path(Path::new("src/lib.rs")), Language::Rust);
        assert_eq!(Language::from_path(Path::new("App.TSX")), Language::TypeScript);
        assert_eq!(Language::from_path(Path::new("include/x.h")), Language::C);
        assert_eq!(Language::from_path(Path::new("ci.yml")), Language::Yaml);
    }

    #[test]
    fn test_unknown_extension_is_text() {
        assert_eq!(Language::from_path(Path::new("notes.txt")), Language::Text);
        assert_eq!(Language::from_path(Path::new("Makefile")), Language::Text);
        assert_eq!(Language::from_extension(""), Language::Text);
    }

    #[test]
    fn test_extension_with_dot() {
        assert_eq!(Language::from_extension(".JSON"), Language::Json);
    }

    #[test]
    fn test_labels_are_unique() {
        let mut labels: Vec<_> = Language::all().iter().map(|l| l.label()).collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels.len(), Language::all().len());
    }
}
