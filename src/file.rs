use crate::language::Language;
use std::path::Path;

/// Size of the prefix inspected by the binary heuristic.
pub const SNIFF_LEN: usize = 8192;

// Share of control bytes in the sample above which content counts as binary
const CONTROL_THRESHOLD: f64 = 0.30;

/// A file that survived filtering, with its content.
///
/// Values are never mutated in place; [`SourceFile::with_content`] produces a
/// new value carrying the transformed text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Relative path from the root directory, `/`-separated
    pub relative_path: String,

    /// Language detected from the extension
    pub language: Language,

    /// File content
    pub content: String,

    /// Size of the file on disk in bytes
    pub size: u64,
}

impl SourceFile {
    /// Creates a source file, detecting the language from the path.
    #[must_use]
    pub fn new(relative_path: impl Into<String>, content: String, size: u64) -> Self {
        let relative_path = relative_path.into();
        let language = Language::from_path(Path::new(&relative_path));
        Self {
            relative_path,
            language,
            content,
            size,
        }
    }

    /// Returns a copy of this file with different content.
    #[must_use]
    pub fn with_content(&self, content: String) -> Self {
        Self {
            relative_path: self.relative_path.clone(),
            language: self.language,
            content,
            size: self.size,
        }
    }

    /// Returns the content length in bytes.
    #[must_use]
    pub fn content_len(&self) -> usize {
        self.content.len()
    }

    /// Returns the number of lines.
    #[must_use]
    pub fn line_count(&self) -> usize {
        self.content.lines().count()
    }
}

/// What the content sniffer concluded about a byte buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    /// Valid UTF-8 text
    Text,
    /// Null bytes or too many control bytes in the leading sample
    Binary,
    /// Looks textual but is not valid UTF-8
    NotText,
}

/// Classifies content.
///
/// # Algorithm
///
/// 1. Takes the first 8KB of the buffer
/// 2. Any null byte means binary
/// 3. More than 30% control bytes (other than tab, newline, form feed and
///    carriage return) means binary
/// 4. Otherwise the whole buffer must decode as UTF-8
#[must_use]
pub fn classify_content(bytes: &[u8]) -> ContentKind {
    if is_likely_binary(bytes) {
        ContentKind::Binary
    } else if std::str::from_utf8(bytes).is_err() {
        ContentKind::NotText
    } else {
        ContentKind::Text
    }
}

pub(crate) fn is_likely_binary(bytes: &[u8]) -> bool {
    let sample = &bytes[..bytes.len().min(SNIFF_LEN)];
    if sample.is_empty() {
        return false;
    }

    if memchr::memchr(0, sample).is_some() {
        return true;
    }

    let control = sample
        .iter()
        .filter(|&&b| (b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0c)) || b == 0x7f)
        .count();

    #[allow(clippy::cast_precision_loss)]
    let ratio = control as f64 / sample.len() as f64;
    ratio > CONTROL_THRESHOLD
}
