use std::error::Error as StdError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using the library's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the repo2txt library.
///
/// Only [`Error::Acquisition`] and errors concerning the output destination
/// abort a run. Unreadable input files are logged and skipped by the walker,
/// undecodable files are filtered out, and optimizer failures fall back to
/// whitespace-only processing without ever surfacing here.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum Error {
    /// IO error with context about the file path.
    #[error("IO error accessing '{path}': {message}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// Error message
        message: String,
    },

    /// Remote repository could not be materialized locally.
    #[error("Failed to acquire repository '{source_url}': {message}")]
    Acquisition {
        /// URL that was requested
        source_url: String,
        /// Error message
        message: String,
    },

    /// Template rendering error.
    #[error("Failed to render template '{template}': {message}")]
    Template {
        /// Template name
        template: String,
        /// Error message
        message: String,
    },

    /// Configuration validation error.
    #[error("Invalid configuration: {message}")]
    Config {
        /// Detailed error message
        message: String,
    },

    /// JSON serialization error.
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error message
        message: String,
    },

    /// Invalid ignore pattern.
    #[error("Invalid ignore pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The invalid pattern
        pattern: String,
        /// Reason why it's invalid
        reason: String,
    },
}

impl Error {
    /// Creates an IO error with path context.
    #[must_use]
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Creates a repository acquisition error.
    #[must_use]
    pub fn acquisition(source_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Acquisition {
            source_url: source_url.into(),
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a template error.
    #[must_use]
    pub fn template(template: impl Into<String>, source: &tera::Error) -> Self {
        Self::Template {
            template: template.into(),
            message: render_chain(source),
        }
    }

    /// Creates an invalid pattern error.
    #[must_use]
    pub fn invalid_pattern(pattern: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if this is an IO error.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// Returns true if this is a configuration error.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config { .. } | Self::InvalidPattern { .. })
    }

    /// Returns true if this is a repository acquisition error.
    #[must_use]
    pub const fn is_acquisition(&self) -> bool {
        matches!(self, Self::Acquisition { .. })
    }
}

// tera hides the interesting part of a failure in its source chain
fn render_chain(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = StdError::source(err);
    while let Some(inner) = source {
        message.push_str(": ");
        message.push_str(&inner.to_string());
        source = StdError::source(inner);
    }
    message
}

impl From<tera::Error> for Error {
    fn from(e: tera::Error) -> Self {
        Self::template("unknown", &e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization {
            message: e.to_string(),
        }
    }
}
