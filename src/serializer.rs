use crate::{
    acquire::RepositoryInfo,
    config::OutputFormat,
    error::{Error, Result},
    file::SourceFile,
    splitter::{OutputChunk, Splitter},
};
use serde::Serialize;
use tera::{Context, Tera};
use tracing::trace;

const HEADER_TEMPLATE: &str = "header";
const MARKDOWN_HEADER_TEMPLATE: &str = "markdown_header";

#[derive(Serialize)]
struct EntryView<'a> {
    path: &'a str,
    language: &'a str,
    content: &'a str,
    fence: String,
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    path: &'a str,
    language: &'a str,
    content: &'a str,
    size: u64,
}

#[derive(Serialize)]
struct JsonRepositoryInfo<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(flatten)]
    info: &'a RepositoryInfo,
}

#[derive(Serialize)]
struct JsonGenerated<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    generated_at: &'a str,
}

/// Text placed at the start of the first chunk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Preamble {
    /// Repository information, when requested
    pub repository: Option<RepositoryInfo>,

    /// Generation timestamp, when requested
    pub generated_at: Option<String>,
}

impl Preamble {
    /// Returns true if there is nothing to render.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.repository.is_none() && self.generated_at.is_none()
    }
}

/// Renders source files in one of the output formats.
///
/// Simple, markdown and compact entries come from embedded Tera templates;
/// jsonl entries are encoded with `serde_json`.
pub struct Serializer {
    tera: Tera,
    format: OutputFormat,
}

impl Serializer {
    /// Creates a serializer for `format`.
    ///
    /// # Errors
    ///
    /// Returns an error if a built-in template fails to parse.
    pub fn new(format: OutputFormat) -> Result<Self> {
        let mut tera = Tera::default();
        Self::register_builtin_templates(&mut tera)?;
        Ok(Self { tera, format })
    }

    fn register_builtin_templates(tera: &mut Tera) -> Result<()> {
        let templates = [
            ("simple", include_str!("../templates/simple.tera")),
            ("markdown", include_str!("../templates/markdown.tera")),
            ("compact", include_str!("../templates/compact.tera")),
            (HEADER_TEMPLATE, include_str!("../templates/header.tera")),
            (
                MARKDOWN_HEADER_TEMPLATE,
                include_str!("../templates/markdown_header.tera"),
            ),
        ];

        for (name, source) in templates {
            tera.add_raw_template(name, source)
                .map_err(|e| Error::template(name, &e))?;
        }
        Ok(())
    }

    /// Returns the output format.
    #[must_use]
    pub const fn format(&self) -> OutputFormat {
        self.format
    }

    /// Renders one file entry, including its trailing separator.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering or JSON encoding fails.
    pub fn render_entry(&self, file: &SourceFile) -> Result<String> {
        let language = file.language.label();

        if self.format == OutputFormat::Jsonl {
            let entry = JsonEntry {
                path: &file.relative_path,
                language,
                content: &file.content,
                size: file.size,
            };
            let mut line = serde_json::to_string(&entry)?;
            line.push('\n');
            return Ok(line);
        }

        let content = with_trailing_newline(&file.content);
        let view = EntryView {
            path: &file.relative_path,
            language,
            content: &content,
            fence: fence_for(&content),
        };

        let mut rendered = self.render(self.format.template_name(), &view)?;
        rendered.push_str(self.entry_separator());
        trace!("Rendered {} ({} bytes)", file.relative_path, rendered.len());
        Ok(rendered)
    }

    /// Renders the preamble; empty when there is nothing to say.
    ///
    /// # Errors
    ///
    /// Returns an error if template rendering or JSON encoding fails.
    pub fn render_preamble(&self, preamble: &Preamble) -> Result<String> {
        if preamble.is_empty() {
            return Ok(String::new());
        }

        match self.format {
            OutputFormat::Jsonl => {
                let mut out = String::new();
                if let Some(info) = &preamble.repository {
                    out.push_str(&serde_json::to_string(&JsonRepositoryInfo {
                        kind: "repository_info",
                        info,
                    })?);
                    out.push('\n');
                }
                if let Some(generated_at) = &preamble.generated_at {
                    out.push_str(&serde_json::to_string(&JsonGenerated {
                        kind: "generated",
                        generated_at,
                    })?);
                    out.push('\n');
                }
                Ok(out)
            }
            OutputFormat::Markdown => {
                let mut out = self.render(MARKDOWN_HEADER_TEMPLATE, preamble)?;
                out.push_str("\n\n");
                Ok(out)
            }
            OutputFormat::Simple | OutputFormat::Compact => {
                let mut out = self.render(HEADER_TEMPLATE, preamble)?;
                out.push('\n');
                Ok(out)
            }
        }
    }

    /// Renders all files and groups them into chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if any entry fails to render.
    pub fn serialize<'a, I>(
        &self,
        files: I,
        chunk_size: Option<usize>,
        preamble: &Preamble,
    ) -> Result<Vec<OutputChunk>>
    where
        I: IntoIterator<Item = &'a SourceFile>,
    {
        let mut splitter = Splitter::new(chunk_size, self.render_preamble(preamble)?);
        for file in files {
            let entry = self.render_entry(file)?;
            splitter.push(&file.relative_path, &entry);
        }
        Ok(splitter.finish())
    }

    fn render<T: Serialize>(&self, template: &str, value: &T) -> Result<String> {
        let context = Context::from_serialize(value).map_err(|e| Error::template(template, &e))?;
        self.tera
            .render(template, &context)
            .map_err(|e| Error::template(template, &e))
    }

    const fn entry_separator(&self) -> &'static str {
        match self.format {
            OutputFormat::Markdown => "\n\n",
            _ => "\n",
        }
    }
}

/// Serializes files without a preamble.
///
/// # Errors
///
/// Returns an error if any entry fails to render.
pub fn serialize(
    files: &[SourceFile],
    format: OutputFormat,
    chunk_size: Option<usize>,
) -> Result<Vec<OutputChunk>> {
    Serializer::new(format)?.serialize(files, chunk_size, &Preamble::default())
}

fn with_trailing_newline(content: &str) -> String {
    if content.is_empty() || content.ends_with('\n') {
        content.to_string()
    } else {
        format!("{content}\n")
    }
}

/// A backtick fence longer than any backtick run inside `content`.
fn fence_for(content: &str) -> String {
    let longest = content
        .split(|c| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    "`".repeat((longest + 1).max(3))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(path: &str, content: &str) -> SourceFile {
        SourceFile::new(path, content.to_string(), content.len() as u64)
    }

    fn single(files: &[SourceFile], format: OutputFormat) -> String {
        let chunks = serialize(files, format, None).unwrap();
        assert_eq!(chunks.len(), 1);
        chunks[0].content.clone()
    }

    #[test]
    fn test_compact_format() {
        let files = [file("main.py", "def f():\n return 1\n"), file("README", "hi")];
        assert_eq!(
            single(&files, OutputFormat::Compact),
            "=== main.py (python) ===\ndef f():\n return 1\n\n=== README (text) ===\nhi\n\n"
        );
    }

    #[test]
    fn test_simple_format() {
        let files = [file("a.rs", "fn a(){}\n")];
        assert_eq!(single(&files, OutputFormat::Simple), "File: a.rs\nfn a(){}\n\n");
    }

    #[test]
    fn test_markdown_format() {
        let files = [file("src/lib.rs", "pub fn a(){}\n")];
        assert_eq!(
            single(&files, OutputFormat::Markdown),
            "## File: src/lib.rs\n\n```rust\npub fn a(){}\n```\n\n"
        );
    }

    #[test]
    fn test_markdown_fence_grows_past_backticks() {
        let files = [file("README.md", "```sh\nls\n```\n")];
        let out = single(&files, OutputFormat::Markdown);
        assert!(out.starts_with("## File: README.md\n\n````markdown\n```sh\n"));
        assert!(out.ends_with("```\n````\n\n"));
    }

    #[test]
    fn test_jsonl_format() {
        let files = [file("a.json", "{\"k\":1}\n")];
        let out = single(&files, OutputFormat::Jsonl);
        assert_eq!(out.lines().count(), 1);

        let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["path"], "a.json");
        assert_eq!(value["language"], "json");
        assert_eq!(value["content"], "{\"k\":1}\n");
        assert_eq!(value["size"], 8);
    }

    #[test]
    fn test_template_content_is_not_escaped() {
        let files = [file("index.html", "<p>a & b</p>\n")];
        assert_eq!(
            single(&files, OutputFormat::Compact),
            "=== index.html (html) ===\n<p>a & b</p>\n\n"
        );
    }

    #[test]
    fn test_preamble_per_format() {
        let preamble = Preamble {
            repository: Some(RepositoryInfo {
                url: "https://example.com/r.git".to_string(),
                branch: "main".to_string(),
                last_commit: "abc123 - dev, 2 days ago : init".to_string(),
            }),
            generated_at: None,
        };

        let simple = Serializer::new(OutputFormat::Simple).unwrap();
        assert_eq!(
            simple.render_preamble(&preamble).unwrap(),
            "Repository: https://example.com/r.git\nBranch: main\nLast Commit: abc123 - dev, 2 days ago : init\n\n"
        );

        let markdown = Serializer::new(OutputFormat::Markdown).unwrap();
        let out = markdown.render_preamble(&preamble).unwrap();
        assert!(out.starts_with("# Repository Information\n\n- **URL:** https://example.com/r.git\n"));
        assert!(out.ends_with("\n---\n\n"));

        let jsonl = Serializer::new(OutputFormat::Jsonl).unwrap();
        let out = jsonl.render_preamble(&preamble).unwrap();
        let value: serde_json::Value = serde_json::from_str(out.trim_end()).unwrap();
        assert_eq!(value["type"], "repository_info");
        assert_eq!(value["branch"], "main");
    }

    #[test]
    fn test_timestamp_only_preamble() {
        let preamble = Preamble {
            repository: None,
            generated_at: Some("2024-01-01T00:00:00Z".to_string()),
        };
        let compact = Serializer::new(OutputFormat::Compact).unwrap();
        assert_eq!(
            compact.render_preamble(&preamble).unwrap(),
            "Generated: 2024-01-01T00:00:00Z\n\n"
        );
        assert_eq!(compact.render_preamble(&Preamble::default()).unwrap(), "");
    }

    #[test]
    fn test_chunking_keeps_entries_whole() {
        let files: Vec<_> = (0..5).map(|i| file(&format!("f{i}.txt"), "0123456789\n")).collect();
        let chunks = serialize(&files, OutputFormat::Compact, Some(60)).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.len() <= 60 || chunk.file_count() == 1);
            assert!(chunk.content.starts_with("=== "));
        }
        let total: usize = chunks.iter().map(OutputChunk::file_count).sum();
        assert_eq!(total, 5);
    }

    #[test]
    fn test_fence_minimum_is_three() {
        assert_eq!(fence_for("plain"), "```");
        assert_eq!(fence_for("a ```` b"), "`````");
    }
}
