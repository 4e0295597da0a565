use crate::{
    error::{Error, Result},
    splitter::OutputChunk,
};
use std::{
    ffi::OsString,
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use tracing::{debug, info};

/// Writes chunks to the output path with atomic operations.
///
/// A single chunk goes to the configured path. Several chunks go to numbered
/// siblings: `out.txt` becomes `out_1.txt`, `out_2.txt` and so on.
#[derive(Debug, Clone)]
pub struct Writer {
    output: PathBuf,
    absolute: PathBuf,
}

impl Writer {
    /// Creates a writer for the given output path.
    #[must_use]
    pub fn new(output: impl Into<PathBuf>) -> Self {
        let output = output.into();
        let absolute = std::path::absolute(&output).unwrap_or_else(|_| output.clone());
        Self { output, absolute }
    }

    /// Returns the configured output path.
    #[must_use]
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Path of the chunk at `index` (0-based) out of `total`.
    #[must_use]
    pub fn chunk_path(&self, index: usize, total: usize) -> PathBuf {
        if total <= 1 {
            self.output.clone()
        } else {
            numbered(&self.output, index + 1)
        }
    }

    /// Returns true if `path` is the output file or one of its numbered
    /// siblings, as written by this or an earlier run.
    #[must_use]
    pub fn owns(&self, path: &Path) -> bool {
        let Ok(candidate) = std::path::absolute(path) else {
            return false;
        };
        if candidate.parent() != self.absolute.parent() {
            return false;
        }
        if candidate.file_name() == self.absolute.file_name() {
            return true;
        }

        let (Some(stem), Some(name)) = (
            self.absolute.file_stem().and_then(|s| s.to_str()),
            candidate.file_name().and_then(|s| s.to_str()),
        ) else {
            return false;
        };
        let extension = self.absolute.extension().and_then(|e| e.to_str());

        let Some(rest) = name.strip_prefix(stem).and_then(|r| r.strip_prefix('_')) else {
            return false;
        };
        let number = match extension {
            Some(ext) => rest.strip_suffix(ext).and_then(|r| r.strip_suffix('.')),
            None => Some(rest),
        };
        number.is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Writes every chunk and returns the paths written.
    ///
    /// # Errors
    ///
    /// Returns an error if the output directory cannot be created or a file
    /// cannot be written. Files written before the failure stay in place.
    pub fn write_chunks(&self, chunks: &[OutputChunk]) -> Result<Vec<PathBuf>> {
        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }

        let total = chunks.len();
        let mut written = Vec::with_capacity(total);
        for chunk in chunks {
            let path = self.chunk_path(chunk.index, total);
            write_file_atomic(&path, &chunk.content)?;

            if total > 1 {
                info!("Wrote chunk {}/{} to {}", chunk.index + 1, total, path.display());
            } else {
                info!("Wrote output to {}", path.display());
            }
            written.push(path);
        }

        Ok(written)
    }
}

fn numbered(path: &Path, n: usize) -> PathBuf {
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let name = match path.extension() {
        Some(ext) => format!("{stem}_{n}.{}", ext.to_string_lossy()),
        None => format!("{stem}_{n}"),
    };
    path.with_file_name(name)
}

/// Writes through a sibling temporary file and renames it into place.
fn write_file_atomic(path: &Path, content: &str) -> Result<()> {
    let mut temp_name = path.file_name().map(OsString::from).unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    let mut temp_file = fs::File::create(&temp_path).map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .write_all(content.as_bytes())
        .map_err(|e| Error::io(&temp_path, e))?;

    // Ensure data is flushed to disk
    temp_file
        .sync_all()
        .map_err(|e| Error::io(&temp_path, e))?;

    drop(temp_file);

    fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::prelude::*;

    fn chunk(index: usize, content: &str) -> OutputChunk {
        OutputChunk {
            index,
            content: content.to_string(),
            files: vec![format!("f{index}")],
        }
    }

    #[test]
    fn test_single_chunk_uses_output_path() {
        let temp = assert_fs::TempDir::new().unwrap();
        let writer = Writer::new(temp.path().join("out.txt"));

        let written = writer.write_chunks(&[chunk(0, "hello\n")]).unwrap();

        assert_eq!(written, vec![temp.path().join("out.txt")]);
        temp.child("out.txt").assert("hello\n");
        assert!(!temp.child("out.txt.tmp").path().exists());
    }

    #[test]
    fn test_multiple_chunks_are_numbered() {
        let temp = assert_fs::TempDir::new().unwrap();
        let writer = Writer::new(temp.path().join("nested/out.md"));

        writer
            .write_chunks(&[chunk(0, "one"), chunk(1, "two"), chunk(2, "three")])
            .unwrap();

        temp.child("nested/out_1.md").assert("one");
        temp.child("nested/out_2.md").assert("two");
        temp.child("nested/out_3.md").assert("three");
        assert!(!temp.child("nested/out.md").path().exists());
    }

    #[test]
    fn test_numbering_without_extension() {
        assert_eq!(numbered(Path::new("dir/out"), 2), PathBuf::from("dir/out_2"));
        assert_eq!(numbered(Path::new("a.b.txt"), 1), PathBuf::from("a.b_1.txt"));
    }

    #[test]
    fn test_overwrites_existing_output() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("out.txt").write_str("old").unwrap();

        Writer::new(temp.path().join("out.txt"))
            .write_chunks(&[chunk(0, "new")])
            .unwrap();

        temp.child("out.txt").assert("new");
    }

    #[test]
    fn test_owns_output_and_numbered_siblings() {
        let temp = assert_fs::TempDir::new().unwrap();
        let writer = Writer::new(temp.path().join("out.txt"));

        assert!(writer.owns(&temp.path().join("out.txt")));
        assert!(writer.owns(&temp.path().join("out_12.txt")));
        assert!(!writer.owns(&temp.path().join("out_x.txt")));
        assert!(!writer.owns(&temp.path().join("out_.txt")));
        assert!(!writer.owns(&temp.path().join("other.txt")));
        assert!(!writer.owns(&temp.path().join("sub/out.txt")));
    }
}
