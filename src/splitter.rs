use tracing::{debug, trace};

/// A size-bounded piece of the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputChunk {
    /// Sequential chunk index (0-based)
    pub index: usize,

    /// Serialized text
    pub content: String,

    /// Relative paths of the entries in this chunk, in order
    pub files: Vec<String>,
}

impl OutputChunk {
    /// Returns the serialized length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Returns true if the chunk holds no text at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns the number of file entries.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Groups serialized entries into chunks of at most `limit` bytes.
///
/// # Algorithm
///
/// 1. Entries are appended to the current chunk in arrival order
/// 2. When the next entry would push the chunk past the limit, the chunk is
///    closed and a new one starts with that entry
/// 3. An entry is never split; one that alone exceeds the limit gets a chunk
///    to itself
///
/// The preamble opens the first chunk and counts toward its size. When the
/// first entry does not fit next to it, the preamble is closed as a chunk of
/// its own. Without a limit everything lands in a single chunk.
#[derive(Debug)]
pub struct Splitter {
    limit: Option<usize>,
    chunks: Vec<OutputChunk>,
    current: ChunkBuilder,
}

impl Splitter {
    /// Creates a splitter. A limit of zero means no limit.
    #[must_use]
    pub fn new(limit: Option<usize>, preamble: String) -> Self {
        let limit = limit.filter(|&l| l > 0);
        let mut current = ChunkBuilder::new(0, limit);
        current.content = preamble;
        Self {
            limit,
            chunks: Vec::new(),
            current,
        }
    }

    /// Appends one serialized entry.
    pub fn push(&mut self, path: &str, entry: &str) {
        if !self.current.can_fit(entry.len()) {
            let next = ChunkBuilder::new(self.chunks.len() + 1, self.limit);
            let full = std::mem::replace(&mut self.current, next);
            trace!("Closing chunk {} at {} bytes", full.index, full.content.len());
            self.chunks.push(full.build());
        }
        self.current.add_entry(path, entry);
    }

    /// Closes the last chunk and returns all of them.
    ///
    /// Always returns at least one chunk.
    #[must_use]
    pub fn finish(mut self) -> Vec<OutputChunk> {
        self.chunks.push(self.current.build());

        if let Some(limit) = self.limit {
            let oversized = self
                .chunks
                .iter()
                .filter(|c| c.len() > limit)
                .count();
            if oversized > 0 {
                debug!("{oversized} chunk(s) hold a single entry larger than {limit} bytes");
            }
        }

        self.chunks
    }
}

/// Accumulates entries for one chunk.
#[derive(Debug)]
struct ChunkBuilder {
    index: usize,
    limit: Option<usize>,
    content: String,
    files: Vec<String>,
}

impl ChunkBuilder {
    const fn new(index: usize, limit: Option<usize>) -> Self {
        Self {
            index,
            limit,
            content: String::new(),
            files: Vec::new(),
        }
    }

    fn can_fit(&self, len: usize) -> bool {
        self.content.is_empty()
            || self
                .limit
                .is_none_or(|limit| self.content.len() + len <= limit)
    }

    fn add_entry(&mut self, path: &str, entry: &str) {
        self.content.push_str(entry);
        self.files.push(path.to_string());
    }

    fn build(self) -> OutputChunk {
        OutputChunk {
            index: self.index,
            content: self.content,
            files: self.files,
        }
    }
}
