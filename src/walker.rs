use crate::{
    file::SourceFile,
    filter::{ExclusionReason, FileFilter, FilterDecision},
};
use ignore::WalkBuilder;
use serde::Serialize;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};
use tracing::{debug, info, trace, warn};

/// Counters kept while walking.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    /// Files yielded
    pub files: usize,

    /// Files rejected by the filter
    pub excluded: usize,

    /// Directories that were never entered
    pub pruned_dirs: usize,

    /// Entries that could not be read
    pub errors: usize,
}

/// Traverses a directory tree and yields the files that pass the filter.
///
/// Every call to [`RepositoryWalker::walk`] starts a new traversal. Entries
/// are visited in file-name order at each level, so two walks over an
/// unchanged tree yield the same sequence.
#[derive(Debug, Clone)]
pub struct RepositoryWalker {
    root: PathBuf,
    filter: Arc<FileFilter>,
    respect_gitignore: bool,
    verbose_ignore: bool,
}

impl RepositoryWalker {
    /// Creates a walker rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, filter: FileFilter) -> Self {
        Self {
            root: root.into(),
            filter: Arc::new(filter),
            respect_gitignore: false,
            verbose_ignore: false,
        }
    }

    /// Also honors `.gitignore` files found in the tree.
    #[must_use]
    pub const fn respect_gitignore(mut self, enabled: bool) -> Self {
        self.respect_gitignore = enabled;
        self
    }

    /// Logs exclusions at info level instead of debug.
    #[must_use]
    pub const fn verbose_ignore(mut self, enabled: bool) -> Self {
        self.verbose_ignore = enabled;
        self
    }

    /// Returns the root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Starts a traversal.
    #[must_use]
    pub fn walk(&self) -> Walk {
        debug!("Walking {}", self.root.display());

        let pruned = Arc::new(AtomicUsize::new(0));
        let mut builder = WalkBuilder::new(&self.root);
        builder
            .standard_filters(false)
            .hidden(false)
            .git_ignore(self.respect_gitignore)
            .git_exclude(self.respect_gitignore)
            .require_git(false)
            .follow_links(false)
            .sort_by_file_name(|a, b| a.cmp(b));

        {
            let root = self.root.clone();
            let filter = Arc::clone(&self.filter);
            let pruned = Arc::clone(&pruned);
            let verbose = self.verbose_ignore;
            builder.filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                if entry.depth() == 0 || !is_dir {
                    return true;
                }
                let Some(relative) = relative_path(entry.path(), &root) else {
                    return true;
                };
                if filter.should_descend(&relative) {
                    return true;
                }
                pruned.fetch_add(1, Ordering::Relaxed);
                if verbose {
                    info!("Skipping directory {relative}/");
                } else {
                    debug!("Skipping directory {relative}/");
                }
                false
            });
        }

        Walk {
            inner: builder.build(),
            root: self.root.clone(),
            filter: Arc::clone(&self.filter),
            verbose_ignore: self.verbose_ignore,
            pruned,
            stats: WalkStats::default(),
        }
    }
}

/// A running traversal; yields [`SourceFile`] values lazily.
pub struct Walk {
    inner: ignore::Walk,
    root: PathBuf,
    filter: Arc<FileFilter>,
    verbose_ignore: bool,
    pruned: Arc<AtomicUsize>,
    stats: WalkStats,
}

impl Walk {
    /// Counters for the entries seen so far.
    #[must_use]
    pub fn stats(&self) -> WalkStats {
        WalkStats {
            pruned_dirs: self.pruned.load(Ordering::Relaxed),
            ..self.stats
        }
    }

    fn exclude(&mut self, relative: &str, reason: &ExclusionReason) {
        self.stats.excluded += 1;
        if self.verbose_ignore {
            info!("Ignoring {relative}: {reason}");
        } else {
            debug!("Ignoring {relative}: {reason}");
        }
    }

    fn load(&mut self, path: &Path, relative: String, size: u64) -> Option<SourceFile> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                self.stats.errors += 1;
                return None;
            }
        };

        let content = match self.filter.decode_content(bytes) {
            Ok(content) => content,
            Err(reason) => {
                self.exclude(&relative, &reason);
                return None;
            }
        };

        trace!("Yielding {relative} ({size} bytes)");
        self.stats.files += 1;
        Some(SourceFile::new(relative, content, size))
    }
}

impl Iterator for Walk {
    type Item = SourceFile;

    fn next(&mut self) -> Option<SourceFile> {
        loop {
            let entry = match self.inner.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Walk error: {}", e);
                    self.stats.errors += 1;
                    continue;
                }
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let path = entry.path();
            let Some(relative) = relative_path(path, &self.root) else {
                warn!("Cannot compute relative path for {}", path.display());
                self.stats.errors += 1;
                continue;
            };

            let size = match entry.metadata() {
                Ok(metadata) => metadata.len(),
                Err(e) => {
                    warn!("Failed to stat {}: {}", path.display(), e);
                    self.stats.errors += 1;
                    continue;
                }
            };

            if let FilterDecision::Exclude(reason) = self.filter.check_metadata(&relative, size) {
                self.exclude(&relative, &reason);
                continue;
            }

            let path = path.to_path_buf();
            if let Some(file) = self.load(&path, relative, size) {
                return Some(file);
            }
        }
    }
}

/// `/`-separated path of `path` relative to `root`.
fn relative_path(path: &Path, root: &Path) -> Option<String> {
    let relative = pathdiff::diff_paths(path, root)?;
    let parts: Vec<_> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterConfig;
    use crate::pattern::PatternMatcher;
    use assert_fs::prelude::*;

    fn paths(walk: Walk) -> Vec<String> {
        walk.map(|f| f.relative_path).collect()
    }

    #[test]
    fn test_walk_is_sorted_and_restartable() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("b.rs").write_str("fn b() {}").unwrap();
        temp.child("a/z.py").write_str("z = 1").unwrap();
        temp.child("a/c.py").write_str("c = 1").unwrap();
        temp.child("c.txt").write_str("text").unwrap();

        let walker = RepositoryWalker::new(temp.path(), FileFilter::new(FilterConfig::default()));
        let first = paths(walker.walk());
        let second = paths(walker.walk());

        assert_eq!(first, vec!["a/c.py", "a/z.py", "b.rs", "c.txt"]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_excluded_directories_are_pruned() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("node_modules/lib/index.js").write_str("x").unwrap();
        temp.child("src/vendor/dep.js").write_str("x").unwrap();
        temp.child("src/main.js").write_str("x").unwrap();

        let patterns = PatternMatcher::new(["src/vendor/**"]).unwrap();
        let filter = FileFilter::new(FilterConfig::default().patterns(patterns));
        let mut walk = RepositoryWalker::new(temp.path(), filter).walk();

        let files: Vec<_> = walk.by_ref().map(|f| f.relative_path).collect();
        assert_eq!(files, vec!["src/main.js"]);
        assert_eq!(walk.stats().pruned_dirs, 2);
        assert_eq!(walk.stats().files, 1);
    }

    #[test]
    fn test_counts_excluded_files() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("image.png").write_binary(&[0x89, b'P', b'N', b'G']).unwrap();
        temp.child("data.raw").write_binary(&[1, 0, 2, 0]).unwrap();
        temp.child("latin1.txt").write_binary(&[b'c', b'a', b'f', 0xe9]).unwrap();
        temp.child("ok.md").write_str("# ok").unwrap();

        let mut walk = RepositoryWalker::new(temp.path(), FileFilter::new(FilterConfig::default())).walk();
        let files: Vec<_> = walk.by_ref().collect();

        assert_eq!(files.len(), 1);
        assert_eq!(files[0].relative_path, "ok.md");
        assert_eq!(files[0].size, 4);
        assert_eq!(walk.stats().excluded, 3);
        assert_eq!(walk.stats().errors, 0);
    }

    #[test]
    fn test_hidden_files_are_walked() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(".github/workflows/ci.yml").write_str("on: push").unwrap();
        temp.child(".gitignore").write_str("*.log").unwrap();

        let files = paths(RepositoryWalker::new(temp.path(), FileFilter::new(FilterConfig::default())).walk());
        assert_eq!(files, vec![".github/workflows/ci.yml"]);
    }

    #[test]
    fn test_gitignore_only_when_enabled() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child(".gitignore").write_str("*.log\n").unwrap();
        temp.child("app.log").write_str("log line").unwrap();
        temp.child("app.py").write_str("pass").unwrap();

        let walker = RepositoryWalker::new(temp.path(), FileFilter::new(FilterConfig::default()));
        assert_eq!(paths(walker.walk()), vec!["app.log", "app.py"]);

        let walker = walker.respect_gitignore(true);
        assert_eq!(paths(walker.walk()), vec!["app.py"]);
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/repo");
        assert_eq!(
            relative_path(&root.join("a").join("b.rs"), root).as_deref(),
            Some("a/b.rs")
        );
        assert_eq!(relative_path(root, root), None);
    }
}
