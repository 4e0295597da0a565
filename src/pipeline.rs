use crate::{
    acquire::RepositoryInfo,
    config::Config,
    error::Result,
    filter::FileFilter,
    optimize::Optimizer,
    serializer::{Preamble, Serializer},
    splitter::{OutputChunk, Splitter},
    walker::RepositoryWalker,
    writer::Writer,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

// Rough average for source text
const BYTES_PER_TOKEN: usize = 4;

/// Statistics collected during pipeline execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineStats {
    /// Files that made it into the output
    pub files: usize,

    /// Files rejected by the filter
    pub excluded: usize,

    /// Directories that were never entered
    pub pruned_dirs: usize,

    /// Entries that could not be read
    pub walk_errors: usize,

    /// Files that only got whitespace cleanup because their language
    /// transform gave up
    pub fallbacks: usize,

    /// Content bytes before optimization
    pub bytes_before: usize,

    /// Content bytes after optimization
    pub bytes_after: usize,

    /// Serialized output bytes
    pub output_bytes: usize,

    /// Estimated token count of the output
    pub estimated_tokens: usize,

    /// Number of chunks produced
    pub chunks: usize,

    /// Number of files written
    pub files_written: usize,

    /// Output path
    pub output: String,

    /// Total execution time
    pub duration: Duration,

    /// Time spent walking, optimizing and rendering
    pub process_duration: Duration,

    /// Time spent writing
    pub write_duration: Duration,
}

impl PipelineStats {
    /// Share of content bytes removed by optimization, in percent.
    #[must_use]
    pub fn reduction_percent(&self) -> f64 {
        if self.bytes_before == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let ratio = self.bytes_after as f64 / self.bytes_before as f64;
        (1.0 - ratio) * 100.0
    }

    /// Prints a human-readable summary to stdout.
    pub fn print_summary(&self) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║                 Conversion Summary                    ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        println!("║ Files Included:       {:>8}                        ║", self.files);
        println!("║ Files Excluded:       {:>8}                        ║", self.excluded);
        println!("║ Directories Pruned:   {:>8}                        ║", self.pruned_dirs);
        println!("║ Read Errors:          {:>8}                        ║", self.walk_errors);
        println!("║ Optimizer Fallbacks:  {:>8}                        ║", self.fallbacks);
        println!("║                                                       ║");
        println!("║ Bytes Before:         {:>8}                        ║", self.bytes_before);
        println!("║ Bytes After:          {:>8}                        ║", self.bytes_after);
        println!("║ Reduction:            {:>7.1}%                        ║", self.reduction_percent());
        println!("║ Estimated Tokens:     {:>8}                        ║", self.estimated_tokens);
        println!("║                                                       ║");
        println!("║ Chunks Created:       {:>8}                        ║", self.chunks);
        println!("║ Files Written:        {:>8}                        ║", self.files_written);
        println!("║ Output:                                               ║");
        println!("║   {}", self.output);
        println!("║                                                       ║");
        println!("║ Timing Breakdown:                                     ║");
        println!(
            "║   - Processing:       {:>8.2}s                     ║",
            self.process_duration.as_secs_f64()
        );
        println!(
            "║   - Writing:          {:>8.2}s                     ║",
            self.write_duration.as_secs_f64()
        );
        println!(
            "║   - Total:            {:>8.2}s                     ║",
            self.duration.as_secs_f64()
        );
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

/// Orchestrates walking, optimizing, serializing and writing.
pub struct Pipeline {
    config: Config,
    walker: RepositoryWalker,
    optimizer: Optimizer,
    serializer: Serializer,
    writer: Writer,
}

impl Pipeline {
    /// Creates a new pipeline with the given configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - A built-in template fails to parse
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let walker = RepositoryWalker::new(&config.root_dir, FileFilter::new(config.filter.clone()))
            .respect_gitignore(config.respect_gitignore)
            .verbose_ignore(config.verbose_ignore);
        let optimizer = Optimizer::new(config.optimization);
        let serializer = Serializer::new(config.format)?;
        let writer = Writer::new(&config.output);

        Ok(Self {
            config,
            walker,
            optimizer,
            serializer,
            writer,
        })
    }

    /// Executes the pipeline and returns statistics.
    ///
    /// # Process
    ///
    /// 1. **Process**: walks the tree, optimizing and rendering each file as
    ///    it is yielded and packing the entries into chunks
    /// 2. **Write**: persists the chunks to the output path
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails or the output cannot be written.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use repo2txt::{Config, Pipeline};
    ///
    /// # fn main() -> anyhow::Result<()> {
    /// let config = Config::builder()
    ///     .root_dir("./my-project")
    ///     .output("context.txt")
    ///     .build()?;
    ///
    /// let stats = Pipeline::new(config)?.run()?;
    /// stats.print_summary();
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip(self), fields(root_dir = %self.config.root_dir.display()))]
    pub fn run(self) -> Result<PipelineStats> {
        let start_time = Instant::now();
        let mut stats = PipelineStats {
            output: self.config.output.display().to_string(),
            ..PipelineStats::default()
        };

        info!("Stage 1/2: Processing {}...", self.config.root_dir.display());
        let process_start = Instant::now();
        let chunks = self.process(&mut stats)?;
        stats.process_duration = process_start.elapsed();

        stats.chunks = chunks.len();
        stats.output_bytes = chunks.iter().map(OutputChunk::len).sum();
        stats.estimated_tokens = stats.output_bytes / BYTES_PER_TOKEN;

        info!(
            "✓ Processed {} files ({} excluded) into {} chunk(s) in {:.2}s",
            stats.files,
            stats.excluded,
            stats.chunks,
            stats.process_duration.as_secs_f64()
        );

        if stats.files == 0 {
            warn!("No files matched the filters; the output holds no file entries");
        }

        let write_start = Instant::now();
        if self.config.dry_run {
            warn!("Dry run mode enabled - skipping file writes");
            self.print_dry_run_summary(&chunks);
        } else {
            info!("Stage 2/2: Writing output...");
            stats.files_written = self.writer.write_chunks(&chunks)?.len();
        }
        stats.write_duration = write_start.elapsed();

        stats.duration = start_time.elapsed();
        info!(
            "✓ Conversion completed in {:.2}s",
            stats.duration.as_secs_f64()
        );

        Ok(stats)
    }

    /// Walks, optimizes and renders every file into chunks.
    fn process(&self, stats: &mut PipelineStats) -> Result<Vec<OutputChunk>> {
        let preamble = self.serializer.render_preamble(&self.preamble())?;
        let mut splitter = Splitter::new(self.config.chunk_size, preamble);

        let mut walk = self.walker.walk();
        for file in walk.by_ref() {
            if self.writer.owns(&self.config.root_dir.join(&file.relative_path)) {
                debug!("Skipping previous output {}", file.relative_path);
                stats.excluded += 1;
                continue;
            }

            let optimized = self.optimizer.optimize(&file.content, file.language);
            if let Some(reason) = optimized.fallback {
                warn!(
                    "{}: {}; applied whitespace cleanup only",
                    file.relative_path, reason
                );
                stats.fallbacks += 1;
            }

            stats.files += 1;
            stats.bytes_before += file.content_len();
            stats.bytes_after += optimized.content.len();

            let file = file.with_content(optimized.content);
            let entry = self.serializer.render_entry(&file)?;
            splitter.push(&file.relative_path, &entry);
        }

        let walked = walk.stats();
        stats.excluded += walked.excluded;
        stats.pruned_dirs = walked.pruned_dirs;
        stats.walk_errors = walked.errors;

        Ok(splitter.finish())
    }

    fn preamble(&self) -> Preamble {
        Preamble {
            repository: self
                .config
                .include_repo_info
                .then(|| RepositoryInfo::read(&self.config.root_dir)),
            generated_at: self
                .config
                .timestamp
                .then(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }

    /// Prints a summary for dry run mode.
    fn print_dry_run_summary(&self, chunks: &[OutputChunk]) {
        println!("\n╔═══════════════════════════════════════════════════════╗");
        println!("║                 Dry Run Summary                       ║");
        println!("╠═══════════════════════════════════════════════════════╣");
        for chunk in chunks {
            println!(
                "║ {} ({} files, {} bytes)",
                self.writer.chunk_path(chunk.index, chunks.len()).display(),
                chunk.file_count(),
                chunk.len()
            );
        }
        println!("║                                                       ║");
        println!("║ ⚠ No files were written (dry run mode)               ║");
        println!("╚═══════════════════════════════════════════════════════╝\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use assert_fs::prelude::*;

    #[test]
    fn test_pipeline_basic_execution() {
        let temp = assert_fs::TempDir::new().unwrap();
        let repo = temp.child("repo");
        repo.child("a.rs").write_str("fn main() {\n    run();\n}\n").unwrap();
        repo.child("b.py").write_str("x = 1\n").unwrap();
        repo.child("logo.png").write_binary(&[0x89, b'P', b'N', b'G']).unwrap();

        let config = Config::builder()
            .root_dir(repo.path())
            .output(temp.path().join("out.txt"))
            .build()
            .unwrap();
        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(stats.files, 2);
        assert_eq!(stats.excluded, 1);
        assert_eq!(stats.chunks, 1);
        assert_eq!(stats.files_written, 1);
        assert!(stats.bytes_after < stats.bytes_before);
        temp.child("out.txt").assert(
            "=== a.rs (rust) ===\nfn main(){\n run();\n}\n\n=== b.py (python) ===\nx=1\n\n",
        );
    }

    #[test]
    fn test_pipeline_dry_run() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("file.rs").write_str("fn main() {}").unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .output(temp.path().join("out/result.txt"))
            .dry_run(true)
            .build()
            .unwrap();

        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(stats.files_written, 0);
        assert_eq!(stats.files, 1);
        assert!(!temp.child("out").path().exists());
    }

    #[test]
    fn test_previous_output_inside_root_is_skipped() {
        let temp = assert_fs::TempDir::new().unwrap();
        temp.child("main.go").write_str("package main\n").unwrap();
        temp.child("context.txt").write_str("stale output\n").unwrap();
        temp.child("context_2.txt").write_str("stale chunk\n").unwrap();

        let config = Config::builder()
            .root_dir(temp.path())
            .output(temp.path().join("context.txt"))
            .build()
            .unwrap();
        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(stats.files, 1);
        assert_eq!(stats.excluded, 2);
        temp.child("context.txt").assert("=== main.go (go) ===\npackage main\n\n");
    }

    #[test]
    fn test_chunked_output() {
        let temp = assert_fs::TempDir::new().unwrap();
        let repo = temp.child("repo");
        for name in ["a", "b", "c"] {
            repo.child(format!("{name}.txt"))
                .write_str(&"line of text\n".repeat(5))
                .unwrap();
        }

        let config = Config::builder()
            .root_dir(repo.path())
            .output(temp.path().join("out.jsonl"))
            .format(OutputFormat::Jsonl)
            .chunk_size(100)
            .build()
            .unwrap();
        let stats = Pipeline::new(config).unwrap().run().unwrap();

        assert_eq!(stats.chunks, 3);
        assert_eq!(stats.files_written, 3);
        for n in 1..=3 {
            let content = std::fs::read_to_string(temp.child(format!("out_{n}.jsonl")).path()).unwrap();
            assert_eq!(content.lines().count(), 1);
        }
    }

    #[test]
    fn test_reduction_percent() {
        let stats = PipelineStats {
            bytes_before: 200,
            bytes_after: 150,
            ..PipelineStats::default()
        };
        assert!((stats.reduction_percent() - 25.0).abs() < f64::EPSILON);
        assert!(PipelineStats::default().reduction_percent().abs() < f64::EPSILON);
    }
}
