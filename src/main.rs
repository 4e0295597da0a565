use anyhow::{Context, bail};
use clap::Parser;
use repo2txt::{
    Config, DEFAULT_MAX_FILE_SIZE, OptimizationLevel, OutputFormat, Pipeline, clone_repository,
    write_example_ignore_file,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    name = "repo2txt",
    version,
    author,
    about = "Convert a code repository into a single token-efficient text file for LLMs",
    long_about = "Convert a code repository into a single token-efficient text file for LLMs.\n\n\
    The tool walks a local directory or a shallow clone of a remote repository, filters out \
    binaries, vendored directories and ignored paths, strips redundant whitespace and comments \
    per language, and writes everything into one file (or several numbered chunks).\n\n\
    USAGE EXAMPLES:\n  \
      # Convert the current directory\n  \
      repo2txt --local . --output ../context.txt\n\n  \
      # Convert a remote repository to Markdown\n  \
      repo2txt --repo https://github.com/user/project.git --output project.md --format markdown\n\n  \
      # Maximum reduction, split into 500 KB chunks\n  \
      repo2txt --local ./src --output out.txt --level 3 --chunk-size 500000\n\n  \
      # Write an example ignore file\n  \
      repo2txt --create-example-ignore .repo2txtignore"
)]
struct Cli {
    /// Remote repository URL to clone
    #[arg(
        long,
        value_name = "URL",
        conflicts_with = "local",
        required_unless_present_any = ["local", "create_example_ignore"]
    )]
    repo: Option<String>,

    /// Local path to the repository
    #[arg(
        long,
        value_name = "PATH",
        required_unless_present_any = ["repo", "create_example_ignore"]
    )]
    local: Option<PathBuf>,

    /// Output file path (numbered siblings are written when chunking)
    #[arg(short, long, value_name = "PATH", env = "REPO2TXT_OUTPUT")]
    output: Option<PathBuf>,

    /// Directory names to exclude (replaces the defaults)
    #[arg(long, num_args = 1.., value_name = "DIR")]
    exclude_dirs: Option<Vec<String>>,

    /// File names to exclude (replaces the defaults)
    #[arg(long, num_args = 1.., value_name = "NAME")]
    exclude_files: Option<Vec<String>>,

    /// File with additional ignore patterns, one per line
    #[arg(long, value_name = "FILE", env = "REPO2TXT_IGNORE_FILE")]
    ignore_file: Option<PathBuf>,

    /// Additional glob patterns to ignore
    #[arg(long, num_args = 1.., value_name = "GLOB")]
    ignore_patterns: Vec<String>,

    /// Log every ignored file and directory
    #[arg(long)]
    verbose_ignore: bool,

    /// Maximum file size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE, env = "REPO2TXT_MAX_FILE_SIZE")]
    max_file_size: u64,

    /// Only include files with these extensions
    #[arg(long, num_args = 1.., value_name = "EXT")]
    include_extensions: Vec<String>,

    /// Exclude files with these extensions (replaces the defaults)
    #[arg(long, num_args = 1.., value_name = "EXT")]
    exclude_extensions: Option<Vec<String>>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "compact", env = "REPO2TXT_FORMAT")]
    format: CliFormat,

    /// Include origin URL, branch and last commit at the top of the output
    #[arg(long)]
    include_repo_info: bool,

    /// Split output into chunks of this many bytes (0 disables chunking)
    #[arg(long, default_value_t = 0, value_name = "BYTES", env = "REPO2TXT_CHUNK_SIZE")]
    chunk_size: usize,

    /// Write an example ignore file to this path and exit
    #[arg(long, value_name = "PATH")]
    create_example_ignore: Option<PathBuf>,

    /// Optimization level: 1 whitespace, 2 structure, 3 aggressive
    #[arg(
        short,
        long,
        default_value_t = 2,
        value_parser = clap::value_parser!(u8).range(1..=3),
        env = "REPO2TXT_LEVEL"
    )]
    level: u8,

    /// Keep single-line comments at level 2
    #[arg(long)]
    preserve_comments: bool,

    /// Treat docstrings and doc comments like ordinary comments
    #[arg(long)]
    no_preserve_docstrings: bool,

    /// Disable the built-in ignore patterns
    #[arg(long)]
    no_default_ignores: bool,

    /// Honor .gitignore files in the repository
    #[arg(long, env = "REPO2TXT_RESPECT_GITIGNORE")]
    respect_gitignore: bool,

    /// Include a generation timestamp at the top of the output
    #[arg(long)]
    timestamp: bool,

    /// Dry run (don't write files)
    #[arg(long)]
    dry_run: bool,

    /// Verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum CliFormat {
    Simple,
    Markdown,
    Jsonl,
    Compact,
}

impl From<CliFormat> for OutputFormat {
    fn from(f: CliFormat) -> Self {
        match f {
            CliFormat::Simple => Self::Simple,
            CliFormat::Markdown => Self::Markdown,
            CliFormat::Jsonl => Self::Jsonl,
            CliFormat::Compact => Self::Compact,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_tracing(cli.verbose)?;

    if let Some(path) = &cli.create_example_ignore {
        write_example_ignore_file(path)
            .with_context(|| format!("Failed to write example ignore file {}", path.display()))?;
        println!("Example ignore file created at {}", path.display());
        return Ok(());
    }

    // Keeps the temporary clone alive until the run is over
    let cloned = cli
        .repo
        .as_deref()
        .map(clone_repository)
        .transpose()
        .context("Failed to clone repository")?;

    let root_dir = match (&cloned, &cli.local) {
        (Some(repo), _) => repo.path().to_path_buf(),
        (None, Some(local)) => local.clone(),
        (None, None) => bail!("one of --repo or --local is required"),
    };

    let level = OptimizationLevel::from_number(cli.level)
        .with_context(|| format!("Invalid optimization level {}", cli.level))?;

    let mut builder = Config::builder()
        .root_dir(root_dir)
        .format(cli.format.into())
        .chunk_size(cli.chunk_size)
        .max_file_size(cli.max_file_size)
        .include_extensions(&cli.include_extensions)
        .ignore_patterns(cli.ignore_patterns)
        .use_default_ignores(!cli.no_default_ignores)
        .level(level)
        .preserve_comments(cli.preserve_comments)
        .preserve_docstrings(!cli.no_preserve_docstrings)
        .include_repo_info(cli.include_repo_info)
        .timestamp(cli.timestamp)
        .respect_gitignore(cli.respect_gitignore)
        .verbose_ignore(cli.verbose_ignore)
        .dry_run(cli.dry_run);

    if let Some(output) = cli.output {
        builder = builder.output(output);
    }
    if let Some(dirs) = &cli.exclude_dirs {
        builder = builder.exclude_dirs(dirs);
    }
    if let Some(files) = &cli.exclude_files {
        builder = builder.exclude_files(files);
    }
    if let Some(extensions) = &cli.exclude_extensions {
        builder = builder.exclude_extensions(extensions);
    }
    if let Some(ignore_file) = cli.ignore_file {
        builder = builder.ignore_file(ignore_file);
    }

    let config = builder.build().context("Failed to build configuration")?;

    if let Some(repo) = &cloned {
        info!("Converting {}", repo.url());
    }

    let stats = Pipeline::new(config)
        .context("Failed to create pipeline")?
        .run()
        .context("Pipeline execution failed")?;

    stats.print_summary();

    Ok(())
}

fn setup_tracing(verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity {
        0 => EnvFilter::new("repo2txt=info"),
        1 => EnvFilter::new("repo2txt=debug"),
        _ => EnvFilter::new("repo2txt=trace"),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
