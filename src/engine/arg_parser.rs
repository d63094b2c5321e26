use clap::Parser;
use std::path::PathBuf;

struct DefaultArgs;

impl DefaultArgs {
    pub const PATH: &'static str = ".";
}

/// Concurrent ingestion of person batch files into a SQLite roster.
#[derive(Clone, Parser)]
#[command(name = "roster")]
#[command(
    about = "Import a directory of person batch files (or upload one file); \
             use --dry-run to parse without storing."
)]
pub struct Cli {
    /// Directory of batch files to import, or a single file to upload. Default: current directory.
    #[arg(value_name = "PATH", default_value = DefaultArgs::PATH)]
    pub path: PathBuf,

    /// Path to the roster database. Default: `.roster.db` in the working directory.
    #[arg(long, short)]
    pub db: Option<PathBuf>,

    /// Parse every file and report counts; do not write to the database.
    #[arg(long)]
    pub dry_run: bool,

    /// Parallel parse workers. 0 = one per available thread.
    #[arg(long, short = 'w', value_parser = clap::value_parser!(usize))]
    pub workers: Option<usize>,

    /// Capacity of the source-file queue.
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub work_queue_cap: Option<usize>,

    /// Capacity of the parsed-record queue (backpressure bound).
    #[arg(long, value_parser = clap::value_parser!(usize))]
    pub result_queue_cap: Option<usize>,

    /// File-name pattern for batch files (glob: * and ?).
    #[arg(long, short = 'p')]
    pub pattern: Option<String>,

    /// Verbose output.
    #[arg(
        long,
        short = 'v',
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = clap::value_parser!(bool)
    )]
    pub verbose: Option<bool>,
}
