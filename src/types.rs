//! Public and internal types for the roster API and pipeline.

use std::path::PathBuf;

use crate::error::FileError;
use crate::utils::config::PipelineConsts;

/// One input batch file discovered in the source directory. Consumed by exactly one worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
}

impl SourceFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

/// Lib options for [`ingest_dir`](crate::ingest_dir). One pipeline session is sized from these.
#[derive(Clone, Debug)]
pub struct IngestOpts {
    /// Parallel parse workers. 0 = one per available thread (rayon's count).
    pub workers: usize,
    /// Source-file queue capacity (discovery -> workers).
    pub work_queue_cap: usize,
    /// Parsed-record queue capacity (workers -> consumer). The backpressure point.
    pub result_queue_cap: usize,
    /// File-name glob matched during discovery (`*` and `?`).
    pub pattern: String,
}

impl Default for IngestOpts {
    fn default() -> Self {
        Self {
            workers: PipelineConsts::WORKER_COUNT,
            work_queue_cap: PipelineConsts::WORK_QUEUE_CAP,
            result_queue_cap: PipelineConsts::RESULT_QUEUE_CAP,
            pattern: PipelineConsts::SOURCE_PATTERN.to_string(),
        }
    }
}

impl IngestOpts {
    /// Worker count with 0 resolved to the available thread count.
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            0 => rayon::current_num_threads().max(1),
            n => n,
        }
    }
}

/// Full options (CLI). Use [`IngestOpts`] for lib.
#[derive(Clone, Debug, Default)]
pub struct Opts {
    pub ingest: IngestOpts,
    /// SQLite database path. When None, uses `.roster.db` in the working directory.
    pub db_path: Option<PathBuf>,
    /// Debug logging and a progress counter.
    pub verbose: bool,
    /// Parse only; report record count and file errors, persist nothing.
    pub dry_run: bool,
}

/// Lifecycle of a pipeline session as seen by the consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamState {
    /// Source files still waiting for a worker.
    Running,
    /// Work queue empty; some workers still flushing records, or records still queued.
    Draining,
    /// All workers finished and the result queue is empty. Never left once entered.
    Terminal,
}

/// Outcome of a bulk import.
#[derive(Debug, Default)]
pub struct ImportSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Files that produced no records, with the reason.
    pub file_errors: Vec<FileError>,
    /// True when the run was cancelled before the stream was exhausted.
    pub cancelled: bool,
}

/// Response of the single-file upload entry point.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadResponse {
    pub succeeded: usize,
    pub failed: usize,
}

impl From<&ImportSummary> for UploadResponse {
    fn from(s: &ImportSummary) -> Self {
        UploadResponse {
            succeeded: s.succeeded,
            failed: s.failed,
        }
    }
}
