//! Error types for roster.
//!
//! Three layers, matching how far an error is allowed to travel:
//! - [`PipelineError`]: session-level. Discovery failures are fatal, raised before workers start.
//! - [`FileParseError`]: one source file could not be read or decoded. Reported as a [`FileError`]
//!   event on the session's error channel; sibling files keep flowing.
//! - [`PersistError`]: one record was rejected by the store. Counted by the import consumer.

use std::path::PathBuf;
use thiserror::Error;

/// Session-level errors from the ingestion pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The source directory could not be listed. No worker was started.
    #[error("cannot list source directory {}: {reason}", path.display())]
    Discovery { path: PathBuf, reason: String },

    /// A worker or feeder thread could not be spawned.
    #[error("failed to spawn pipeline thread: {0}")]
    WorkerSpawn(#[from] std::io::Error),

    /// `next_record` was called after the stream reached its terminal state.
    #[error("no more elements left")]
    NoMoreElements,

    /// A blocked queue operation was aborted by cancellation.
    #[error("queue operation interrupted by cancellation")]
    QueueInterrupted,
}

/// Why a single source file produced no records.
#[derive(Error, Debug)]
pub enum FileParseError {
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode failed: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Per-file failure event emitted by a worker.
#[derive(Error, Debug)]
#[error("error parsing file {}: {error}", path.display())]
pub struct FileError {
    pub path: PathBuf,
    #[source]
    pub error: FileParseError,
}

/// Why the store refused one record.
#[derive(Error, Debug)]
pub enum PersistError {
    /// Natural key (name + birthday) already present.
    #[error("person list already contains name and birthday: {name} {birthday}")]
    Duplicate { name: String, birthday: String },

    /// Record failed field validation; holds every violation found.
    #[error("incorrect person data: [{}]", .0.join(","))]
    Invalid(Vec<String>),

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),
}
