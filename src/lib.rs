//! Roster: concurrent ingestion of person batch files.
//!
//! A directory of JSON batch files is parsed by a bounded pool of workers and exposed as a
//! single lazy [`RecordStream`]. Per-file failures are isolated; the stream ends once every
//! worker has finished and every record has been consumed.

pub mod engine;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use engine::db_ops::{PersonStore, SqliteStore};
pub use engine::importer::{import_stream, upload_file};
pub use error::{FileError, FileParseError, PersistError, PipelineError};
pub use pipeline::{CancelHandle, RecordStream};
pub use record::{Color, Continent, Country, Person, Sex};

use log::debug;
use std::path::Path;

/// Result alias used by public roster API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Start ingesting `dir` and return the record stream.
///
/// Discovery runs before this returns: an unreadable or missing directory is an immediate
/// [`PipelineError::Discovery`] and no worker is started. Files that fail to parse do not
/// stop the stream; read them from [`RecordStream::file_errors`] once it is exhausted.
///
/// ```ignore
/// let mut stream = roster::ingest_dir(Path::new("batches"), &IngestOpts::default())?;
/// while let Some(person) = stream.next_record()? {
///     println!("{}", person.name);
/// }
/// ```
pub fn ingest_dir(
    dir: &Path,
    opts: &IngestOpts,
) -> std::result::Result<RecordStream, PipelineError> {
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        opts
    );
    pipeline::run_pipeline(dir, opts)
}

/// Ingest `dir` and persist every record into `store`. Rejected records are counted, not fatal.
pub fn import_dir<S: PersonStore + ?Sized>(
    dir: &Path,
    store: &mut S,
    opts: &IngestOpts,
) -> Result<ImportSummary> {
    engine::importer::import_dir_with_progress(dir, store, opts, None)
}
