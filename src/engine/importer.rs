//! Bulk import: drain a record stream into a [`PersonStore`], counting successes and rejections.

use anyhow::{Context, Result};
use log::{debug, info, warn};
use std::path::Path;

use crate::engine::db_ops::PersonStore;
use crate::engine::progress::BatchedProgress;
use crate::error::PipelineError;
use crate::pipeline::{RecordStream, run_pipeline};
use crate::utils::config::PROGRESS_UPDATE_BATCH_SIZE;
use crate::utils::stage_upload;
use crate::{ImportSummary, IngestOpts, UploadResponse};

/// Persist every record the stream yields. A rejected record is counted and skipped; the
/// import never aborts on one. Stops early (with `cancelled` set) if the session is cancelled.
pub fn import_stream<S: PersonStore + ?Sized>(
    stream: &mut RecordStream,
    store: &mut S,
    on_progress: Option<&(dyn Fn(usize) + Send)>,
) -> ImportSummary {
    let mut summary = ImportSummary::default();
    let mut progress = BatchedProgress::new(on_progress, PROGRESS_UPDATE_BATCH_SIZE);

    loop {
        if stream.is_cancelled() {
            summary.cancelled = true;
            break;
        }
        let person = match stream.next_record() {
            Ok(Some(p)) => p,
            Ok(None) | Err(PipelineError::NoMoreElements) => break,
            Err(PipelineError::QueueInterrupted) => {
                summary.cancelled = true;
                break;
            }
            Err(e) => {
                warn!("{}", e);
                break;
            }
        };
        match store.persist(&person) {
            Ok(id) => {
                summary.succeeded += 1;
                debug!("stored {} ({}) as #{}", person.name, person.birthday_label(), id);
            }
            Err(e) => {
                summary.failed += 1;
                debug!("rejected {} ({}): {}", person.name, person.birthday_label(), e);
            }
        }
        progress.tick();
    }
    progress.flush();

    if summary.cancelled {
        stream.close();
    }
    summary.file_errors = stream.take_file_errors();
    info!(
        "Import finished: {} stored, {} rejected, {} files skipped{}",
        summary.succeeded,
        summary.failed,
        summary.file_errors.len(),
        if summary.cancelled { " (cancelled)" } else { "" }
    );
    summary
}

/// Ingest every matching file in `dir` and persist the records into `store`, reporting
/// processed-record counts to `on_progress`.
pub fn import_dir_with_progress<S: PersonStore + ?Sized>(
    dir: &Path,
    store: &mut S,
    opts: &IngestOpts,
    on_progress: Option<&(dyn Fn(usize) + Send)>,
) -> Result<ImportSummary> {
    let mut stream = run_pipeline(dir, opts)?;
    debug!("Importing {} source files from {}", stream.discovered(), dir.display());
    Ok(import_stream(&mut stream, store, on_progress))
}

/// Import a single uploaded file: stage it alone in a fresh temp directory, import that
/// directory, and remove the staging directory whatever the outcome.
pub fn upload_file<S: PersonStore + ?Sized>(
    file: &Path,
    store: &mut S,
    opts: &IngestOpts,
) -> Result<UploadResponse> {
    let staged = stage_upload(file).context("stage upload")?;
    let imported = import_dir_with_progress(staged.dir(), store, opts, None);
    if let Err(e) = staged.cleanup() {
        warn!("Failed to remove staging directory: {}", e);
    }
    let summary = imported?;
    Ok(UploadResponse::from(&summary))
}
