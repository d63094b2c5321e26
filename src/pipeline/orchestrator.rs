use anyhow::Result;
use log::debug;
use std::path::Path;
use std::thread::JoinHandle;

use crate::IngestOpts;
use crate::error::{FileError, PipelineError};
use crate::pipeline;
use crate::record::Person;

use super::stream::{RecordStream, StreamParts};
use super::worker::WorkerShared;

/// Threads owned by one session: the discovery feeder and the parse workers.
pub struct SessionThreads {
    pub feed_handle: JoinHandle<usize>,
    pub worker_handles: Vec<JoinHandle<()>>,
}

/// Start a pipeline session over `dir`. Returns the record stream that owns the session.
///
/// Discovery runs first and synchronously; if it fails nothing is spawned. Workers then start
/// before the feeder so a work queue smaller than the file count never blocks the hand-off.
pub fn run_pipeline(dir: &Path, opts: &IngestOpts) -> Result<RecordStream, PipelineError> {
    let sources = pipeline::discover_sources(dir, &opts.pattern)?;
    let discovered = sources.len();
    let tuning = pipeline::PipelineTuning::from(opts);
    debug!(
        "Pipeline: {} workers, work queue {}, result queue {}",
        tuning.num_workers, tuning.work_queue_cap, tuning.result_queue_cap
    );

    let channels = pipeline::create_pipeline_channels(&tuning, discovered);
    let shared = WorkerShared {
        work_rx: channels.work_rx,
        result_tx: channels.result_tx,
        error_tx: channels.error_tx,
        active_workers: channels.active_workers.clone(),
        pending_sources: channels.pending_sources.clone(),
        cancel: channels.cancel_signal.clone(),
    };

    let (worker_handles, spawn_err) = pipeline::spawn_parse_workers(&shared, tuning.num_workers);
    // Dropping the last copies here: the result channel closes when every worker exits, and the
    // work channel closes for the feeder if every worker is gone.
    drop(shared);

    let feed = match spawn_err {
        Some(e) => Err(e),
        None => pipeline::spawn_feed_thread(
            sources,
            channels.work_tx,
            channels.cancel_signal.clone(),
        ),
    };
    let feed_handle = match feed {
        Ok(h) => h,
        Err(e) => {
            channels.cancel.cancel();
            for h in worker_handles {
                let _ = h.join();
            }
            return Err(PipelineError::WorkerSpawn(e));
        }
    };

    Ok(RecordStream::new(StreamParts {
        result_rx: channels.result_rx,
        error_rx: channels.error_rx,
        active_workers: channels.active_workers,
        pending_sources: channels.pending_sources,
        cancel: channels.cancel,
        cancel_signal: channels.cancel_signal,
        threads: SessionThreads {
            feed_handle,
            worker_handles,
        },
        discovered,
    }))
}

/// Join the feeder and worker threads. Call after the stream is drained or cancelled.
pub fn shutdown_pipeline_handles(threads: SessionThreads) -> Result<()> {
    let SessionThreads {
        feed_handle,
        worker_handles,
    } = threads;
    let fed = feed_handle
        .join()
        .map_err(|_| anyhow::anyhow!("feed thread panicked"))?;
    let mut panicked = 0_usize;
    for h in worker_handles {
        if h.join().is_err() {
            panicked += 1;
        }
    }
    debug!("pipeline shut down: {} sources fed", fed);
    if panicked > 0 {
        anyhow::bail!("{} parse worker(s) panicked", panicked);
    }
    Ok(())
}

/// Collect every record under `dir` into memory. Returns (records, per-file errors).
/// Dir → work queue → workers (parse) → result queue → Vec.
pub fn collect_records(
    dir: &Path,
    opts: &IngestOpts,
) -> Result<(Vec<Person>, Vec<FileError>), PipelineError> {
    let mut stream = run_pipeline(dir, opts)?;
    let records: Vec<Person> = stream.by_ref().collect();
    let errors = stream.take_file_errors();
    debug!(
        "collected {} records, {} failed files",
        records.len(),
        errors.len()
    );
    Ok((records, errors))
}
