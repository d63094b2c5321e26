use crossbeam_channel::{Receiver, Sender, select};
use log::{debug, warn};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};

use crate::SourceFile;
use crate::error::{FileError, FileParseError, PipelineError};
use crate::record::Person;

use super::context::{ActiveWorkerGuard, CancelSignal};

/// Decode one source file fully. All-or-nothing: any read or decode error fails the whole file.
pub fn parse_file(path: &Path) -> Result<Vec<Person>, FileParseError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

/// Push a decoded batch onto the result queue in file order. Blocks while the queue is full
/// (backpressure). Returns [`PipelineError::QueueInterrupted`] if cancelled mid-batch.
fn emit_batch(
    batch: Vec<Person>,
    result_tx: &Sender<Person>,
    cancel: &CancelSignal,
) -> Result<usize, PipelineError> {
    let mut sent = 0_usize;
    for person in batch {
        select! {
            send(result_tx, person) -> res => {
                // Consumer gone: nobody will read the rest.
                if res.is_err() {
                    return Err(PipelineError::QueueInterrupted);
                }
                sent += 1;
            }
            recv(cancel.rx) -> _ => return Err(PipelineError::QueueInterrupted),
        }
    }
    Ok(sent)
}

/// Everything one worker needs. Cloned per worker.
#[derive(Clone)]
pub struct WorkerShared {
    pub work_rx: Receiver<SourceFile>,
    pub result_tx: Sender<Person>,
    pub error_tx: Sender<FileError>,
    pub active_workers: Arc<AtomicUsize>,
    pub pending_sources: Arc<AtomicUsize>,
    pub cancel: CancelSignal,
}

/// Single parse worker: take sources until the work queue closes, decode each file, and emit its
/// records. A failed file is reported on the error channel and the worker moves on.
///
/// The active-worker guard is a local, so it drops (decrementing the counter) before the
/// `shared` argument and its `result_tx`: by the time the result channel can disconnect, the
/// counter already reflects this worker's exit.
fn parse_worker_loop(worker_id: usize, shared: WorkerShared) {
    let _active = ActiveWorkerGuard::new(Arc::clone(&shared.active_workers));
    let mut files = 0_usize;
    let mut records = 0_usize;
    loop {
        if shared.cancel.is_cancelled() {
            break;
        }
        let source = select! {
            recv(shared.work_rx) -> msg => match msg {
                Ok(source) => source,
                Err(_) => break,
            },
            recv(shared.cancel.rx) -> _ => break,
        };
        shared.pending_sources.fetch_sub(1, Ordering::SeqCst);
        match parse_file(&source.path) {
            Ok(batch) => match emit_batch(batch, &shared.result_tx, &shared.cancel) {
                Ok(n) => {
                    files += 1;
                    records += n;
                }
                Err(e) => {
                    debug!("worker {}: {} ({})", worker_id, e, source.path.display());
                    break;
                }
            },
            Err(error) => {
                warn!("Error parsing file {}: {}", source.path.display(), error);
                let report = FileError {
                    path: source.path,
                    error,
                };
                if let Err(lost) = shared.error_tx.send(report) {
                    debug!(
                        "worker {}: error report for {} dropped, stream is gone",
                        worker_id,
                        lost.0.path.display()
                    );
                }
            }
        }
    }
    debug!(
        "worker {}: exiting after {} files, {} records",
        worker_id, files, records
    );
}

/// Spawn `num_workers` parse workers. On a spawn failure, the slots of workers that never started
/// are released from the active counter and the started ones are returned with the error for the
/// caller to cancel and join.
pub fn spawn_parse_workers(
    shared: &WorkerShared,
    num_workers: usize,
) -> (Vec<JoinHandle<()>>, Option<std::io::Error>) {
    let mut handles = Vec::with_capacity(num_workers);
    for worker_id in 0..num_workers {
        let worker_shared = shared.clone();
        let spawned = thread::Builder::new()
            .name(format!("{}-worker-{}", env!("CARGO_PKG_NAME"), worker_id))
            .spawn(move || parse_worker_loop(worker_id, worker_shared));
        match spawned {
            Ok(h) => handles.push(h),
            Err(e) => {
                shared
                    .active_workers
                    .fetch_sub(num_workers - worker_id, Ordering::SeqCst);
                return (handles, Some(e));
            }
        }
    }
    (handles, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const ONE: &str = r#"[{"name":"Ann Lee","birthday":"1990-01-01","sex":"FEMALE",
        "eyeColor":"BLUE","hairColor":"BROWN","weight":60,"height":170,
        "countryOfOrigin":{"name":"USA","continent":"NORTH_AMERICA","capital":"Washington",
            "population":334914895,"square":8080470},
        "citizenship":{"name":"USA","continent":"NORTH_AMERICA","capital":"Washington",
            "population":334914895,"square":8080470},
        "favoriteMeals":"apple,pear"}]"#;

    #[test]
    fn parse_file_decodes_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        fs::write(&path, ONE).unwrap();
        let batch = parse_file(&path).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].name, "Ann Lee");
    }

    #[test]
    fn parse_file_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.json");
        // Valid first element, truncated second.
        let truncated = format!("{},{{\"name\":\"Bob", &ONE[..ONE.len() - 1]);
        fs::write(&path, truncated).unwrap();
        assert!(matches!(parse_file(&path), Err(FileParseError::Decode(_))));
    }

    #[test]
    fn worker_keeps_going_when_error_receiver_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("a.json");
        let good = dir.path().join("b.json");
        fs::write(&bad, "[{").unwrap();
        fs::write(&good, ONE).unwrap();

        let (work_tx, work_rx) = crossbeam_channel::bounded(2);
        let (result_tx, result_rx) = crossbeam_channel::bounded(4);
        let (error_tx, error_rx) = crossbeam_channel::unbounded();
        drop(error_rx);
        let (_cancel, cancel_signal) = crate::pipeline::context::CancelHandle::pair();
        let shared = WorkerShared {
            work_rx,
            result_tx,
            error_tx,
            active_workers: Arc::new(AtomicUsize::new(1)),
            pending_sources: Arc::new(AtomicUsize::new(2)),
            cancel: cancel_signal,
        };
        let active = Arc::clone(&shared.active_workers);
        work_tx.send(SourceFile::new(bad)).unwrap();
        work_tx.send(SourceFile::new(good)).unwrap();
        drop(work_tx);

        parse_worker_loop(0, shared);
        let names: Vec<String> = result_rx.try_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Ann Lee".to_string()]);
        assert_eq!(active.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn parse_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            parse_file(&dir.path().join("gone.json")),
            Err(FileParseError::Io(_))
        ));
    }
}
