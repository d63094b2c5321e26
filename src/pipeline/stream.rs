//! The consumer side of a pipeline session: a single-pass, pull-based sequence of records.

use crossbeam_channel::{Receiver, select};
use log::debug;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::StreamState;
use crate::error::{FileError, PipelineError};
use crate::record::Person;

use super::context::{CancelHandle, CancelSignal};
use super::orchestrator::{SessionThreads, shutdown_pipeline_handles};

/// Lazy sequence of parsed records from one directory ingestion.
///
/// Owns the whole session (queues, counter, feeder and worker threads). Dropping it, or calling
/// [`close`](Self::close), cancels outstanding work and joins every thread, so abandoning the
/// sequence early never leaves a worker blocked on a full queue.
pub struct RecordStream {
    result_rx: Receiver<Person>,
    error_rx: Receiver<FileError>,
    active_workers: Arc<AtomicUsize>,
    pending_sources: Arc<AtomicUsize>,
    cancel: CancelHandle,
    cancel_signal: CancelSignal,
    threads: Option<SessionThreads>,
    file_errors: Vec<FileError>,
    discovered: usize,
    delivered: usize,
    closed: bool,
}

/// Session pieces the stream takes ownership of. Built in [`run_pipeline`](super::run_pipeline).
pub(crate) struct StreamParts {
    pub result_rx: Receiver<Person>,
    pub error_rx: Receiver<FileError>,
    pub active_workers: Arc<AtomicUsize>,
    pub pending_sources: Arc<AtomicUsize>,
    pub cancel: CancelHandle,
    pub cancel_signal: CancelSignal,
    pub threads: SessionThreads,
    pub discovered: usize,
}

impl RecordStream {
    pub(crate) fn new(parts: StreamParts) -> Self {
        Self {
            result_rx: parts.result_rx,
            error_rx: parts.error_rx,
            active_workers: parts.active_workers,
            pending_sources: parts.pending_sources,
            cancel: parts.cancel,
            cancel_signal: parts.cancel_signal,
            threads: Some(parts.threads),
            file_errors: Vec::new(),
            discovered: parts.discovered,
            delivered: 0,
            closed: false,
        }
    }

    /// True while any worker is still running or records are still queued.
    ///
    /// The counter is read before the queue: a worker decrements only after its last send has
    /// completed, so observing zero guarantees every record it produced is already visible.
    pub fn has_more(&self) -> bool {
        if self.closed {
            return false;
        }
        let active = self.active_workers.load(Ordering::SeqCst);
        active > 0 || !self.result_rx.is_empty()
    }

    /// Current lifecycle state. `Terminal` is permanent.
    pub fn state(&self) -> StreamState {
        if !self.has_more() {
            StreamState::Terminal
        } else if self.pending_sources.load(Ordering::SeqCst) > 0 {
            StreamState::Running
        } else {
            StreamState::Draining
        }
    }

    /// Next record, waiting (without spinning) until one arrives or the session finishes.
    ///
    /// - `Ok(Some(p))`: a record.
    /// - `Ok(None)`: the session became terminal while waiting (end of sequence).
    /// - `Err(NoMoreElements)`: the session was already terminal when called.
    /// - `Err(QueueInterrupted)`: the session was cancelled while waiting.
    pub fn next_record(&mut self) -> Result<Option<Person>, PipelineError> {
        if !self.has_more() {
            return Err(PipelineError::NoMoreElements);
        }
        // All worker senders drop right after their counter decrement, so disconnection is
        // the "last worker finished" wake-up; a record arriving is the other.
        select! {
            recv(self.result_rx) -> msg => match msg {
                Ok(person) => {
                    self.delivered += 1;
                    Ok(Some(person))
                }
                Err(_) => {
                    self.finish();
                    Ok(None)
                }
            },
            recv(self.cancel_signal.rx) -> _ => Err(PipelineError::QueueInterrupted),
        }
    }

    /// Handle for cancelling this session from another thread (e.g. a Ctrl+C handler).
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Files that failed so far. Complete once the stream is exhausted or closed.
    pub fn file_errors(&mut self) -> &[FileError] {
        self.collect_file_errors();
        &self.file_errors
    }

    /// Take ownership of the per-file errors collected so far.
    pub fn take_file_errors(&mut self) -> Vec<FileError> {
        self.collect_file_errors();
        std::mem::take(&mut self.file_errors)
    }

    /// Source files matched by discovery.
    pub fn discovered(&self) -> usize {
        self.discovered
    }

    /// Records handed to the consumer so far.
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Records parsed and waiting in the result queue. Never exceeds its capacity.
    pub fn queued(&self) -> usize {
        self.result_rx.len()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Cancel outstanding work, join every session thread and discard queued records.
    /// The stream is terminal afterwards. Idempotent.
    pub fn close(&mut self) {
        if self.threads.is_some() {
            debug!("closing pipeline session ({} records delivered)", self.delivered);
            self.cancel.cancel();
        }
        self.join_threads();
        self.closed = true;
    }

    fn collect_file_errors(&mut self) {
        self.file_errors.extend(self.error_rx.try_iter());
    }

    /// Natural end: every worker has exited. Join them without cancelling.
    fn finish(&mut self) {
        debug!(
            "pipeline drained: {} records from {} source files",
            self.delivered, self.discovered
        );
        self.join_threads();
    }

    fn join_threads(&mut self) {
        if let Some(threads) = self.threads.take()
            && let Err(e) = shutdown_pipeline_handles(threads)
        {
            log::warn!("{}", e);
        }
        self.collect_file_errors();
    }
}

impl fmt::Debug for RecordStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordStream")
            .field("discovered", &self.discovered)
            .field("delivered", &self.delivered)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Iterator for RecordStream {
    type Item = Person;

    /// Yields records until the session ends or is cancelled.
    fn next(&mut self) -> Option<Person> {
        self.next_record().ok().flatten()
    }
}

impl Drop for RecordStream {
    fn drop(&mut self) {
        self.close();
    }
}
