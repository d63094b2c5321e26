//! Pipeline context: session tuning, the channel set, the active-worker counter and cancellation.

use crossbeam_channel::{Receiver, Sender, bounded, unbounded};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::FileError;
use crate::record::Person;
use crate::{IngestOpts, SourceFile};

/// Sizing for one session, resolved from [`IngestOpts`]. Zero capacities are raised to 1.
#[derive(Clone, Debug)]
pub struct PipelineTuning {
    pub num_workers: usize,
    pub work_queue_cap: usize,
    pub result_queue_cap: usize,
}

impl From<&IngestOpts> for PipelineTuning {
    fn from(o: &IngestOpts) -> Self {
        PipelineTuning {
            num_workers: o.effective_workers(),
            work_queue_cap: o.work_queue_cap.max(1),
            result_queue_cap: o.result_queue_cap.max(1),
        }
    }
}

/// Cooperative cancellation for one session.
///
/// Cancelling sets a flag and disconnects the cancel channel, which wakes every thread blocked in a
/// `select!` on a queue (feeder send, worker recv/send, consumer recv). Cloneable; safe to call
/// from a signal handler thread.
#[derive(Clone)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
    trigger: Arc<Mutex<Option<Sender<()>>>>,
}

/// Receiving side of a [`CancelHandle`], held by pipeline threads.
#[derive(Clone)]
pub struct CancelSignal {
    flag: Arc<AtomicBool>,
    pub rx: Receiver<()>,
}

impl CancelHandle {
    pub fn pair() -> (CancelHandle, CancelSignal) {
        // Nothing is ever sent; the channel only ever becomes ready by disconnecting.
        let (tx, rx) = bounded::<()>(0);
        let flag = Arc::new(AtomicBool::new(false));
        (
            CancelHandle {
                flag: Arc::clone(&flag),
                trigger: Arc::new(Mutex::new(Some(tx))),
            },
            CancelSignal { flag, rx },
        )
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
        if let Ok(mut trigger) = self.trigger.lock() {
            trigger.take();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Decrements the active-worker counter exactly once, when the worker's scope ends (normal exit,
/// interruption or panic).
pub struct ActiveWorkerGuard {
    active: Arc<AtomicUsize>,
}

impl ActiveWorkerGuard {
    pub fn new(active: Arc<AtomicUsize>) -> Self {
        Self { active }
    }
}

impl Drop for ActiveWorkerGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Channels and shared state for one session. The feeder gets `work_tx`; workers get `work_rx`,
/// `result_tx`, `error_tx`; the stream keeps `result_rx` and `error_rx`.
pub struct PipelineChannels {
    pub work_tx: Sender<SourceFile>,
    pub work_rx: Receiver<SourceFile>,
    pub result_tx: Sender<Person>,
    pub result_rx: Receiver<Person>,
    pub error_tx: Sender<FileError>,
    pub error_rx: Receiver<FileError>,
    /// Workers still running. Starts at the pool size; never incremented.
    pub active_workers: Arc<AtomicUsize>,
    /// Discovered sources not yet taken by a worker.
    pub pending_sources: Arc<AtomicUsize>,
    pub cancel: CancelHandle,
    pub cancel_signal: CancelSignal,
}

pub fn create_pipeline_channels(tuning: &PipelineTuning, discovered: usize) -> PipelineChannels {
    let (work_tx, work_rx) = bounded::<SourceFile>(tuning.work_queue_cap);
    let (result_tx, result_rx) = bounded::<Person>(tuning.result_queue_cap);
    // Unbounded: reporting a bad file must never block a worker.
    let (error_tx, error_rx) = unbounded::<FileError>();
    let (cancel, cancel_signal) = CancelHandle::pair();

    PipelineChannels {
        work_tx,
        work_rx,
        result_tx,
        result_rx,
        error_tx,
        error_rx,
        active_workers: Arc::new(AtomicUsize::new(tuning.num_workers)),
        pending_sources: Arc::new(AtomicUsize::new(discovered)),
        cancel,
        cancel_signal,
    }
}
