//! Progress counter for imports (record totals are unknown up front)

use kdam::{Animation, Bar, BarExt};
use std::sync::{Arc, Mutex};

// Progress bar type alias
pub type ProgressBar = Arc<Mutex<Bar>>;

/// Create a counter for unknown total (shows count without percentage)
pub fn create_counter(desc: &'static str) -> ProgressBar {
    Arc::new(Mutex::new(kdam::tqdm!(
        total = 0,
        desc = desc,
        animation = Animation::Classic,
        position = 0,
        unit = " records"
    )))
}

/// Force a refresh of the bar (e.g. so counter shows "0 records" immediately).
pub fn refresh_bar(pb: &ProgressBar) {
    if let Ok(mut bar) = pb.try_lock() {
        let _ = bar.refresh();
    }
}

/// Update progress bar if available
/// Uses try_lock to avoid blocking if mutex is contended (non-blocking)
pub fn update_progress_bar(pb: &ProgressBar, n: usize) {
    if let Ok(mut pb) = pb.try_lock() {
        let _ = pb.update(n);
    }
}

/// Create a progress callback function that updates the progress bar.
pub fn progress_callback(bar: &Option<ProgressBar>) -> Option<Box<dyn Fn(usize) + Send>> {
    bar.as_ref().map(|bar| {
        let bar = Arc::clone(bar);
        Box::new(move |n: usize| update_progress_bar(&bar, n)) as Box<dyn Fn(usize) + Send>
    })
}

/// Tracks processed records and reports to a callback every `chunk_size` items.
pub struct BatchedProgress<'a> {
    on_progress: Option<&'a (dyn Fn(usize) + Send)>,
    chunk_size: usize,
    pending: usize,
}

impl<'a> BatchedProgress<'a> {
    pub fn new(on_progress: Option<&'a (dyn Fn(usize) + Send)>, chunk_size: usize) -> Self {
        Self {
            on_progress,
            chunk_size: chunk_size.max(1),
            pending: 0,
        }
    }

    /// Count one record; fires the callback when a full chunk is reached.
    pub fn tick(&mut self) {
        self.pending += 1;
        if self.pending >= self.chunk_size {
            self.flush();
        }
    }

    /// Report the remainder. Call once after the loop.
    pub fn flush(&mut self) {
        if self.pending > 0 {
            if let Some(cb) = self.on_progress {
                cb(self.pending);
            }
            self.pending = 0;
        }
    }
}
