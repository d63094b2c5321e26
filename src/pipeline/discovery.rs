//! Source discovery: list matching files in the source directory, then feed them to the work queue
//! from a dedicated thread so workers drain it concurrently.

use crossbeam_channel::{Sender, select};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use walkdir::WalkDir;

use crate::SourceFile;
use crate::engine::tools::glob_match;
use crate::error::PipelineError;

use super::context::CancelSignal;

/// One result from listing the source directory: a candidate file or an error with optional path.
pub enum ListOutcome {
    Ok(PathBuf),
    Err { msg: String, path: Option<PathBuf> },
}

/// Convert a walkdir result into [`ListOutcome`]. Non-files are dropped by the caller.
pub fn to_outcome_walkdir(r: Result<walkdir::DirEntry, walkdir::Error>) -> Option<ListOutcome> {
    match r {
        Ok(entry) if entry.file_type().is_file() => Some(ListOutcome::Ok(entry.into_path())),
        Ok(_) => None,
        Err(err) => Some(ListOutcome::Err {
            msg: format!("{}", err),
            path: err.path().map(PathBuf::from),
        }),
    }
}

fn discovery_error(dir: &Path, reason: impl Into<String>) -> PipelineError {
    PipelineError::Discovery {
        path: dir.to_path_buf(),
        reason: reason.into(),
    }
}

/// List files directly under `dir` whose name matches `pattern`, sorted by file name.
///
/// Runs synchronously before any worker exists: a missing or unreadable directory (or any listing
/// error) is a [`PipelineError::Discovery`] and no session is created.
pub fn discover_sources(dir: &Path, pattern: &str) -> Result<Vec<SourceFile>, PipelineError> {
    let meta = std::fs::metadata(dir).map_err(|e| discovery_error(dir, e.to_string()))?;
    if !meta.is_dir() {
        return Err(discovery_error(dir, "not a directory"));
    }

    let mut sources = Vec::new();
    let outcomes = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(to_outcome_walkdir);
    for outcome in outcomes {
        match outcome {
            ListOutcome::Ok(path) => {
                let matches = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|name| glob_match(pattern, name));
                if matches {
                    sources.push(SourceFile::new(path));
                }
            }
            ListOutcome::Err { msg, path } => {
                let reason = match path {
                    Some(p) => format!("{} (path: {})", msg, p.display()),
                    None => msg,
                };
                return Err(discovery_error(dir, reason));
            }
        }
    }
    log::debug!(
        "Discovered {} source files matching {:?} in {}",
        sources.len(),
        pattern,
        dir.display()
    );
    Ok(sources)
}

/// Feed discovered sources into the work queue. Blocks while the queue is full (workers are already
/// draining it); stops early on cancellation. Drops `work_tx` when done so workers see the queue
/// close. Returns the number of sources handed off.
pub fn run_feed_loop(
    sources: Vec<SourceFile>,
    work_tx: Sender<SourceFile>,
    cancel: CancelSignal,
) -> usize {
    let mut count = 0_usize;
    for source in sources {
        if cancel.is_cancelled() {
            break;
        }
        select! {
            send(work_tx, source) -> res => {
                if res.is_err() {
                    break;
                }
                count += 1;
            }
            recv(cancel.rx) -> _ => break,
        }
    }
    drop(work_tx);
    count
}

pub fn spawn_feed_thread(
    sources: Vec<SourceFile>,
    work_tx: Sender<SourceFile>,
    cancel: CancelSignal,
) -> std::io::Result<JoinHandle<usize>> {
    thread::Builder::new()
        .name(format!("{}-feed", env!("CARGO_PKG_NAME")))
        .spawn(move || run_feed_loop(sources, work_tx, cancel))
}
