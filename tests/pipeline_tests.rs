//! Pipeline tests: totals, per-file order, isolation, termination, backpressure, cancellation.

mod common;

use common::{batch, write_batch, write_batches, write_truncated};
use roster::pipeline::collect_records;
use roster::{FileParseError, IngestOpts, PipelineError, StreamState, ingest_dir};
use std::collections::HashMap;
use std::time::Duration;

fn opts(workers: usize) -> IngestOpts {
    IngestOpts {
        workers,
        ..Default::default()
    }
}

// --- totals / ordering ---

#[test]
fn test_total_is_independent_of_worker_count() {
    let dir = tempfile::tempdir().unwrap();
    write_batches(dir.path(), 7, 13);
    for workers in [1, 2, 8] {
        let (records, errors) = collect_records(dir.path(), &opts(workers)).unwrap();
        assert_eq!(records.len(), 7 * 13, "workers = {workers}");
        assert!(errors.is_empty());
    }
}

#[test]
fn test_records_keep_file_order() {
    let dir = tempfile::tempdir().unwrap();
    write_batches(dir.path(), 5, 40);
    let (records, _) = collect_records(dir.path(), &opts(4)).unwrap();

    // Names are "fNN-IIII": IIII must strictly increase within each file.
    let mut last: HashMap<String, i64> = HashMap::new();
    for p in &records {
        let (file, idx) = p.name.split_once('-').unwrap();
        let idx: i64 = idx.parse().unwrap();
        let prev = last.insert(file.to_string(), idx).unwrap_or(-1);
        assert!(idx > prev, "{} arrived after index {}", p.name, prev);
    }
    assert_eq!(last.len(), 5);
}

#[test]
fn test_non_matching_files_are_ignored() {
    let dir = tempfile::tempdir().unwrap();
    write_batch(dir.path(), "people.json", &batch("a", 3));
    write_batch(dir.path(), "people.json.bak", &batch("b", 3));
    write_batch(dir.path(), "people.txt", &batch("c", 3));
    let (records, _) = collect_records(dir.path(), &opts(2)).unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|p| p.name.starts_with("a-")));
}

// --- failure isolation ---

#[test]
fn test_malformed_file_does_not_stop_siblings() {
    let dir = tempfile::tempdir().unwrap();
    write_batch(dir.path(), "a.json", &batch("good", 3));
    let bad = write_truncated(dir.path(), "b.json");

    let mut stream = ingest_dir(dir.path(), &opts(2)).unwrap();
    let records: Vec<_> = stream.by_ref().collect();
    assert_eq!(records.len(), 3);

    let errors = stream.take_file_errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, bad);
    assert!(matches!(errors[0].error, FileParseError::Decode(_)));
}

#[test]
fn test_unknown_enum_value_fails_whole_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut json = serde_json::to_string(&batch("x", 3)).unwrap();
    json = json.replacen("\"BROWN\"", "\"PURPLE\"", 1);
    std::fs::write(dir.path().join("a.json"), json).unwrap();
    write_batch(dir.path(), "b.json", &batch("y", 2));

    let (records, errors) = collect_records(dir.path(), &opts(1)).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_missing_directory_is_discovery_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ingest_dir(&dir.path().join("absent"), &opts(2)).unwrap_err();
    assert!(matches!(err, PipelineError::Discovery { .. }), "{err}");
}

#[test]
fn test_stream_debug_shows_progress() {
    let dir = tempfile::tempdir().unwrap();
    write_batches(dir.path(), 2, 3);
    let mut stream = ingest_dir(dir.path(), &opts(2)).unwrap();
    assert_eq!(stream.by_ref().count(), 6);
    stream.close();
    let shown = format!("{stream:?}");
    assert!(shown.starts_with("RecordStream"), "{shown}");
    assert!(shown.contains("discovered: 2"), "{shown}");
    assert!(shown.contains("delivered: 6"), "{shown}");
    assert!(shown.contains("closed: true"), "{shown}");
}

#[test]
fn test_absent_attributes_do_not_fail_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let mut records = serde_json::to_value(batch("gap", 3)).unwrap();
    records[1].as_object_mut().unwrap().remove("weight");
    records[2].as_object_mut().unwrap().remove("sex");
    std::fs::write(dir.path().join("gaps.json"), records.to_string()).unwrap();

    let (records, errors) = collect_records(dir.path(), &opts(1)).unwrap();
    assert!(errors.is_empty());
    assert_eq!(records.len(), 3);
    assert_eq!(records[1].weight, None);
    assert_eq!(records[2].sex, None);
}

// --- termination ---

#[test]
fn test_exhausted_stream_is_terminal() {
    let dir = tempfile::tempdir().unwrap();
    write_batches(dir.path(), 3, 4);
    let mut stream = ingest_dir(dir.path(), &opts(3)).unwrap();

    let mut n = 0;
    while let Ok(Some(_)) = stream.next_record() {
        n += 1;
    }
    assert_eq!(n, 12);
    assert_eq!(stream.delivered(), 12);
    assert!(!stream.has_more());
    assert_eq!(stream.state(), StreamState::Terminal);
    assert!(matches!(
        stream.next_record(),
        Err(PipelineError::NoMoreElements)
    ));
    assert!(stream.next().is_none());
}

#[test]
fn test_empty_directory_terminates() {
    let dir = tempfile::tempdir().unwrap();
    let mut stream = ingest_dir(dir.path(), &opts(4)).unwrap();
    assert_eq!(stream.discovered(), 0);
    assert_eq!(stream.by_ref().count(), 0);
    assert!(!stream.has_more());
    assert!(matches!(
        stream.next_record(),
        Err(PipelineError::NoMoreElements)
    ));
}

#[test]
fn test_more_files_than_work_queue_capacity() {
    let dir = tempfile::tempdir().unwrap();
    write_batches(dir.path(), 25, 2);
    let opts = IngestOpts {
        workers: 2,
        work_queue_cap: 1,
        ..Default::default()
    };
    let (records, errors) = collect_records(dir.path(), &opts).unwrap();
    assert_eq!(records.len(), 50);
    assert!(errors.is_empty());
}

// --- backpressure ---

#[test]
fn test_result_queue_is_bounded() {
    let dir = tempfile::tempdir().unwrap();
    write_batches(dir.path(), 3, 40);
    let opts = IngestOpts {
        workers: 3,
        result_queue_cap: 2,
        ..Default::default()
    };
    let mut stream = ingest_dir(dir.path(), &opts).unwrap();

    let mut n = 0;
    while let Ok(Some(_)) = stream.next_record() {
        if n % 20 == 0 {
            // Give workers time to fill the queue as far as they can.
            std::thread::sleep(Duration::from_millis(20));
            assert!(stream.queued() <= 2, "queued {}", stream.queued());
        }
        n += 1;
    }
    assert_eq!(n, 120);
}

// --- early abandonment / cancellation ---

#[test]
fn test_dropping_stream_early_does_not_hang() {
    let dir = tempfile::tempdir().unwrap();
    write_batches(dir.path(), 8, 200);
    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    let path = dir.path().to_path_buf();
    std::thread::spawn(move || {
        let opts = IngestOpts {
            workers: 4,
            work_queue_cap: 1,
            result_queue_cap: 1,
            ..Default::default()
        };
        let mut stream = ingest_dir(&path, &opts).unwrap();
        let first = stream.next_record().unwrap();
        assert!(first.is_some());
        drop(stream);
        done_tx.send(()).unwrap();
    });
    done_rx
        .recv_timeout(Duration::from_secs(10))
        .expect("dropping a partly consumed stream should join all threads");
}

#[test]
fn test_cancel_stops_session() {
    let dir = tempfile::tempdir().unwrap();
    write_batches(dir.path(), 6, 200);
    let opts = IngestOpts {
        workers: 2,
        result_queue_cap: 1,
        ..Default::default()
    };
    let mut stream = ingest_dir(dir.path(), &opts).unwrap();
    assert!(stream.next_record().unwrap().is_some());

    stream.cancel_handle().cancel();
    assert!(stream.is_cancelled());
    let end = loop {
        match stream.next_record() {
            Ok(Some(_)) => continue,
            other => break other,
        }
    };
    assert!(matches!(
        end,
        Ok(None) | Err(PipelineError::QueueInterrupted) | Err(PipelineError::NoMoreElements)
    ));
    assert!(stream.delivered() < 1200);

    stream.close();
    assert!(!stream.has_more());
    assert_eq!(stream.state(), StreamState::Terminal);
}
