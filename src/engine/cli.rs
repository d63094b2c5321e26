//! CLI command handler: import a directory (or upload one file); --dry-run parses without storing.

use anyhow::Result;
use log::{debug, warn};
use std::path::{Path, PathBuf};

use crate::engine::arg_parser::Cli;
use crate::engine::db_ops::{SqliteStore, count_persons, open_db};
use crate::engine::importer::import_stream;
use crate::engine::progress::{create_counter, progress_callback, refresh_bar};
use crate::engine::tools::{InputKind, classify_input, resolve_db_path};
use crate::pipeline::{CancelHandle, RecordStream, report_file_errors, run_pipeline};
use crate::utils::roster_toml::{apply_file_to_opts, load_roster_toml};
use crate::utils::{setup_logging, stage_upload};
use crate::{ImportSummary, Opts};

/// Directory whose `.roster.toml` applies: the import dir itself, or the uploaded file's parent.
fn config_dir(path: &Path, kind: InputKind) -> PathBuf {
    match kind {
        InputKind::Directory => path.to_path_buf(),
        InputKind::File => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
    }
}

/// Defaults, then `.roster.toml`, then CLI flags. Initializes logging once verbosity is known.
fn setup_opts(cli: &Cli, kind: InputKind) -> Opts {
    let mut opts = Opts::default();
    let file = load_roster_toml(&config_dir(&cli.path, kind));
    if let Ok(Some(ref f)) = file {
        apply_file_to_opts(f, &mut opts);
    }
    if let Some(ref db) = cli.db {
        opts.db_path = Some(db.clone());
    }
    if let Some(n) = cli.workers {
        opts.ingest.workers = n;
    }
    if let Some(n) = cli.work_queue_cap {
        opts.ingest.work_queue_cap = n;
    }
    if let Some(n) = cli.result_queue_cap {
        opts.ingest.result_queue_cap = n;
    }
    if let Some(ref p) = cli.pattern {
        opts.ingest.pattern = p.clone();
    }
    if let Some(v) = cli.verbose {
        opts.verbose = v;
    }
    opts.dry_run = cli.dry_run;

    setup_logging(opts.verbose);
    if let Err(e) = file {
        warn!("Ignoring malformed config {}", e);
    }
    debug!(
        "{} CONFIG:{:#?}",
        env!("CARGO_PKG_NAME").to_uppercase(),
        opts
    );
    opts
}

/// Ctrl+C cancels the running session; the import then stops and reports what was stored.
fn install_interrupt_handler(handle: CancelHandle) {
    if let Err(e) = ctrlc::set_handler(move || handle.cancel()) {
        warn!("Could not install Ctrl+C handler: {}", e);
    }
}

/// Parse and validate every record without storing anything.
fn dry_run(stream: &mut RecordStream) -> ImportSummary {
    warn!("RUNNING IN DRY-RUN MODE. NOTHING WILL BE WRITTEN TO THE DATABASE.");
    let mut summary = ImportSummary::default();
    for person in stream.by_ref() {
        match person.validate() {
            Ok(()) => summary.succeeded += 1,
            Err(violations) => {
                summary.failed += 1;
                debug!(
                    "{} ({}): {}",
                    person.name,
                    person.birthday_label(),
                    violations.join("; ")
                );
            }
        }
    }
    summary.cancelled = stream.is_cancelled();
    if summary.cancelled {
        stream.close();
    }
    summary.file_errors = stream.take_file_errors();
    summary
}

/// One pipeline session over `dir`: dry run, or import into the configured database.
fn run_session(dir: &Path, opts: &Opts) -> Result<ImportSummary> {
    if opts.dry_run {
        let mut stream = run_pipeline(dir, &opts.ingest)?;
        install_interrupt_handler(stream.cancel_handle());
        return Ok(dry_run(&mut stream));
    }

    let db_path = resolve_db_path(opts.db_path.as_deref());
    let mut store = SqliteStore::new(open_db(&db_path)?);
    let mut stream = run_pipeline(dir, &opts.ingest)?;
    install_interrupt_handler(stream.cancel_handle());

    let bar = opts.verbose.then(|| {
        let b = create_counter("Importing");
        refresh_bar(&b);
        b
    });
    let on_progress = progress_callback(&bar);
    let summary = import_stream(&mut stream, &mut store, on_progress.as_deref());
    if bar.is_some() {
        eprintln!();
    }
    if let Some(total) = count_persons(store.conn()) {
        debug!("{} persons now in {}", total, db_path.display());
    }
    Ok(summary)
}

fn print_summary(summary: &ImportSummary, dry_run: bool) {
    let (ok_label, failed_label) = if dry_run {
        ("Valid", "Invalid")
    } else {
        ("Stored", "Rejected")
    };
    println!(
        "{}: {}  {}: {}  Skipped files: {}",
        ok_label,
        summary.succeeded,
        failed_label,
        summary.failed,
        summary.file_errors.len()
    );
}

/// Import the directory at PATH, or upload PATH when it is a single file.
pub fn handle_run(cli: &Cli) -> Result<()> {
    let kind = classify_input(&cli.path)?;
    let opts = setup_opts(cli, kind);
    let summary = match kind {
        InputKind::Directory => {
            debug!("Importing directory {}", cli.path.display());
            run_session(&cli.path, &opts)?
        }
        InputKind::File => {
            let staged = stage_upload(&cli.path)?;
            let result = run_session(staged.dir(), &opts);
            if let Err(e) = staged.cleanup() {
                warn!("{:#}", e);
            }
            result?
        }
    };
    report_file_errors(&summary.file_errors, opts.verbose);
    print_summary(&summary, opts.dry_run);
    if summary.cancelled {
        anyhow::bail!(
            "interrupted: {} records processed before cancellation",
            summary.succeeded
        );
    }
    Ok(())
}
