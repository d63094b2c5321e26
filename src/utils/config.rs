//! Application configuration constants.
//! Tuning and thresholds in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    db_filename: String,
    config_filename: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                db_filename: format!(".{pkg}.db"),
                config_filename: format!(".{pkg}.toml"),
            }
        })
    }

    /// Default SQLite database filename (placed in the working directory).
    pub fn db_filename(&self) -> &str {
        &self.db_filename
    }

    /// Per-directory config filename.
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }
}

// ---- Pipeline ----

/// Pipeline session sizing. Each value can be overridden via [`IngestOpts`](crate::IngestOpts).
pub struct PipelineConsts;

impl PipelineConsts {
    /// Parallel parse workers.
    pub const WORKER_COUNT: usize = 4;
    /// Capacity of the source-file queue between discovery and workers.
    pub const WORK_QUEUE_CAP: usize = 100;
    /// Capacity of the parsed-record queue feeding the consumer. Full queue = backpressure.
    pub const RESULT_QUEUE_CAP: usize = 10_000;
    /// File-name pattern matched during discovery.
    pub const SOURCE_PATTERN: &'static str = "*.json";
}

// ---- Upload staging ----

/// Prefix of the temporary directory an uploaded file is staged in.
pub const STAGING_DIR_PREFIX: &str = "person_";
/// Name the uploaded file gets inside the staging directory (matches the default pattern).
pub const STAGED_FILE_NAME: &str = "person.json";

// ---- Import ----

/// Progress bar update granularity during import (records).
pub const PROGRESS_UPDATE_BATCH_SIZE: usize = 100;
