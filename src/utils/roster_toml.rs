//! Load `.roster.toml` from a directory (CLI only).
//! Library callers pass [`IngestOpts`](crate::IngestOpts) directly.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct RosterToml {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    db_path: Option<String>,
    workers: Option<usize>,
    work_queue_cap: Option<usize>,
    result_queue_cap: Option<usize>,
    pattern: Option<String>,
    verbose: Option<bool>,
}

/// Parse config text. The error names the file it came from.
pub(crate) fn parse_roster_toml(text: &str, origin: &Path) -> Result<RosterToml, String> {
    toml::from_str(text).map_err(|e| format!("{}: {}", origin.display(), e))
}

/// Load `.roster.toml` from `dir`. Ok(None) when the file is missing or unreadable;
/// Err when it exists but is malformed (callers log it and continue without it).
pub(crate) fn load_roster_toml(dir: &Path) -> Result<Option<RosterToml>, String> {
    let path = dir.join(PackagePaths::get().config_filename());
    match std::fs::read_to_string(&path) {
        Ok(s) => parse_roster_toml(&s, &path).map(Some),
        Err(_) => Ok(None),
    }
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($sec:expr, $opts:expr, $sec_field:ident => $($opts_field:ident).+) => {
        if let Some(v) = $sec.$sec_field.clone() {
            $opts.$($opts_field).+ = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
/// dry_run is never in the file.
pub(crate) fn apply_file_to_opts(file: &RosterToml, opts: &mut Opts) {
    let sec = &file.settings;
    if let Some(ref p) = sec.db_path {
        opts.db_path = Some(PathBuf::from(p));
    }
    apply_file_opt!(sec, opts, workers => ingest.workers);
    apply_file_opt!(sec, opts, work_queue_cap => ingest.work_queue_cap);
    apply_file_opt!(sec, opts, result_queue_cap => ingest.result_queue_cap);
    apply_file_opt!(sec, opts, pattern => ingest.pattern);
    apply_file_opt!(sec, opts, verbose => verbose);
}
