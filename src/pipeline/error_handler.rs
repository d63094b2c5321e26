use crate::error::FileError;

/// Log a summary of failed files after a run; list each one when `verbose`.
pub fn report_file_errors(file_errors: &[FileError], verbose: bool) {
    if file_errors.is_empty() {
        return;
    }
    log::warn!(
        "Skipped {} source files that could not be parsed",
        file_errors.len()
    );
    if verbose {
        for e in file_errors {
            eprintln!("  skipped: {}: {}", e.path.display(), e.error);
        }
    }
}
