//! Upload staging: copy one uploaded file alone into a fresh temporary directory.
//! The directory is removed when the returned [`StagedUpload`] is dropped, whatever the outcome.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::utils::config::{STAGED_FILE_NAME, STAGING_DIR_PREFIX};

/// A staged upload. Owns its temporary directory.
pub struct StagedUpload {
    dir: TempDir,
    file: PathBuf,
}

impl StagedUpload {
    /// Directory to hand to the pipeline.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// The staged copy of the uploaded file.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// Remove the directory now and report failures (Drop removes it silently).
    pub fn cleanup(self) -> Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir
            .close()
            .with_context(|| format!("clean staging directory {}", path.display()))
    }
}

/// Stage `source` as `<tmp>/person_XXXX/person.json`.
pub fn stage_upload(source: &Path) -> Result<StagedUpload> {
    let dir = tempfile::Builder::new()
        .prefix(STAGING_DIR_PREFIX)
        .tempdir()
        .context("create staging directory")?;
    let file = dir.path().join(STAGED_FILE_NAME);
    let mut reader = BufReader::new(
        File::open(source).with_context(|| format!("open upload {}", source.display()))?,
    );
    let mut writer = BufWriter::new(
        File::create(&file).with_context(|| format!("create staged file {}", file.display()))?,
    );
    std::io::copy(&mut reader, &mut writer).context("copy uploaded file")?;
    writer.flush().context("flush staged file")?;
    log::debug!("Staged {} at {}", source.display(), file.display());
    Ok(StagedUpload { dir, file })
}
