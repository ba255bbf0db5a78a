use std::ffi::OsStr;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("export directory unusable: {0}")]
    OutputDir(String),
    #[error("export filename must be a bare file name: {0:?}")]
    InvalidFilename(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Creates `dir` if needed and checks that files can be created in it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() && !dir.is_dir() {
        return Err(PersistError::OutputDir(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    fs::create_dir_all(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    NamedTempFile::new_in(dir).map_err(|e| PersistError::OutputDir(e.to_string()))?;
    Ok(())
}

/// Writes export files into one directory via temp file + rename, so a
/// reader never sees a half-written export.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn write(
        &self,
        filename: &str,
        content: impl AsRef<[u8]>,
    ) -> Result<PathBuf, PersistError> {
        if filename.is_empty() || Path::new(filename).file_name() != Some(OsStr::new(filename)) {
            return Err(PersistError::InvalidFilename(filename.to_string()));
        }
        ensure_output_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_ref())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        // `persist` does not overwrite on every platform.
        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}
