//! Atomic report writes: contents go to a temp file next to the target and are
//! renamed into place only on commit. Dropping an uncommitted [`StagedFile`]
//! removes the temp file, so a failed run leaves existing outputs untouched.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, error};

use crate::contract::ReconError;

/// Fully written temp file waiting to replace `target`.
pub struct StagedFile {
    temp: NamedTempFile,
    target: PathBuf,
}

impl StagedFile {
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the temp file over the target.
    pub fn commit(self) -> Result<PathBuf, ReconError> {
        let StagedFile { temp, target } = self;
        temp.persist(&target).map_err(|e| {
            error!(error = %e.error, path = %target.display(), "Failed to move report into place");
            ReconError::Io(e.error)
        })?;
        debug!(path = %target.display(), "Committed staged file");
        Ok(target)
    }
}

/// Write `contents` to a temp file in the target's directory, creating the
/// directory if needed.
///
/// A target that exists but is not a regular file is refused here, so that
/// staging every output before committing any of them catches it.
pub fn stage(target: &Path, contents: &[u8]) -> Result<StagedFile, ReconError> {
    if target.exists() && !target.is_file() {
        error!(path = %target.display(), "Report target exists and is not a regular file");
        return Err(ReconError::Io(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} exists and is not a regular file", target.display()),
        )));
    }
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !dir.exists() {
        fs::create_dir_all(&dir)?;
        debug!(path = %dir.display(), "Created output directory");
    }

    let mut temp = NamedTempFile::new_in(&dir)?;
    temp.write_all(contents)?;
    temp.as_file().sync_all()?;
    debug!(target = %target.display(), temp = %temp.path().display(), bytes = contents.len(), "Staged file");
    Ok(StagedFile {
        temp,
        target: target.to_path_buf(),
    })
}

/// Stage and immediately commit.
pub fn write_atomically(target: &Path, contents: &[u8]) -> Result<(), ReconError> {
    stage(target, contents)?.commit().map(|_| ())
}
