use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("output directory {path:?} unusable: {reason}")]
    OutputDir { path: PathBuf, reason: String },
    #[error("relative path escapes the output directory: {0}")]
    InvalidPath(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl PersistError {
    fn output_dir(path: &Path, reason: impl ToString) -> Self {
        PersistError::OutputDir {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Creates `dir` (and its parents) if needed and checks that a file can be
/// created inside it.
pub fn ensure_output_dir(dir: &Path) -> Result<(), PersistError> {
    match fs::metadata(dir) {
        Ok(meta) if !meta.is_dir() => return Err(PersistError::output_dir(dir, "not a directory")),
        Ok(_) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|e| PersistError::output_dir(dir, e))?;
        }
        Err(err) => return Err(PersistError::output_dir(dir, err)),
    }
    NamedTempFile::new_in(dir).map_err(|e| PersistError::output_dir(dir, e))?;
    Ok(())
}

/// Writes files under one root through a temp file in the target directory
/// and a rename, so readers never see a half-written file.
#[derive(Debug, Clone)]
pub struct AtomicFileWriter {
    dir: PathBuf,
}

impl AtomicFileWriter {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `relative` may contain `/`-separated subdirectories; they are created
    /// as needed. An existing file is replaced.
    pub fn write(&self, relative: &str, content: &[u8]) -> Result<PathBuf, PersistError> {
        let target = self.dir.join(checked_relative(relative)?);
        let parent = target.parent().unwrap_or(&self.dir);
        ensure_output_dir(parent)?;

        let mut staged = NamedTempFile::new_in(parent)?;
        staged.write_all(content)?;
        staged.as_file_mut().sync_all()?;
        staged.persist(&target).map_err(|e| PersistError::Io(e.error))?;
        Ok(target)
    }
}

/// Only plain path segments: no root, no `.` or `..`.
fn checked_relative(relative: &str) -> Result<&Path, PersistError> {
    let path = Path::new(relative);
    let plain = path
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if relative.is_empty() || !plain {
        return Err(PersistError::InvalidPath(relative.to_string()));
    }
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_must_stay_inside() {
        assert!(checked_relative("posts/2019/3/a.jpg").is_ok());
        for bad in ["", "../a", "/abs", "a/../../b", "./a"] {
            assert!(checked_relative(bad).is_err(), "{bad} accepted");
        }
    }
}
