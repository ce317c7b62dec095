use std::path::PathBuf;
use std::sync::Mutex;

use bytes::Bytes;
use chrono::Utc;
use import_logging::import_info;
use url::Url;
use uuid::Uuid;

use crate::filename::stored_file_name;
use crate::persist::{AtomicFileWriter, PersistError};
use crate::MediaRef;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid storage path {0:?}")]
    InvalidPath(String),
    #[error("failed to build public uri for {path}: {message}")]
    PublicUri { path: String, message: String },
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Destination storage for uploaded media.
///
/// Between `begin_batch` and `finish_batch` an implementation may buffer
/// writes; `save_file` must still hand back a usable reference immediately.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    fn begin_batch(&self);

    async fn save_file(
        &self,
        bytes: Bytes,
        file_name: &str,
        path: &str,
    ) -> Result<MediaRef, StorageError>;

    /// Flushes buffered writes and leaves batch mode. Returns the number of
    /// files written by the flush.
    async fn finish_batch(&self) -> Result<usize, StorageError>;
}

#[derive(Debug, Default)]
struct BatchState {
    active: bool,
    pending: Vec<(String, Bytes)>,
}

/// Local filesystem storage rooted at a directory and published under a
/// base URL.
#[derive(Debug)]
pub struct FsStorage {
    writer: AtomicFileWriter,
    public_base: Url,
    batch: Mutex<BatchState>,
}

impl FsStorage {
    pub fn new(root: PathBuf, public_base: Url) -> Self {
        Self {
            writer: AtomicFileWriter::new(root),
            public_base,
            batch: Mutex::new(BatchState::default()),
        }
    }

    pub fn pending_count(&self) -> usize {
        self.lock_batch().pending.len()
    }

    fn lock_batch(&self) -> std::sync::MutexGuard<'_, BatchState> {
        // queued entries are always whole
        self.batch.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_now(&self, file_path: &str, bytes: &[u8]) -> Result<(), StorageError> {
        self.writer.write(file_path, bytes)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Storage for FsStorage {
    fn begin_batch(&self) {
        self.lock_batch().active = true;
    }

    async fn save_file(
        &self,
        bytes: Bytes,
        file_name: &str,
        path: &str,
    ) -> Result<MediaRef, StorageError> {
        let dir = normalize_dir(path)?;
        let stored = stored_file_name(file_name, &bytes);
        let file_path = if dir.is_empty() {
            stored.clone()
        } else {
            format!("{dir}/{stored}")
        };
        let public_uri = self
            .public_base
            .join(&file_path)
            .map_err(|err| StorageError::PublicUri {
                path: file_path.clone(),
                message: err.to_string(),
            })?;

        let now = Utc::now();
        let media = MediaRef {
            id: Uuid::new_v4(),
            public_uri: public_uri.into(),
            file_path: file_path.clone(),
            path: dir,
            file_name: stored,
            file_size: bytes.len() as u64,
            date_added: now,
            date_updated: now,
        };

        let deferred = {
            let mut batch = self.lock_batch();
            if batch.active {
                batch.pending.push((file_path.clone(), bytes.clone()));
                true
            } else {
                false
            }
        };
        if !deferred {
            self.write_now(&file_path, &bytes)?;
        }

        Ok(media)
    }

    async fn finish_batch(&self) -> Result<usize, StorageError> {
        let pending = {
            let mut batch = self.lock_batch();
            batch.active = false;
            std::mem::take(&mut batch.pending)
        };
        let count = pending.len();
        for (file_path, bytes) in pending {
            self.write_now(&file_path, &bytes)?;
        }
        import_info!("Storage batch finished: {} files written", count);
        Ok(count)
    }
}

fn normalize_dir(path: &str) -> Result<String, StorageError> {
    let parts: Vec<&str> = path
        .split(['/', '\\'])
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();
    if parts.iter().any(|part| *part == "..") {
        return Err(StorageError::InvalidPath(path.to_string()));
    }
    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::normalize_dir;

    #[test]
    fn directories_are_normalized() {
        assert_eq!(normalize_dir("/").unwrap(), "");
        assert_eq!(normalize_dir("posts/2019/3/").unwrap(), "posts/2019/3");
        assert_eq!(normalize_dir("sections\\games").unwrap(), "sections/games");
        assert!(normalize_dir("../etc").is_err());
    }
}
