use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use import_logging::{import_error, import_info};

use crate::filename::derive_file_name;
use crate::{ByteFetcher, FetchError, MediaRef, Storage, StorageError};

#[derive(Debug, thiserror::Error)]
pub enum MediaFetchError {
    #[error("no file name can be derived from {url}")]
    MissingFileName { url: String },
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("storage failed: {0}")]
    Storage(#[from] StorageError),
}

/// Downloads media once and hands it to the storage backend.
///
/// With memoization on, a source URL seen earlier in the run returns the
/// reference from the first upload and is not fetched again.
pub struct MediaUploader {
    fetcher: Arc<dyn ByteFetcher>,
    storage: Arc<dyn Storage>,
    cache: Option<Mutex<HashMap<String, MediaRef>>>,
}

impl MediaUploader {
    pub fn new(fetcher: Arc<dyn ByteFetcher>, storage: Arc<dyn Storage>) -> Self {
        Self {
            fetcher,
            storage,
            cache: Some(Mutex::new(HashMap::new())),
        }
    }

    pub fn without_memoization(fetcher: Arc<dyn ByteFetcher>, storage: Arc<dyn Storage>) -> Self {
        Self {
            fetcher,
            storage,
            cache: None,
        }
    }

    pub fn begin_batch(&self) {
        self.storage.begin_batch();
    }

    pub async fn finish_batch(&self) -> Result<usize, StorageError> {
        self.storage.finish_batch().await
    }

    pub fn cached_count(&self) -> usize {
        self.cache
            .as_ref()
            .map(|cache| lock(cache).len())
            .unwrap_or(0)
    }

    /// Best-effort upload: failures are logged with the URL and detail and
    /// come back as `None`.
    pub async fn upload(
        &self,
        url: &str,
        target_path: &str,
        file_name: Option<&str>,
    ) -> Option<MediaRef> {
        match self.try_upload(url, target_path, file_name).await {
            Ok(media) => Some(media),
            Err(err) => {
                import_error!("Error while uploading file from url {}: {}", url, err);
                None
            }
        }
    }

    /// One fetch attempt, then one storage write.
    pub async fn try_upload(
        &self,
        url: &str,
        target_path: &str,
        file_name: Option<&str>,
    ) -> Result<MediaRef, MediaFetchError> {
        let file_name = file_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .or_else(|| derive_file_name(url))
            .ok_or_else(|| MediaFetchError::MissingFileName {
                url: url.to_string(),
            })?;

        if let Some(hit) = self.cached(url) {
            return Ok(hit);
        }

        import_info!("Downloading file from url {}", url);
        let output = self.fetcher.fetch_bytes(url).await?;
        let media = self
            .storage
            .save_file(output.bytes, &file_name, target_path)
            .await?;

        if let Some(cache) = &self.cache {
            lock(cache).insert(url.to_string(), media.clone());
        }
        Ok(media)
    }

    fn cached(&self, url: &str) -> Option<MediaRef> {
        self.cache
            .as_ref()
            .and_then(|cache| lock(cache).get(url).cloned())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
