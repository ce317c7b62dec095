#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use block_engine::{
    ByteFetcher, FailureKind, FetchError, FetchMetadata, FetchOutput, HtmlSegmenter, MediaRef,
    MediaUploader, SegmenterSettings, Storage, StorageError,
};
use bytes::Bytes;
use chrono::Utc;
use uuid::Uuid;

/// Serves canned bodies by URL; anything else is a 404.
#[derive(Default)]
pub struct FakeFetcher {
    bodies: HashMap<String, Bytes>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn with(mut self, url: &str, body: &[u8]) -> Self {
        self.bodies
            .insert(url.to_string(), Bytes::copy_from_slice(body));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ByteFetcher for FakeFetcher {
    async fn fetch_bytes(&self, url: &str) -> Result<FetchOutput, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        let bytes = self
            .bodies
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::new(FailureKind::HttpStatus(404), "404 Not Found"))?;
        Ok(FetchOutput {
            metadata: FetchMetadata {
                original_url: url.to_string(),
                final_url: url.to_string(),
                redirect_count: 0,
                content_type: None,
                byte_len: bytes.len() as u64,
            },
            bytes,
        })
    }
}

/// Keeps saved files in memory and publishes them under a fixed host.
#[derive(Default)]
pub struct MemoryStorage {
    files: Mutex<Vec<(String, Bytes)>>,
    batches: AtomicUsize,
}

impl MemoryStorage {
    pub fn saved_paths(&self) -> Vec<String> {
        self.files
            .lock()
            .unwrap()
            .iter()
            .map(|(path, _)| path.clone())
            .collect()
    }

    pub fn finished_batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    fn begin_batch(&self) {}

    async fn save_file(
        &self,
        bytes: Bytes,
        file_name: &str,
        path: &str,
    ) -> Result<MediaRef, StorageError> {
        let file_path = format!("{path}/{file_name}");
        let now = Utc::now();
        let media = MediaRef {
            id: Uuid::new_v4(),
            public_uri: format!("https://media.example.com/{file_path}"),
            file_path: file_path.clone(),
            path: path.to_string(),
            file_name: file_name.to_string(),
            file_size: bytes.len() as u64,
            date_added: now,
            date_updated: now,
        };
        self.files.lock().unwrap().push((file_path, bytes));
        Ok(media)
    }

    async fn finish_batch(&self) -> Result<usize, StorageError> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }
}

pub struct Harness {
    pub fetcher: Arc<FakeFetcher>,
    pub storage: Arc<MemoryStorage>,
    pub segmenter: HtmlSegmenter,
}

pub fn harness(fetcher: FakeFetcher) -> Harness {
    import_logging::initialize_for_tests();
    let fetcher = Arc::new(fetcher);
    let storage = Arc::new(MemoryStorage::default());
    let uploader = Arc::new(MediaUploader::new(fetcher.clone(), storage.clone()));
    Harness {
        fetcher,
        storage,
        segmenter: HtmlSegmenter::new(uploader, SegmenterSettings::default()),
    }
}
