use std::fmt;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutput {
    pub bytes: Bytes,
    pub metadata: FetchMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchMetadata {
    pub original_url: String,
    pub final_url: String,
    pub redirect_count: usize,
    pub content_type: Option<String>,
    pub byte_len: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: FailureKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidUrl,
    HttpStatus(u16),
    Timeout,
    RedirectLimitExceeded,
    TooLarge { max_bytes: u64, actual: Option<u64> },
    Network,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidUrl => write!(f, "invalid url"),
            FailureKind::HttpStatus(code) => write!(f, "http status {code}"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::RedirectLimitExceeded => write!(f, "redirect limit exceeded"),
            FailureKind::TooLarge { max_bytes, actual } => {
                write!(f, "response too large (max {max_bytes}, actual {actual:?})")
            }
            FailureKind::Network => write!(f, "network error"),
        }
    }
}

/// A stored media file. Created once by the uploader and shared, never
/// mutated, by every block that shows it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRef {
    pub id: Uuid,
    pub public_uri: String,
    /// Storage path of the file, relative to the storage root.
    pub file_path: String,
    /// Directory part of `file_path`.
    pub path: String,
    pub file_name: String,
    pub file_size: u64,
    pub date_added: DateTime<Utc>,
    pub date_updated: DateTime<Utc>,
}

impl MediaRef {
    /// Reference to a file that already lives in the destination storage
    /// under `files/<path>`, so nothing is downloaded.
    pub fn existing(path: &str, size: u64, date: DateTime<Utc>, base_url: &Url) -> Self {
        let relative = path.trim_start_matches('/');
        let file_path = format!("files/{relative}");
        let dir = match file_path.rsplit_once('/') {
            Some((dir, _)) => dir.to_string(),
            None => String::new(),
        };
        let file_name = relative.rsplit('/').next().unwrap_or(relative).to_string();
        let public_uri = base_url
            .join(&file_path)
            .map(String::from)
            .unwrap_or_else(|_| format!("{}{}", base_url, file_path));

        Self {
            id: Uuid::new_v4(),
            public_uri,
            file_path,
            path: dir,
            file_name,
            file_size: size,
            date_added: date,
            date_updated: date,
        }
    }
}
