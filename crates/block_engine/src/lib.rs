//! Block engine: turns legacy HTML fragments into ordered content blocks,
//! re-uploading the media they reference.
mod blocks;
mod embed;
mod fetch;
mod filename;
mod fragment;
mod media;
mod pagination;
mod persist;
mod resolve;
mod segment;
mod storage;
mod types;

pub use blocks::{BlockData, BlockSequence, ContentBlock};
pub use embed::classify_embed;
pub use fetch::{ByteFetcher, FetchSettings, ReqwestFetcher};
pub use filename::{derive_file_name, stored_file_name};
pub use fragment::{
    classify, normalize_entities, parse_fragment, regroup_inline, ElementNode, FragmentNode,
    NodeKind,
};
pub use media::{MediaFetchError, MediaUploader};
pub use pagination::{join_with_cut, CutPolicy, DEFAULT_CUT_BUTTON_TEXT};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use resolve::{GalleryFile, InlineMediaResolver, PictureSet, ResolvedImage};
pub use segment::{HtmlSegmenter, SegmenterSettings};
pub use storage::{FsStorage, Storage, StorageError};
pub use types::{FailureKind, FetchError, FetchMetadata, FetchOutput, MediaRef};
