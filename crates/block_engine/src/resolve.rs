use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryFile {
    pub url: String,
    pub file_name: String,
}

/// Legacy gallery pictures by id, each with its ordered files. Built once per
/// run and only read during segmentation.
#[derive(Debug, Clone, Default)]
pub struct PictureSet {
    pictures: HashMap<u64, Vec<GalleryFile>>,
}

impl PictureSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: u64, files: Vec<GalleryFile>) {
        self.pictures.insert(id, files);
    }

    pub fn file(&self, id: u64, index: usize) -> Option<&GalleryFile> {
        self.pictures.get(&id).and_then(|files| files.get(index))
    }

    pub fn len(&self) -> usize {
        self.pictures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pictures.is_empty()
    }
}

impl FromIterator<(u64, Vec<GalleryFile>)> for PictureSet {
    fn from_iter<T: IntoIterator<Item = (u64, Vec<GalleryFile>)>>(iter: T) -> Self {
        Self {
            pictures: iter.into_iter().collect(),
        }
    }
}

fn thumb_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"gallery/thumb/([0-9]+)/[0-9]+/[0-9]+/?([0-9]+)?").ok())
        .as_ref()
}

/// The URL to fetch for an `<img>`, plus the gallery file name when the
/// source was a known thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedImage {
    pub url: String,
    pub file_name: Option<String>,
}

/// Turns an `<img>` source into the URL that should actually be fetched.
#[derive(Debug, Clone, Default)]
pub struct InlineMediaResolver {
    base_url: Option<Url>,
}

impl InlineMediaResolver {
    pub fn new(base_url: Option<Url>) -> Self {
        Self { base_url }
    }

    /// Gallery thumbnails are swapped for the full-size file from `gallery`
    /// when the picture and file index exist; otherwise the source is kept.
    /// Schemeless sources get `https:`, relative ones are joined to the base
    /// URL when there is one.
    pub fn resolve(&self, src: &str, gallery: &PictureSet) -> ResolvedImage {
        let src = src.trim();
        match thumbnail_target(src, gallery) {
            Some(file) => ResolvedImage {
                url: self.absolutize(&file.url),
                file_name: Some(file.file_name.clone()).filter(|name| !name.trim().is_empty()),
            },
            None => ResolvedImage {
                url: self.absolutize(src),
                file_name: None,
            },
        }
    }

    fn absolutize(&self, src: &str) -> String {
        if src.starts_with("//") {
            return format!("https:{src}");
        }
        if Url::parse(src).is_ok() {
            return src.to_string();
        }
        match self.base_url.as_ref().and_then(|base| base.join(src).ok()) {
            Some(url) => url.into(),
            None => src.to_string(),
        }
    }
}

fn thumbnail_target<'a>(src: &str, gallery: &'a PictureSet) -> Option<&'a GalleryFile> {
    let captures = thumb_pattern()?.captures(src)?;
    let pic_id: u64 = captures.get(1)?.as_str().parse().ok()?;
    if pic_id == 0 {
        return None;
    }
    let index: usize = captures
        .get(2)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0);
    gallery.file(pic_id, index)
}
