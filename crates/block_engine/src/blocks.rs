use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::MediaRef;

/// One unit of reconstructed content.
///
/// `position` is owned by whoever assembles the entity's block list; the
/// segmenter leaves it at zero and its output order is the intended order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    pub id: Uuid,
    pub position: usize,
    #[serde(flatten)]
    pub data: BlockData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum BlockData {
    Text {
        text: String,
    },
    Picture {
        picture: MediaRef,
    },
    Gallery {
        pictures: Vec<MediaRef>,
    },
    Quote {
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Youtube {
        youtube_id: String,
    },
    #[serde(rename_all = "camelCase")]
    Twitch {
        video_id: Option<String>,
        channel_id: Option<String>,
        collection_id: Option<String>,
    },
    Iframe {
        src: String,
    },
    File {
        file: MediaRef,
    },
    #[serde(rename_all = "camelCase")]
    Cut {
        button_text: String,
    },
}

impl ContentBlock {
    pub fn new(data: BlockData) -> Self {
        Self {
            id: Uuid::new_v4(),
            position: 0,
            data,
        }
    }

    /// Text block from `text`, or `None` when nothing is left after trimming.
    pub fn text(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self::new(BlockData::Text {
                text: trimmed.to_string(),
            }))
        }
    }

    /// Quote block from a blockquote's inner HTML, or `None` when empty.
    pub fn quote(inner_html: &str) -> Option<Self> {
        let trimmed = inner_html.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self::new(BlockData::Quote {
                text: trimmed.to_string(),
            }))
        }
    }

    /// One picture becomes a picture block, two or more a gallery.
    pub fn pictures(mut pictures: Vec<MediaRef>) -> Option<Self> {
        match pictures.len() {
            0 => None,
            1 => pictures
                .pop()
                .map(|picture| Self::new(BlockData::Picture { picture })),
            _ => Some(Self::new(BlockData::Gallery { pictures })),
        }
    }

    pub fn cut(button_text: &str) -> Self {
        Self::new(BlockData::Cut {
            button_text: button_text.to_string(),
        })
    }

    pub fn is_cut(&self) -> bool {
        matches!(self.data, BlockData::Cut { .. })
    }

    pub fn kind(&self) -> &'static str {
        match self.data {
            BlockData::Text { .. } => "text",
            BlockData::Picture { .. } => "picture",
            BlockData::Gallery { .. } => "gallery",
            BlockData::Quote { .. } => "quote",
            BlockData::Youtube { .. } => "youtube",
            BlockData::Twitch { .. } => "twitch",
            BlockData::Iframe { .. } => "iframe",
            BlockData::File { .. } => "file",
            BlockData::Cut { .. } => "cut",
        }
    }
}

/// Ordered block list of one entity. Positions are dense and zero-based,
/// assigned in push order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockSequence {
    blocks: Vec<ContentBlock>,
}

impl BlockSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<ContentBlock>) -> Self {
        let mut sequence = Self::new();
        sequence.extend(blocks);
        sequence
    }

    pub fn push(&mut self, mut block: ContentBlock) {
        block.position = self.blocks.len();
        self.blocks.push(block);
    }

    pub fn extend(&mut self, blocks: impl IntoIterator<Item = ContentBlock>) {
        for block in blocks {
            self.push(block);
        }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    pub fn into_blocks(self) -> Vec<ContentBlock> {
        self.blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn media(name: &str) -> MediaRef {
        let now = Utc::now();
        MediaRef {
            id: Uuid::new_v4(),
            public_uri: format!("https://media.example.com/{name}"),
            file_path: name.to_string(),
            path: String::new(),
            file_name: name.to_string(),
            file_size: 3,
            date_added: now,
            date_updated: now,
        }
    }

    #[test]
    fn blank_text_and_quotes_yield_nothing() {
        assert!(ContentBlock::text("  \n ").is_none());
        assert!(ContentBlock::quote("").is_none());
        assert!(ContentBlock::text(" hi ").is_some());
    }

    #[test]
    fn picture_count_decides_between_picture_and_gallery() {
        assert!(ContentBlock::pictures(Vec::new()).is_none());

        let single = ContentBlock::pictures(vec![media("a.jpg")]).unwrap();
        assert_eq!(single.kind(), "picture");

        let many = ContentBlock::pictures(vec![media("a.jpg"), media("b.jpg")]).unwrap();
        match many.data {
            BlockData::Gallery { pictures } => {
                let names: Vec<_> = pictures.iter().map(|p| p.file_name.as_str()).collect();
                assert_eq!(names, vec!["a.jpg", "b.jpg"]);
            }
            other => panic!("expected gallery, got {other:?}"),
        }
    }

    #[test]
    fn sequence_positions_are_dense() {
        let mut sequence = BlockSequence::new();
        sequence.push(ContentBlock::text("a").unwrap());
        sequence.extend([ContentBlock::text("b").unwrap(), ContentBlock::cut("more")]);
        let positions: Vec<_> = sequence.blocks().iter().map(|b| b.position).collect();
        assert_eq!(positions, vec![0, 1, 2]);
    }

    #[test]
    fn blocks_serialize_with_type_tag() {
        let mut block = ContentBlock::new(BlockData::Twitch {
            video_id: None,
            channel_id: Some("quin69".into()),
            collection_id: None,
        });
        block.position = 4;
        let value = serde_json::to_value(&block).unwrap();
        assert_eq!(value["type"], "twitch");
        assert_eq!(value["position"], 4);
        assert_eq!(value["data"]["channelId"], "quin69");
        assert!(value["data"]["videoId"].is_null());
    }
}
