//! Records written to the import output files.

use block_engine::{BlockSequence, MediaRef};
use chrono::{DateTime, FixedOffset};
use legacy_export::SectionKind;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: Uuid,
    pub kind: SectionKind,
    pub url: String,
    pub title: String,
    /// A game's developer.
    pub parent_id: Option<Uuid>,
    pub hashtag: Option<String>,
    pub logo: Option<MediaRef>,
    pub logo_small: Option<MediaRef>,
    pub seo: Option<SeoProperties>,
    pub is_published: bool,
    pub date_added: DateTime<FixedOffset>,
    pub blocks: BlockSequence,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeoProperties {
    pub keywords: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub url: String,
    pub title: String,
    pub section_ids: Vec<Uuid>,
    pub tag_ids: Vec<Uuid>,
    pub author_id: u64,
    pub is_published: bool,
    pub date_added: DateTime<FixedOffset>,
    pub date_updated: DateTime<FixedOffset>,
    pub date_published: DateTime<FixedOffset>,
    pub blocks: BlockSequence,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub publish_records: Vec<PublishRecord>,
}

/// Where a news item was cross-posted on the legacy site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PublishRecord {
    #[serde(rename_all = "camelCase")]
    Twitter { tweet_id: i64 },
    #[serde(rename_all = "camelCase")]
    Facebook { post_id: String },
    #[serde(rename_all = "camelCase")]
    Forum { topic_id: u64, post_id: u64 },
}
