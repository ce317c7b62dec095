use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// Whole legacy export. Missing collections deserialize as empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Export {
    pub developers: Vec<DeveloperExport>,
    pub games: Vec<GameExport>,
    pub topics: Vec<TopicExport>,
    pub news: Vec<NewsExport>,
    pub articles_cats: Vec<ArticleCatExport>,
    pub articles: Vec<ArticleExport>,
    pub files_cats: Vec<FileCatExport>,
    pub files: Vec<FileExport>,
    pub gallery_cats: Vec<GalleryCatExport>,
    pub gallery_pics: Vec<GalleryExport>,
}

impl Export {
    pub fn developer(&self, id: u64) -> Option<&DeveloperExport> {
        self.developers.iter().find(|d| d.id == id)
    }

    pub fn game(&self, id: u64) -> Option<&GameExport> {
        self.games.iter().find(|g| g.id == id)
    }

    pub fn topic(&self, id: u64) -> Option<&TopicExport> {
        self.topics.iter().find(|t| t.id == id)
    }
}

/// Section links of an entity or category. Zero ids in the export mean
/// "none" and are normalized away by the accessors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SectionRefs {
    pub developer_id: Option<u64>,
    pub game_id: Option<u64>,
    pub topic_id: Option<u64>,
}

impl SectionRefs {
    pub fn new(developer_id: Option<u64>, game_id: Option<u64>, topic_id: Option<u64>) -> Self {
        Self {
            developer_id: positive(developer_id),
            game_id: positive(game_id),
            topic_id: positive(topic_id),
        }
    }
}

fn positive(id: Option<u64>) -> Option<u64> {
    id.filter(|id| *id > 0)
}

/// Empty strings in the export mean "absent".
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeveloperExport {
    pub id: u64,
    pub url: String,
    pub full_url: Option<String>,
    pub name: String,
    pub info: Option<String>,
    pub desc: Option<String>,
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GameExport {
    pub id: u64,
    pub developer_id: u64,
    pub url: String,
    pub full_url: Option<String>,
    pub title: String,
    pub genre: Option<String>,
    pub release_date: Option<String>,
    pub platforms: Option<String>,
    pub desc: Option<String>,
    pub keywords: Option<String>,
    pub publisher: Option<String>,
    pub localizator: Option<String>,
    pub logo: Option<String>,
    pub small_logo: Option<String>,
    pub date: DateTime<FixedOffset>,
    pub tweet_tag: Option<String>,
}

impl GameExport {
    pub fn developer_id(&self) -> Option<u64> {
        positive(Some(self.developer_id))
    }

    pub fn keywords(&self) -> Option<&str> {
        present(&self.keywords)
    }

    pub fn hashtag(&self) -> Option<&str> {
        present(&self.tweet_tag)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TopicExport {
    pub id: u64,
    pub title: String,
    pub url: String,
    pub full_url: Option<String>,
    pub logo: Option<String>,
    pub desc: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewsExport {
    pub id: u64,
    pub game_id: Option<u64>,
    pub developer_id: Option<u64>,
    pub topic_id: Option<u64>,
    pub url: String,
    pub full_url: Option<String>,
    pub source: Option<String>,
    pub title: String,
    pub short_text: String,
    pub add_text: Option<String>,
    pub author_id: u64,
    pub forum_topic_id: Option<u64>,
    pub forum_post_id: Option<u64>,
    pub sticky: i32,
    pub date: DateTime<FixedOffset>,
    pub last_change_date: DateTime<FixedOffset>,
    #[serde(rename = "pub")]
    pub pub_: i32,
    pub comments: u64,
    pub twitter_id: Option<i64>,
    pub facebook_id: Option<String>,
}

impl NewsExport {
    pub fn sections(&self) -> SectionRefs {
        SectionRefs::new(self.developer_id, self.game_id, self.topic_id)
    }

    pub fn is_published(&self) -> bool {
        self.pub_ == 1
    }

    pub fn extended_text(&self) -> Option<&str> {
        present(&self.add_text)
    }

    pub fn twitter_id(&self) -> Option<i64> {
        self.twitter_id.filter(|id| *id > 0)
    }

    pub fn facebook_id(&self) -> Option<&str> {
        present(&self.facebook_id)
    }

    /// Forum topic and post, only when both are set.
    pub fn forum_ids(&self) -> Option<(u64, u64)> {
        positive(self.forum_topic_id).zip(positive(self.forum_post_id))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticleCatExport {
    pub id: u64,
    pub cat_id: Option<u64>,
    pub game_id: Option<u64>,
    pub developer_id: Option<u64>,
    pub topic_id: Option<u64>,
    pub title: String,
    pub url: String,
    pub full_url: Option<String>,
    pub desc: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticleExport {
    pub id: u64,
    pub game_id: Option<u64>,
    pub developer_id: Option<u64>,
    pub topic_id: Option<u64>,
    pub url: String,
    pub full_url: Option<String>,
    pub source: Option<String>,
    pub cat_id: Option<u64>,
    pub title: String,
    pub announce: Option<String>,
    pub text: String,
    pub author_id: u64,
    pub count: u64,
    pub date: DateTime<FixedOffset>,
    #[serde(rename = "pub")]
    pub pub_: i32,
}

impl ArticleExport {
    pub fn is_published(&self) -> bool {
        self.pub_ == 1
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileCatExport {
    pub id: u64,
    pub cat_id: Option<u64>,
    pub game_id: Option<u64>,
    pub developer_id: Option<u64>,
    pub topic_id: Option<u64>,
    pub title: String,
    pub desc: Option<String>,
    pub url: String,
    pub full_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileExport {
    pub id: u64,
    pub game_id: Option<u64>,
    pub developer_id: Option<u64>,
    pub url: String,
    pub full_url: Option<String>,
    pub cat_id: u64,
    pub title: String,
    pub desc: Option<String>,
    pub announce: Option<String>,
    /// Path of the file in the legacy file store, starting with `/`.
    pub link: String,
    pub size: u64,
    pub yt_id: Option<String>,
    pub author_id: u64,
    pub count: u64,
    pub date: DateTime<FixedOffset>,
}

impl FileExport {
    pub fn description(&self) -> Option<&str> {
        present(&self.desc)
    }

    pub fn youtube_id(&self) -> Option<&str> {
        present(&self.yt_id)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryCatExport {
    pub id: u64,
    pub cat_id: Option<u64>,
    pub game_id: Option<u64>,
    pub developer_id: Option<u64>,
    pub topic_id: Option<u64>,
    pub title: String,
    pub desc: Option<String>,
    pub url: String,
    pub full_url: Option<String>,
}

/// One gallery picture entry; may hold several files.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryExport {
    pub id: u64,
    pub game_id: Option<u64>,
    pub developer_id: Option<u64>,
    pub cat_id: u64,
    pub desc: Option<String>,
    #[serde(rename = "pub")]
    pub pub_: i32,
    pub author_id: u64,
    pub date: DateTime<FixedOffset>,
    pub files: Vec<GalleryPicFile>,
    pub full_url: Option<String>,
}

impl GalleryExport {
    pub fn description(&self) -> Option<&str> {
        present(&self.desc)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalleryPicFile {
    pub url: String,
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_ids_mean_none() {
        let refs = SectionRefs::new(Some(0), Some(5), None);
        assert_eq!(
            refs,
            SectionRefs {
                developer_id: None,
                game_id: Some(5),
                topic_id: None
            }
        );
    }

    #[test]
    fn forum_ids_need_both_parts() {
        let mut news = NewsExport {
            forum_topic_id: Some(10),
            ..NewsExport::default()
        };
        assert_eq!(news.forum_ids(), None);
        news.forum_post_id = Some(20);
        assert_eq!(news.forum_ids(), Some((10, 20)));
    }

    #[test]
    fn blank_strings_are_absent() {
        let file = FileExport {
            yt_id: Some("  ".into()),
            desc: Some("<p>desc</p>".into()),
            ..FileExport::default()
        };
        assert_eq!(file.youtube_id(), None);
        assert_eq!(file.description(), Some("<p>desc</p>"));
    }
}
