use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{ArticleCatExport, FileCatExport, GalleryCatExport, SectionRefs};

/// A node of one of the legacy category trees.
pub trait Category {
    fn id(&self) -> u64;
    fn parent_id(&self) -> Option<u64>;
    fn title(&self) -> &str;
    fn sections(&self) -> SectionRefs;
}

macro_rules! impl_category {
    ($($ty:ty),*) => {$(
        impl Category for $ty {
            fn id(&self) -> u64 {
                self.id
            }

            fn parent_id(&self) -> Option<u64> {
                self.cat_id.filter(|id| *id > 0)
            }

            fn title(&self) -> &str {
                &self.title
            }

            fn sections(&self) -> SectionRefs {
                SectionRefs::new(self.developer_id, self.game_id, self.topic_id)
            }
        }
    )*};
}

impl_category!(ArticleCatExport, FileCatExport, GalleryCatExport);

/// Titles from the root category down to `start`.
///
/// The walk stops at a missing parent or at the first category seen twice,
/// so a broken tree still yields a finite path.
pub fn category_path<C: Category>(all: &[C], start: &C) -> Vec<String> {
    let mut titles = Vec::new();
    let mut seen = HashSet::new();
    let mut current = Some(start);

    while let Some(cat) = current {
        if !seen.insert(cat.id()) {
            break;
        }
        titles.push(cat.title().to_string());
        current = cat
            .parent_id()
            .and_then(|parent| all.iter().find(|c| c.id() == parent));
    }

    titles.reverse();
    titles
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub title: String,
    pub date_added: DateTime<Utc>,
}

/// Tags by title for the whole run; a title maps to one tag.
#[derive(Debug, Default)]
pub struct TagRegistry {
    by_title: HashMap<String, usize>,
    tags: Vec<Tag>,
}

impl TagRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag(&mut self, title: &str) -> Uuid {
        let title = title.trim();
        if let Some(index) = self.by_title.get(title) {
            return self.tags[*index].id;
        }
        let tag = Tag {
            id: Uuid::new_v4(),
            title: title.to_string(),
            date_added: Utc::now(),
        };
        let id = tag.id;
        self.by_title.insert(tag.title.clone(), self.tags.len());
        self.tags.push(tag);
        id
    }

    /// Tag ids for a category path, root first, without repeats.
    pub fn tags_for_path(&mut self, titles: &[String]) -> Vec<Uuid> {
        let mut ids: Vec<Uuid> = Vec::with_capacity(titles.len());
        for title in titles.iter().filter(|t| !t.trim().is_empty()) {
            let id = self.tag(title);
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn into_tags(self) -> Vec<Tag> {
        self.tags
    }
}
