//! Turns a legacy export into sections, posts, tags and redirects.
//!
//! Sections are imported first so posts can point at them. Every HTML body
//! goes through the block segmenter; media failures only cost the media
//! item, never the entity.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use block_engine::{
    join_with_cut, BlockData, BlockSequence, ContentBlock, CutPolicy, GalleryFile, HtmlSegmenter,
    MediaRef, MediaUploader, PictureSet, SegmenterSettings,
};
use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use import_logging::{import_info, import_warn};
use legacy_export::{
    category_path, legacy_path, post_route, section_route, Category, Export, GalleryExport,
    NewsExport, RedirectMap, SectionKind, SectionRefs, Tag, TagRegistry,
};
use url::Url;
use uuid::Uuid;

use crate::model::{Post, PublishRecord, Section, SeoProperties};

#[derive(Debug, Clone)]
pub struct ImportOptions {
    pub import_news: bool,
    pub import_articles: bool,
    pub import_files: bool,
    pub import_gallery: bool,
    pub cut: CutPolicy,
    /// Public prefix of legacy downloads that already sit in storage.
    pub files_base_url: Url,
    pub placeholder_logo_url: Option<String>,
}

impl ImportOptions {
    pub fn new(files_base_url: Url) -> Self {
        Self {
            import_news: true,
            import_articles: true,
            import_files: true,
            import_gallery: true,
            cut: CutPolicy::default(),
            files_base_url,
            placeholder_logo_url: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct ImportOutput {
    pub sections: Vec<Section>,
    /// Ordered by date added.
    pub posts: Vec<Post>,
    pub tags: Vec<Tag>,
    pub redirects: RedirectMap,
}

pub struct Importer {
    segmenter: HtmlSegmenter,
    options: ImportOptions,
}

/// What one legacy section record contributes.
struct SectionSource<'e> {
    kind: SectionKind,
    legacy_id: u64,
    url: &'e str,
    title: &'e str,
    full_url: Option<&'e str>,
    desc: Option<&'e str>,
    logo: Option<&'e str>,
    /// `None` reuses the main logo.
    small_logo: Option<Option<&'e str>>,
    date_added: DateTime<FixedOffset>,
}

type CategoryInfo = HashMap<u64, (Vec<Uuid>, SectionRefs)>;

/// Mutable state of one import run.
struct Run<'e> {
    export: &'e Export,
    gallery: PictureSet,
    placeholder: Option<MediaRef>,
    section_ids: HashMap<(SectionKind, u64), Uuid>,
    sections_by_title: HashMap<(SectionKind, String), Uuid>,
    sections: Vec<Section>,
    posts: Vec<Post>,
    slugs: HashSet<String>,
    tags: TagRegistry,
    redirects: RedirectMap,
}

impl<'e> Run<'e> {
    fn new(export: &'e Export) -> Self {
        Self {
            export,
            gallery: picture_set(export),
            placeholder: None,
            section_ids: HashMap::new(),
            sections_by_title: HashMap::new(),
            sections: Vec::new(),
            posts: Vec::new(),
            slugs: HashSet::new(),
            tags: TagRegistry::new(),
            redirects: RedirectMap::new(),
        }
    }

    /// The most specific known section: topic, then game, then developer.
    fn resolve_sections(&self, refs: SectionRefs) -> Vec<Uuid> {
        [
            (SectionKind::Topic, refs.topic_id),
            (SectionKind::Game, refs.game_id),
            (SectionKind::Developer, refs.developer_id),
        ]
        .into_iter()
        .find_map(|(kind, id)| id.and_then(|id| self.section_ids.get(&(kind, id)).copied()))
        .into_iter()
        .collect()
    }

    fn claim_slug(&mut self, slug: &str) -> bool {
        if self.slugs.insert(slug.to_string()) {
            true
        } else {
            import_warn!("Post url {} already imported, skipping", slug);
            false
        }
    }

    fn category_info<C: Category>(&mut self, cats: &[C]) -> CategoryInfo {
        let mut info = HashMap::with_capacity(cats.len());
        for cat in cats {
            let tags = self.tags.tags_for_path(&category_path(cats, cat));
            info.insert(cat.id(), (tags, cat.sections()));
        }
        info
    }

    fn redirect(&mut self, full_url: Option<&str>, route: &str) {
        if let Some(old) = full_url.and_then(legacy_path) {
            self.redirects.insert(&old, route);
        }
    }

    fn add_post<'u>(&mut self, post: Post, legacy_urls: impl IntoIterator<Item = Option<&'u str>>) {
        let route = post_route(&post.url);
        for full_url in legacy_urls {
            self.redirect(full_url, &route);
        }
        self.posts.push(post);
    }

    fn finish(mut self) -> ImportOutput {
        self.posts.sort_by_key(|post| post.date_added);
        ImportOutput {
            sections: self.sections,
            posts: self.posts,
            tags: self.tags.into_tags(),
            redirects: self.redirects,
        }
    }
}

impl Importer {
    pub fn new(
        uploader: Arc<MediaUploader>,
        settings: SegmenterSettings,
        options: ImportOptions,
    ) -> Self {
        Self {
            segmenter: HtmlSegmenter::new(uploader, settings),
            options,
        }
    }

    pub fn uploader(&self) -> &Arc<MediaUploader> {
        self.segmenter.uploader()
    }

    /// Imports everything the options enable. Media is saved inside a
    /// storage batch that the caller finishes once the output is accepted.
    pub async fn import(&self, export: &Export) -> ImportOutput {
        import_info!("Begin import");
        self.uploader().begin_batch();

        let mut run = Run::new(export);
        if let Some(url) = &self.options.placeholder_logo_url {
            run.placeholder = self
                .uploader()
                .upload(url, "sections", Some("placeholder.png"))
                .await;
        }

        import_info!("Developers: {}", export.developers.len());
        self.import_developers(&mut run).await;
        import_info!("Games: {}", export.games.len());
        self.import_games(&mut run).await;
        import_info!("Topics: {}", export.topics.len());
        self.import_topics(&mut run).await;

        if self.options.import_news {
            import_info!("News: {}", export.news.len());
            self.import_news(&mut run).await;
        }
        if self.options.import_articles {
            import_info!("Articles: {}", export.articles.len());
            self.import_articles(&mut run).await;
        }
        if self.options.import_files {
            import_info!("Files: {}", export.files.len());
            self.import_files(&mut run);
        }
        if self.options.import_gallery {
            import_info!("Gallery pictures: {}", export.gallery_pics.len());
            self.import_gallery(&mut run).await;
        }

        let output = run.finish();
        import_info!(
            "Import finished: {} sections, {} posts, {} tags, {} redirects, {} cached media",
            output.sections.len(),
            output.posts.len(),
            output.tags.len(),
            output.redirects.len(),
            self.uploader().cached_count()
        );
        output
    }

    async fn import_developers(&self, run: &mut Run<'_>) {
        let export = run.export;
        for dev in &export.developers {
            let source = SectionSource {
                kind: SectionKind::Developer,
                legacy_id: dev.id,
                url: &dev.url,
                title: &dev.name,
                full_url: dev.full_url.as_deref(),
                desc: dev.desc.as_deref(),
                logo: dev.logo.as_deref(),
                small_logo: None,
                date_added: Utc::now().fixed_offset(),
            };
            self.add_section(run, source).await;
        }
    }

    async fn import_games(&self, run: &mut Run<'_>) {
        let export = run.export;
        for game in &export.games {
            let source = SectionSource {
                kind: SectionKind::Game,
                legacy_id: game.id,
                url: &game.url,
                title: &game.title,
                full_url: game.full_url.as_deref(),
                desc: game.desc.as_deref(),
                logo: game.logo.as_deref(),
                small_logo: Some(game.small_logo.as_deref()),
                date_added: game.date,
            };
            let Some(index) = self.add_section(run, source).await else {
                continue;
            };

            let parent_id = game
                .developer_id()
                .and_then(|id| run.section_ids.get(&(SectionKind::Developer, id)).copied());
            let section = &mut run.sections[index];
            section.parent_id = parent_id;
            section.hashtag = game.hashtag().map(str::to_string);
            section.seo = game.keywords().map(|keywords| SeoProperties {
                keywords: keywords.to_string(),
                description: game.desc.clone(),
            });
        }
    }

    async fn import_topics(&self, run: &mut Run<'_>) {
        let export = run.export;
        for topic in &export.topics {
            let source = SectionSource {
                kind: SectionKind::Topic,
                legacy_id: topic.id,
                url: &topic.url,
                title: &topic.title,
                full_url: topic.full_url.as_deref(),
                desc: topic.desc.as_deref(),
                logo: topic.logo.as_deref(),
                small_logo: None,
                date_added: Utc::now().fixed_offset(),
            };
            self.add_section(run, source).await;
        }
    }

    /// Creates the section unless one of the same kind and title exists, in
    /// which case the legacy id is mapped to it. Returns the index of a newly
    /// created section.
    async fn add_section(&self, run: &mut Run<'_>, source: SectionSource<'_>) -> Option<usize> {
        let title_key = (source.kind, source.title.trim().to_string());
        if let Some(existing) = run.sections_by_title.get(&title_key).copied() {
            run.section_ids.insert((source.kind, source.legacy_id), existing);
            return None;
        }

        let storage_dir = source.kind.storage_dir();
        let blocks = match source.desc {
            Some(desc) => self.segmenter.segment(desc, &storage_dir, &run.gallery).await,
            None => Vec::new(),
        };
        let logo = self.upload_logo(run, source.logo, &storage_dir).await;
        let logo_small = match source.small_logo {
            Some(small) => self.upload_logo(run, small, &storage_dir).await,
            None => logo.clone(),
        };

        let section = Section {
            id: Uuid::new_v4(),
            kind: source.kind,
            url: source.url.to_string(),
            title: source.title.to_string(),
            parent_id: None,
            hashtag: None,
            logo,
            logo_small,
            seo: None,
            is_published: true,
            date_added: source.date_added,
            blocks: BlockSequence::from_blocks(blocks),
        };

        run.section_ids
            .insert((source.kind, source.legacy_id), section.id);
        run.sections_by_title.insert(title_key, section.id);
        run.redirect(source.full_url, &section_route(source.kind, source.url));
        run.sections.push(section);
        Some(run.sections.len() - 1)
    }

    async fn upload_logo(
        &self,
        run: &Run<'_>,
        url: Option<&str>,
        storage_dir: &str,
    ) -> Option<MediaRef> {
        let uploaded = match url.map(str::trim).filter(|url| !url.is_empty()) {
            Some(url) => self.uploader().upload(url, storage_dir, None).await,
            None => None,
        };
        uploaded.or_else(|| run.placeholder.clone())
    }

    async fn import_news(&self, run: &mut Run<'_>) {
        let export = run.export;
        let mut news: Vec<&NewsExport> = export.news.iter().collect();
        news.sort_by(|a, b| b.id.cmp(&a.id));

        for item in news {
            let slug = format!("{}_{}", item.url, item.id);
            if !run.claim_slug(&slug) {
                continue;
            }

            let path = upload_path(&item.date);
            let short = self
                .segmenter
                .segment(&item.short_text, &path, &run.gallery)
                .await;
            let extended = match item.extended_text() {
                Some(text) => self.segmenter.segment(text, &path, &run.gallery).await,
                None => Vec::new(),
            };

            let post = Post {
                id: Uuid::new_v4(),
                url: slug,
                title: item.title.clone(),
                section_ids: run.resolve_sections(item.sections()),
                tag_ids: Vec::new(),
                author_id: item.author_id,
                is_published: item.is_published(),
                date_added: item.date,
                date_updated: item.last_change_date,
                date_published: item.last_change_date,
                blocks: join_with_cut(short, extended, &self.options.cut),
                publish_records: publish_records(item),
            };
            run.add_post(post, [item.full_url.as_deref()]);
        }
    }

    async fn import_articles(&self, run: &mut Run<'_>) {
        let export = run.export;
        let categories = run.category_info(&export.articles_cats);

        for article in &export.articles {
            let slug = format!("{}_{}", article.url, article.id);
            if !run.claim_slug(&slug) {
                continue;
            }

            let (tag_ids, refs) = match article.cat_id.and_then(|id| categories.get(&id)) {
                Some((tags, refs)) => (tags.clone(), *refs),
                None => {
                    import_warn!("Article {} has no known category", article.id);
                    (
                        Vec::new(),
                        SectionRefs::new(article.developer_id, article.game_id, article.topic_id),
                    )
                }
            };

            let path = upload_path(&article.date);
            let blocks = self
                .segmenter
                .segment(&article.text, &path, &run.gallery)
                .await;

            let post = Post {
                id: Uuid::new_v4(),
                url: slug,
                title: article.title.clone(),
                section_ids: run.resolve_sections(refs),
                tag_ids,
                author_id: article.author_id,
                is_published: article.is_published(),
                date_added: article.date,
                date_updated: article.date,
                date_published: article.date,
                blocks: self.options.cut.apply(blocks),
                publish_records: Vec::new(),
            };
            run.add_post(post, [article.full_url.as_deref()]);
        }
    }

    fn import_files(&self, run: &mut Run<'_>) {
        let export = run.export;
        let categories = run.category_info(&export.files_cats);

        for file in &export.files {
            let slug = format!("{}_{}", file.url, file.id);
            if !run.claim_slug(&slug) {
                continue;
            }

            let mut blocks = BlockSequence::new();
            if let Some(block) = file.description().and_then(ContentBlock::text) {
                blocks.push(block);
            }
            let media = match file.youtube_id() {
                Some(youtube_id) => BlockData::Youtube {
                    youtube_id: youtube_id.to_string(),
                },
                None => BlockData::File {
                    file: MediaRef::existing(
                        &file.link,
                        file.size,
                        file.date.with_timezone(&Utc),
                        &self.options.files_base_url,
                    ),
                },
            };
            blocks.push(ContentBlock::new(media));

            let (tag_ids, refs) = categories
                .get(&file.cat_id)
                .cloned()
                .unwrap_or_else(|| {
                    import_warn!("File {} has no known category", file.id);
                    (
                        Vec::new(),
                        SectionRefs::new(file.developer_id, file.game_id, None),
                    )
                });

            let post = Post {
                id: Uuid::new_v4(),
                url: slug,
                title: file.title.clone(),
                section_ids: run.resolve_sections(refs),
                tag_ids,
                author_id: file.author_id,
                is_published: true,
                date_added: file.date,
                date_updated: file.date,
                date_published: file.date,
                blocks,
                publish_records: Vec::new(),
            };
            run.add_post(post, [file.full_url.as_deref()]);
        }
    }

    /// One post per category per calendar day of the legacy timestamps.
    async fn import_gallery(&self, run: &mut Run<'_>) {
        let export = run.export;
        let categories = run.category_info(&export.gallery_cats);

        for cat in &export.gallery_cats {
            let (tag_ids, refs) = categories.get(&cat.id).cloned().unwrap_or_default();
            let pics = export.gallery_pics.iter().filter(|pic| pic.cat_id == cat.id);

            for (_, day) in group_by_day(pics) {
                let first = day[0];
                let slug = format!("gallery_{}", first.id);
                if !run.claim_slug(&slug) {
                    continue;
                }

                let path = upload_path(&first.date);
                let mut blocks = BlockSequence::new();
                for pic in &day {
                    blocks.extend(self.gallery_blocks(pic, &path).await);
                }

                let post = Post {
                    id: Uuid::new_v4(),
                    url: slug,
                    title: cat.title.clone(),
                    section_ids: run.resolve_sections(refs),
                    tag_ids: tag_ids.clone(),
                    author_id: first.author_id,
                    is_published: true,
                    date_added: first.date,
                    date_updated: first.date,
                    date_published: first.date,
                    blocks,
                    publish_records: Vec::new(),
                };
                let legacy_urls: Vec<Option<&str>> =
                    day.iter().map(|pic| pic.full_url.as_deref()).collect();
                run.add_post(post, legacy_urls);
            }
        }
    }

    /// A picture or gallery block for the entry's files, then its caption.
    async fn gallery_blocks(&self, pic: &GalleryExport, path: &str) -> Vec<ContentBlock> {
        let mut pictures = Vec::with_capacity(pic.files.len());
        for file in &pic.files {
            if let Some(media) = self
                .uploader()
                .upload(&file.url, path, Some(&file.file_name))
                .await
            {
                pictures.push(media);
            }
        }

        let mut blocks = Vec::with_capacity(2);
        blocks.extend(ContentBlock::pictures(pictures));
        blocks.extend(pic.description().and_then(ContentBlock::text));
        blocks
    }
}

fn picture_set(export: &Export) -> PictureSet {
    export
        .gallery_pics
        .iter()
        .map(|pic| {
            let files = pic
                .files
                .iter()
                .map(|file| GalleryFile {
                    url: file.url.clone(),
                    file_name: file.file_name.clone(),
                })
                .collect();
            (pic.id, files)
        })
        .collect()
}

fn upload_path(date: &DateTime<FixedOffset>) -> String {
    format!("posts/{}/{}", date.year(), date.month())
}

fn group_by_day<'e>(
    pics: impl Iterator<Item = &'e GalleryExport>,
) -> Vec<(NaiveDate, Vec<&'e GalleryExport>)> {
    let mut days: Vec<(NaiveDate, Vec<&GalleryExport>)> = Vec::new();
    for pic in pics {
        let day = pic.date.date_naive();
        match days.iter_mut().find(|(d, _)| *d == day) {
            Some((_, group)) => group.push(pic),
            None => days.push((day, vec![pic])),
        }
    }
    days
}

fn publish_records(news: &NewsExport) -> Vec<PublishRecord> {
    let mut records = Vec::new();
    if let Some(tweet_id) = news.twitter_id() {
        records.push(PublishRecord::Twitter { tweet_id });
    }
    if let Some(post_id) = news.facebook_id() {
        records.push(PublishRecord::Facebook {
            post_id: post_id.to_string(),
        });
    }
    if let Some((topic_id, post_id)) = news.forum_ids() {
        records.push(PublishRecord::Forum { topic_id, post_id });
    }
    records
}
