use std::fs;
use std::path::Path;

use legacy_export::{
    category_path, legacy_path, parse_export, read_export, Category, ExportError, RedirectMap,
    SectionRefs, TagRegistry,
};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

const FIXTURE: &str = "tests/fixtures/export.json";

fn fixture_bytes() -> Vec<u8> {
    fs::read(Path::new(env!("CARGO_MANIFEST_DIR")).join(FIXTURE)).unwrap()
}

#[test]
fn fixture_parses_every_collection() {
    let export = parse_export(&fixture_bytes()).unwrap();

    assert_eq!(export.developers.len(), 1);
    assert_eq!(export.games[0].developer_id(), Some(1));
    assert_eq!(export.games[0].hashtag(), Some("#Anthem"));
    assert_eq!(export.topics[0].logo, None);
    assert_eq!(export.articles_cats.len(), 2);
    assert_eq!(export.files[0].youtube_id(), Some("8bHwTDl231A"));
    assert_eq!(export.gallery_pics[0].files[0].file_name, "a.jpg");

    let news = &export.news[0];
    assert!(news.is_published());
    assert_eq!(
        news.sections(),
        SectionRefs {
            developer_id: None,
            game_id: Some(3),
            topic_id: None
        }
    );
    assert_eq!(news.twitter_id(), Some(1101));
    assert_eq!(news.facebook_id(), Some("fb_1"));
    assert_eq!(news.forum_ids(), Some((100, 200)));
    assert_eq!(news.extended_text(), Some("<p>Long</p>"));
    assert!(!export.articles[0].is_published());
}

#[test]
fn missing_collections_default_to_empty() {
    let export = parse_export(b"{\"news\": []}").unwrap();
    assert!(export.developers.is_empty());
    assert!(export.gallery_pics.is_empty());
}

#[test]
fn malformed_json_is_reported() {
    let err = parse_export(b"{\"news\": [").unwrap_err();
    assert!(matches!(err, ExportError::Json(_)));
}

#[test]
fn read_export_from_disk() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("export.json");
    fs::write(&path, fixture_bytes()).unwrap();

    let export = read_export(&path).unwrap();
    assert_eq!(export.news[0].title, "Patch");

    let err = read_export(&temp.path().join("missing.json")).unwrap_err();
    assert!(matches!(err, ExportError::Io(_)));
}

#[test]
fn article_categories_flatten_into_shared_tags() {
    let export = parse_export(&fixture_bytes()).unwrap();
    let guides = &export.articles_cats[1];

    let path = category_path(&export.articles_cats, guides);
    assert_eq!(path, vec!["Anthem", "Guides"]);

    let mut registry = TagRegistry::new();
    let ids = registry.tags_for_path(&path);
    // The game's category title doubles as a gallery tag title.
    let again = registry.tags_for_path(&["Anthem".to_string()]);
    assert_eq!(ids[0], again[0]);
    assert_eq!(registry.len(), 2);

    assert_eq!(export.articles_cats[0].sections().game_id, Some(3));
    assert_eq!(guides.parent_id(), Some(5));
}

#[test]
fn redirects_from_legacy_urls() {
    let export = parse_export(&fixture_bytes()).unwrap();
    let mut map = RedirectMap::new();
    for news in &export.news {
        let old = news.full_url.as_deref().and_then(legacy_path).unwrap();
        map.insert(&old, &legacy_export::post_route(&format!("{}_{}", news.url, news.id)));
    }
    assert_eq!(
        map.render(),
        "/2019/03/01/anthem_patch.html /posts/anthem_patch_10.html;\n"
    );
}
