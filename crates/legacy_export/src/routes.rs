use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SectionKind {
    Developer,
    Game,
    Topic,
}

impl SectionKind {
    /// Route prefix and storage directory name.
    pub fn plural(self) -> &'static str {
        match self {
            SectionKind::Developer => "developers",
            SectionKind::Game => "games",
            SectionKind::Topic => "topics",
        }
    }

    /// Where section logos are uploaded.
    pub fn storage_dir(self) -> String {
        format!("sections/{}", self.plural())
    }
}

pub fn post_route(slug: &str) -> String {
    format!("/posts/{slug}.html")
}

pub fn section_route(kind: SectionKind, url: &str) -> String {
    format!("/{}/{url}.html", kind.plural())
}

/// Path and query of a legacy full URL, always starting with `/`.
///
/// Absolute URLs lose their scheme and host; anything else is taken as a
/// site-relative path. Blank input has no path.
pub fn legacy_path(full_url: &str) -> Option<String> {
    let full_url = full_url.trim();
    if full_url.is_empty() {
        return None;
    }

    let parsed = if full_url.starts_with("//") {
        Url::parse(&format!("https:{full_url}")).ok()
    } else {
        Url::parse(full_url).ok()
    };

    let path = match parsed {
        Some(url) if url.has_host() => match url.query() {
            Some(query) => format!("{}?{query}", url.path()),
            None => url.path().to_string(),
        },
        _ if full_url.starts_with('/') => full_url.to_string(),
        _ => format!("/{full_url}"),
    };
    Some(path)
}
