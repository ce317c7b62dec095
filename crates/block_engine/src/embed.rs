use url::Url;

use crate::BlockData;

/// Classifies an iframe `src` as YouTube, Twitch or an opaque iframe.
///
/// A source that does not parse as a URL is never an error: it becomes a
/// plain iframe carrying the original string.
pub fn classify_embed(src: &str) -> BlockData {
    let src = src.trim();
    let Some(url) = parse_embed_url(src) else {
        return BlockData::Iframe {
            src: src.to_string(),
        };
    };

    if is_youtube_embed(&url) {
        if let Some(youtube_id) = youtube_id(&url) {
            return BlockData::Youtube { youtube_id };
        }
    }

    if is_twitch_player(&url) {
        return BlockData::Twitch {
            video_id: query_value(&url, "video"),
            channel_id: query_value(&url, "channel"),
            collection_id: query_value(&url, "collection"),
        };
    }

    BlockData::Iframe {
        src: src.to_string(),
    }
}

fn parse_embed_url(src: &str) -> Option<Url> {
    if src.starts_with("//") {
        return Url::parse(&format!("https:{src}")).ok();
    }
    Url::parse(src).ok()
}

fn host(url: &Url) -> String {
    url.host_str()
        .map(|h| h.trim_start_matches("www.").to_ascii_lowercase())
        .unwrap_or_default()
}

fn is_youtube_embed(url: &Url) -> bool {
    matches!(host(url).as_str(), "youtube.com" | "youtube-nocookie.com")
        && url.path().starts_with("/embed")
}

fn youtube_id(url: &Url) -> Option<String> {
    query_value(url, "v").or_else(|| {
        url.path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::trim)
            .filter(|segment| !segment.is_empty() && *segment != "embed")
            .map(str::to_string)
    })
}

fn is_twitch_player(url: &Url) -> bool {
    host(url) == "player.twitch.tv"
}

fn query_value(url: &Url, key: &str) -> Option<String> {
    url.query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
