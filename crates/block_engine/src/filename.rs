use sha2::{Digest, Sha256};
use url::Url;

/// Last path segment of `url`, percent-decoded, ignoring query and fragment.
/// `None` when the URL ends in a directory or has no path at all.
/// Sources that do not parse as URLs are taken as relative paths.
pub fn derive_file_name(url: &str) -> Option<String> {
    let url = url.trim();
    let parsed = if url.starts_with("//") {
        Url::parse(&format!("https:{url}"))
    } else {
        Url::parse(url)
    };
    let segment = match parsed {
        Ok(parsed) => parsed.path_segments()?.next_back()?.to_string(),
        Err(_) => relative_last_segment(url).to_string(),
    };
    let decoded = urlencoding::decode(&segment)
        .map(|name| name.into_owned())
        .unwrap_or_else(|_| segment.clone());
    let name = decoded.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn relative_last_segment(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.rsplit('/').next().unwrap_or(path)
}

/// Storage-safe, deterministic file name: `{sanitized_stem}-{short_hash(bytes)}.{ext}`.
/// Identical payloads stored under the same name land on the same path.
pub fn stored_file_name(file_name: &str, bytes: &[u8]) -> String {
    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (file_name, None),
    };
    let sanitized = sanitize_stem(stem);
    let hash = short_hash(bytes);
    match ext.map(sanitize_extension).filter(|e| !e.is_empty()) {
        Some(ext) => format!("{sanitized}-{hash}.{ext}"),
        None => format!("{sanitized}-{hash}"),
    }
}

fn sanitize_stem(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "file".to_string();
    }
    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    truncate_on_char_boundary(&mut compacted, 80);
    compacted
}

fn sanitize_extension(ext: &str) -> String {
    ext.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(10)
        .collect::<String>()
        .to_ascii_lowercase()
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '%' | '#' | ' ' | '\0'..='\u{1F}'
    )
}

fn truncate_on_char_boundary(value: &mut String, max: usize) {
    if value.len() <= max {
        return;
    }
    let mut end = max;
    while end > 0 && !value.is_char_boundary(end) {
        end -= 1;
    }
    value.truncate(end);
}

fn short_hash(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    let digest = hasher.finalize();
    digest
        .iter()
        .take(4)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
