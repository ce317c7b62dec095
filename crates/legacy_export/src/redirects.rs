use std::collections::BTreeMap;
use std::fmt::Write;

/// Old path to new route, rendered as the body of an nginx `map` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectMap {
    entries: BTreeMap<String, String>,
}

impl RedirectMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `old -> new`. Pairs that point to themselves are skipped and the
    /// first target recorded for a path wins. Returns whether it was added.
    pub fn insert(&mut self, old: &str, new: &str) -> bool {
        let (old, new) = (old.trim(), new.trim());
        if old.is_empty() || new.is_empty() || old == new || self.entries.contains_key(old) {
            return false;
        }
        self.entries.insert(old.to_string(), new.to_string());
        true
    }

    pub fn get(&self, old: &str) -> Option<&str> {
        self.entries.get(old).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One `<old> <new>;` line per entry, sorted by old path.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (old, new) in &self.entries {
            let _ = writeln!(out, "{} {};", quote(old), quote(new));
        }
        out
    }
}

fn quote(value: &str) -> String {
    if value.contains(|c: char| c.is_whitespace() || matches!(c, ';' | '"' | '{' | '}')) {
        format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        value.to_string()
    }
}
