//! Owned view of a parsed legacy HTML fragment.
//!
//! The segmenter awaits network IO while it walks a document, so it works on
//! this owned tree instead of borrowing the parser's DOM across await points.

use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::{ElementRef, Html};

/// Double-escaped entities found in the legacy export, and what they should
/// have been.
const DOUBLE_ESCAPED: &[(&str, &str)] = &[
    ("&amp;nbsp;", "&nbsp;"),
    ("&amp;ndash;", "&ndash;"),
    ("&amp;mdash;", "&mdash;"),
    ("&amp;quot;", "&quot;"),
    ("&amp;quote;", "&quot;"),
    ("&amp;laquo;", "&laquo;"),
    ("&amp;raquo;", "&raquo;"),
];

const INLINE_TAGS: &[&str] = &[
    "a", "span", "em", "strong", "b", "i", "u", "s", "h1", "h2", "h3", "h4", "h5", "h6", "small",
    "del", "sup", "sub", "br", "script", "style", "font",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FragmentNode {
    /// Text content, already escaped for re-emission as HTML.
    Text(String),
    Element(ElementNode),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub outer_html: String,
    pub inner_html: String,
    /// Decoded visible text of the whole subtree.
    pub text: String,
    pub children: Vec<FragmentNode>,
}

/// What the segmenter does with a top-level node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Paragraph,
    Quote,
    Embed,
    Image,
    List,
    Unknown,
}

impl FragmentNode {
    pub fn text(raw: &str) -> Self {
        FragmentNode::Text(escape_text(raw))
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            FragmentNode::Text(_) => None,
            FragmentNode::Element(element) => Some(&element.name),
        }
    }

    pub fn html(&self) -> &str {
        match self {
            FragmentNode::Text(text) => text,
            FragmentNode::Element(element) => &element.outer_html,
        }
    }

    /// Visible text with non-breaking spaces removed and surrounding
    /// whitespace trimmed.
    pub fn visible_text(&self) -> String {
        let raw = match self {
            FragmentNode::Text(text) => unescape_text(text),
            FragmentNode::Element(element) => element.text.clone(),
        };
        raw.replace("&nbsp;", " ")
            .replace('\u{a0}', " ")
            .trim()
            .to_string()
    }

    pub fn is_inline(&self) -> bool {
        match self {
            FragmentNode::Text(_) => true,
            FragmentNode::Element(element) => INLINE_TAGS.contains(&element.name.as_str()),
        }
    }
}

impl ElementNode {
    /// Builds an element and serializes it from its parts.
    pub fn new(name: &str, attrs: &[(&str, &str)], children: Vec<FragmentNode>) -> Self {
        let name = name.to_ascii_lowercase();
        let attrs: Vec<(String, String)> = attrs
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.to_string()))
            .collect();

        let inner_html: String = children.iter().map(FragmentNode::html).collect();
        let text: String = children.iter().map(node_text).collect();

        let mut outer_html = format!("<{name}");
        for (key, value) in &attrs {
            outer_html.push_str(&format!(" {key}=\"{}\"", escape_attr(value)));
        }
        outer_html.push('>');
        if !is_void(&name) {
            outer_html.push_str(&inner_html);
            outer_html.push_str(&format!("</{name}>"));
        }

        Self {
            name,
            attrs,
            outer_html,
            inner_html,
            text,
            children,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    /// Non-empty, trimmed `src` attribute.
    pub fn src(&self) -> Option<&str> {
        self.attr("src").map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Repairs the double-escaped entities the legacy export is full of.
pub fn normalize_entities(html: &str) -> String {
    let mut normalized = html.to_string();
    for (escaped, entity) in DOUBLE_ESCAPED {
        if normalized.contains(escaped) {
            normalized = normalized.replace(escaped, entity);
        }
    }
    normalized
}

/// Parses `html` as a body fragment and returns its top-level nodes.
pub fn parse_fragment(html: &str) -> Vec<FragmentNode> {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .children()
        .filter_map(convert_node)
        .collect()
}

fn convert_node(node: NodeRef<'_, Node>) -> Option<FragmentNode> {
    match node.value() {
        Node::Text(text) => Some(FragmentNode::text(text)),
        Node::Element(_) => ElementRef::wrap(node).map(|element| {
            let value = element.value();
            FragmentNode::Element(ElementNode {
                name: value.name().to_ascii_lowercase(),
                attrs: value
                    .attrs()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
                outer_html: element.html(),
                inner_html: element.inner_html(),
                text: element.text().collect(),
                children: element.children().filter_map(convert_node).collect(),
            })
        }),
        // comments, doctypes, processing instructions
        _ => None,
    }
}

/// Wraps runs of inline siblings that sit outside any block container into
/// synthetic `<div>` groups. A run made of a single text node stays bare.
/// Block-level siblings end the current run and are kept as they are.
pub fn regroup_inline(nodes: Vec<FragmentNode>) -> Vec<FragmentNode> {
    let mut grouped = Vec::with_capacity(nodes.len());
    let mut run: Vec<FragmentNode> = Vec::new();

    for node in nodes {
        if node.is_inline() {
            run.push(node);
        } else {
            flush_run(&mut run, &mut grouped);
            grouped.push(node);
        }
    }
    flush_run(&mut run, &mut grouped);

    grouped
}

fn flush_run(run: &mut Vec<FragmentNode>, grouped: &mut Vec<FragmentNode>) {
    if run.is_empty() {
        return;
    }
    let children = std::mem::take(run);
    if children.len() == 1 && matches!(children[0], FragmentNode::Text(_)) {
        grouped.extend(children);
    } else {
        grouped.push(FragmentNode::Element(ElementNode::new("div", &[], children)));
    }
}

pub fn classify(node: &FragmentNode) -> NodeKind {
    match node {
        FragmentNode::Text(_) => NodeKind::Paragraph,
        FragmentNode::Element(element) => match element.name.as_str() {
            "p" | "div" => NodeKind::Paragraph,
            "blockquote" => NodeKind::Quote,
            "iframe" => NodeKind::Embed,
            "img" => NodeKind::Image,
            "ul" | "ol" | "table" => NodeKind::List,
            _ => NodeKind::Unknown,
        },
    }
}

fn node_text(node: &FragmentNode) -> String {
    match node {
        FragmentNode::Text(escaped) => unescape_text(escaped),
        FragmentNode::Element(element) => element.text.clone(),
    }
}

fn is_void(name: &str) -> bool {
    matches!(
        name,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta"
            | "source" | "track" | "wbr"
    )
}

/// Same escaping html5ever applies when serializing text.
fn escape_text(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '\u{a0}' => escaped.push_str("&nbsp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

fn unescape_text(escaped: &str) -> String {
    escaped
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&nbsp;", "\u{a0}")
        .replace("&amp;", "&")
}

fn escape_attr(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(nodes: &[FragmentNode]) -> Vec<Option<&str>> {
        nodes.iter().map(FragmentNode::name).collect()
    }

    #[test]
    fn double_escaped_entities_are_repaired() {
        assert_eq!(
            normalize_entities("a&amp;nbsp;b &amp;laquo;q&amp;raquo; &amp;amp;"),
            "a&nbsp;b &laquo;q&raquo; &amp;amp;"
        );
    }

    #[test]
    fn parse_keeps_top_level_order() {
        let nodes = parse_fragment("<p>one</p><blockquote><p>two</p></blockquote><img src=\"x.jpg\">");
        assert_eq!(names(&nodes), vec![Some("p"), Some("blockquote"), Some("img")]);

        let FragmentNode::Element(quote) = &nodes[1] else {
            panic!("expected element");
        };
        assert_eq!(quote.inner_html, "<p>two</p>");
        assert_eq!(quote.text, "two");
    }

    #[test]
    fn comments_are_dropped() {
        let nodes = parse_fragment("<!-- note --><p>x</p>");
        assert_eq!(names(&nodes), vec![Some("p")]);
    }

    #[test]
    fn text_is_escaped_like_the_serializer() {
        let nodes = parse_fragment("a &amp; b&nbsp;c");
        assert_eq!(nodes, vec![FragmentNode::Text("a &amp; b&nbsp;c".into())]);
        assert_eq!(nodes[0].visible_text(), "a & b c");
    }

    #[test]
    fn inline_runs_become_synthetic_groups() {
        let nodes = parse_fragment("Intro <br><br> more <b>bold</b><p>para</p>tail");
        let grouped = regroup_inline(nodes);

        assert_eq!(names(&grouped), vec![Some("div"), Some("p"), None]);
        let FragmentNode::Element(group) = &grouped[0] else {
            panic!("expected synthetic group");
        };
        assert_eq!(group.children.len(), 5);
        assert!(group.inner_html.starts_with("Intro <br>"));
        assert_eq!(grouped[2], FragmentNode::Text("tail".into()));
    }

    #[test]
    fn block_level_siblings_split_runs() {
        let nodes = vec![
            FragmentNode::text("a"),
            FragmentNode::Element(ElementNode::new("span", &[], vec![FragmentNode::text("b")])),
            FragmentNode::Element(ElementNode::new("img", &[("src", "x.jpg")], Vec::new())),
            FragmentNode::text("c"),
            FragmentNode::Element(ElementNode::new("em", &[], vec![FragmentNode::text("d")])),
        ];
        let grouped = regroup_inline(nodes);
        assert_eq!(names(&grouped), vec![Some("div"), Some("img"), Some("div")]);
    }

    #[test]
    fn classification_covers_every_kind() {
        let element = |name: &str| FragmentNode::Element(ElementNode::new(name, &[], Vec::new()));
        assert_eq!(classify(&FragmentNode::text("x")), NodeKind::Paragraph);
        assert_eq!(classify(&element("div")), NodeKind::Paragraph);
        assert_eq!(classify(&element("blockquote")), NodeKind::Quote);
        assert_eq!(classify(&element("iframe")), NodeKind::Embed);
        assert_eq!(classify(&element("img")), NodeKind::Image);
        assert_eq!(classify(&element("table")), NodeKind::List);
        assert_eq!(classify(&element("hr")), NodeKind::Unknown);
    }

    #[test]
    fn hand_built_elements_serialize() {
        let img = ElementNode::new("IMG", &[("src", "a\"b.jpg")], Vec::new());
        assert_eq!(img.outer_html, "<img src=\"a&quot;b.jpg\">");
        assert_eq!(img.src(), Some("a\"b.jpg"));

        let p = ElementNode::new("p", &[], vec![FragmentNode::text("x < y")]);
        assert_eq!(p.outer_html, "<p>x &lt; y</p>");
        assert_eq!(p.text, "x < y");
    }
}
