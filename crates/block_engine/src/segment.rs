//! Legacy HTML to content blocks.
//!
//! A document is parsed into top-level nodes, loose inline runs are wrapped
//! into synthetic paragraphs, and every node is dispatched on its
//! [`NodeKind`]. Paragraph containers are walked twice: the first pass pulls
//! images and iframes out into a side list and leaves a placeholder token
//! where each one stood, the second pass stitches text runs and extracted
//! blocks back together in document order.
//!
//! Nothing in here fails the whole document. A media item that cannot be
//! fetched is dropped and the rest of the document carries on.

use std::sync::Arc;

use import_logging::{import_debug, import_warn};
use url::Url;

use crate::fragment::{classify, normalize_entities, parse_fragment, regroup_inline};
use crate::{
    classify_embed, ContentBlock, ElementNode, FragmentNode, InlineMediaResolver, MediaRef,
    MediaUploader, NodeKind, PictureSet,
};

const SOFT_BREAKS: &[&str] = &["<br>", "<br/>", "<br />"];

#[derive(Debug, Clone, Default)]
pub struct SegmenterSettings {
    /// Base for site-relative image sources.
    pub base_url: Option<Url>,
}

pub struct HtmlSegmenter {
    uploader: Arc<MediaUploader>,
    resolver: InlineMediaResolver,
}

/// A child pulled out of a paragraph container.
#[derive(Debug)]
enum Extracted {
    Picture(MediaRef),
    Block(ContentBlock),
}

/// A paragraph child after the extraction pass.
#[derive(Debug)]
enum Token<'a> {
    Markup(&'a FragmentNode),
    /// Index into the extracted side list.
    Placeholder(usize),
}

impl HtmlSegmenter {
    pub fn new(uploader: Arc<MediaUploader>, settings: SegmenterSettings) -> Self {
        Self {
            uploader,
            resolver: InlineMediaResolver::new(settings.base_url),
        }
    }

    pub fn uploader(&self) -> &Arc<MediaUploader> {
        &self.uploader
    }

    /// Splits `html` into ordered content blocks. Media is stored under
    /// `upload_path`; gallery thumbnails are looked up in `gallery`.
    pub async fn segment(
        &self,
        html: &str,
        upload_path: &str,
        gallery: &PictureSet,
    ) -> Vec<ContentBlock> {
        let nodes = regroup_inline(parse_fragment(&normalize_entities(html)));
        let mut blocks = Vec::new();
        for node in &nodes {
            blocks.extend(self.segment_node(node, upload_path, gallery).await);
        }
        blocks
    }

    /// Blocks for one top-level node.
    pub async fn segment_node(
        &self,
        node: &FragmentNode,
        upload_path: &str,
        gallery: &PictureSet,
    ) -> Vec<ContentBlock> {
        match (classify(node), node) {
            (NodeKind::Paragraph, FragmentNode::Text(_)) if node.visible_text().is_empty() => {
                Vec::new()
            }
            (NodeKind::Paragraph, FragmentNode::Text(text)) => {
                ContentBlock::text(text).into_iter().collect()
            }
            (NodeKind::Paragraph, FragmentNode::Element(element)) => {
                self.paragraph_blocks(element, upload_path, gallery).await
            }
            (NodeKind::Quote, FragmentNode::Element(_)) if node.visible_text().is_empty() => {
                Vec::new()
            }
            (NodeKind::Quote, FragmentNode::Element(element)) => {
                ContentBlock::quote(&element.inner_html).into_iter().collect()
            }
            (NodeKind::Embed, FragmentNode::Element(element)) => {
                embed_block(element).into_iter().collect()
            }
            (NodeKind::Image, FragmentNode::Element(element)) => self
                .upload_image(element, upload_path, gallery)
                .await
                .map(|picture| ContentBlock::new(crate::BlockData::Picture { picture }))
                .into_iter()
                .collect(),
            (NodeKind::List, FragmentNode::Element(element)) => {
                ContentBlock::text(&element.outer_html).into_iter().collect()
            }
            (kind, node) => {
                import_warn!(
                    "Unrecognized node {:?} ({:?}), skipping",
                    node.name().unwrap_or("#text"),
                    kind
                );
                Vec::new()
            }
        }
    }

    async fn paragraph_blocks(
        &self,
        container: &ElementNode,
        upload_path: &str,
        gallery: &PictureSet,
    ) -> Vec<ContentBlock> {
        let mut extracted = Vec::new();
        let mut tokens = Vec::with_capacity(container.children.len());

        for child in &container.children {
            match self.extract_child(child, upload_path, gallery).await {
                Some(item) => {
                    extracted.push(item);
                    tokens.push(Token::Placeholder(extracted.len() - 1));
                }
                None => tokens.push(Token::Markup(child)),
            }
        }

        assemble(tokens, extracted)
    }

    async fn extract_child(
        &self,
        child: &FragmentNode,
        upload_path: &str,
        gallery: &PictureSet,
    ) -> Option<Extracted> {
        let FragmentNode::Element(element) = child else {
            return None;
        };
        match element.name.as_str() {
            "img" => self
                .upload_image(element, upload_path, gallery)
                .await
                .map(Extracted::Picture),
            "iframe" => embed_block(element).map(Extracted::Block),
            _ => None,
        }
    }

    async fn upload_image(
        &self,
        element: &ElementNode,
        upload_path: &str,
        gallery: &PictureSet,
    ) -> Option<MediaRef> {
        let Some(src) = element.src() else {
            import_debug!("Image without src: {}", element.outer_html);
            return None;
        };
        let resolved = self.resolver.resolve(src, gallery);
        self.uploader
            .upload(&resolved.url, upload_path, resolved.file_name.as_deref())
            .await
    }
}

fn embed_block(element: &ElementNode) -> Option<ContentBlock> {
    match element.src() {
        Some(src) => Some(ContentBlock::new(classify_embed(src))),
        None => {
            import_warn!("Iframe without src, skipping: {}", element.outer_html);
            None
        }
    }
}

/// Second pass: text runs and extracted blocks in document order.
///
/// Children with no visible text are dropped, except line breaks inside a
/// run. Adjacent pictures with nothing visible between them form one group.
fn assemble(tokens: Vec<Token<'_>>, extracted: Vec<Extracted>) -> Vec<ContentBlock> {
    let mut slots: Vec<Option<Extracted>> = extracted.into_iter().map(Some).collect();
    let mut blocks = Vec::new();
    let mut text = String::new();
    let mut pictures = Vec::new();

    for token in tokens {
        match token {
            Token::Markup(node) => {
                if node.visible_text().is_empty() {
                    if is_soft_break(node) && !text.is_empty() {
                        text.push_str(node.html());
                    }
                    continue;
                }
                flush_pictures(&mut pictures, &mut blocks);
                text.push_str(node.html());
            }
            Token::Placeholder(index) => match slots.get_mut(index).and_then(Option::take) {
                Some(Extracted::Picture(picture)) => {
                    flush_text(&mut text, &mut blocks);
                    pictures.push(picture);
                }
                Some(Extracted::Block(block)) => {
                    flush_text(&mut text, &mut blocks);
                    flush_pictures(&mut pictures, &mut blocks);
                    blocks.push(block);
                }
                None => {}
            },
        }
    }
    flush_text(&mut text, &mut blocks);
    flush_pictures(&mut pictures, &mut blocks);

    blocks
}

fn is_soft_break(node: &FragmentNode) -> bool {
    node.name() == Some("br")
}

fn flush_text(text: &mut String, blocks: &mut Vec<ContentBlock>) {
    let run = std::mem::take(text);
    if let Some(block) = ContentBlock::text(strip_soft_breaks(&run)) {
        blocks.push(block);
    }
}

fn flush_pictures(pictures: &mut Vec<MediaRef>, blocks: &mut Vec<ContentBlock>) {
    if let Some(block) = ContentBlock::pictures(std::mem::take(pictures)) {
        blocks.push(block);
    }
}

fn strip_soft_breaks(run: &str) -> &str {
    let mut rest = run.trim();
    loop {
        let before = rest.len();
        for br in SOFT_BREAKS {
            if let Some(stripped) = rest.strip_prefix(br) {
                rest = stripped.trim_start();
            }
            if let Some(stripped) = rest.strip_suffix(br) {
                rest = stripped.trim_end();
            }
        }
        if rest.len() == before {
            return rest;
        }
    }
}
