use extract_logging::{extract_debug, StageTimer};
use scraper::ElementRef;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::content::{ContentSelection, ContentSelector};
use crate::dom::Document;
use crate::images::ImageCollector;
use crate::metadata::MetadataExtractor;
use crate::sanitize::Sanitizer;
use crate::text::{element_text, normalize_lines};
use crate::ExtractionResult;

/// Tried in order; the first selector matching anything picks the body.
pub const DEFAULT_CONTENT_SELECTORS: &[&str] = &[
    "article",
    r#"[role="main"]"#,
    ".main-content",
    ".post-content",
    ".entry-content",
    ".article-content",
    ".content",
    "main",
    "#content",
    ".post-body",
    ".article-body",
    ".main",
];

/// Fewest paragraphs a container needs before the density scan trusts it.
pub const DEFAULT_MIN_PARAGRAPHS: usize = 3;

/// `ins` is the usual ad-slot marker.
pub const DEFAULT_DENIED_TAGS: &[&str] = &[
    "script", "style", "noscript", "nav", "header", "footer", "aside", "ins", "iframe",
];

pub const DEFAULT_DENIED_TERMS: &[&str] =
    &["ad", "advertisement", "social", "share", "comment", "sidebar"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid selector {selector:?}: {message}")]
    InvalidSelector { selector: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionSettings {
    pub content_selectors: Vec<String>,
    pub min_paragraphs: usize,
    pub denied_tags: Vec<String>,
    pub denied_terms: Vec<String>,
    pub max_images: Option<usize>,
}

impl Default for ExtractionSettings {
    fn default() -> Self {
        fn owned(list: &[&str]) -> Vec<String> {
            list.iter().map(|s| s.to_string()).collect()
        }
        Self {
            content_selectors: owned(DEFAULT_CONTENT_SELECTORS),
            min_paragraphs: DEFAULT_MIN_PARAGRAPHS,
            denied_tags: owned(DEFAULT_DENIED_TAGS),
            denied_terms: owned(DEFAULT_DENIED_TERMS),
            max_images: None,
        }
    }
}

/// The pure part of an extraction: everything after the page has been parsed.
///
/// Holds only compiled, immutable configuration, so one instance can serve any
/// number of concurrent extractions and always gives the same answer for the
/// same input.
#[derive(Debug, Clone)]
pub struct ArticleExtractor {
    metadata: MetadataExtractor,
    content: ContentSelector,
    sanitizer: Sanitizer,
    images: ImageCollector,
}

impl ArticleExtractor {
    pub fn new(settings: &ExtractionSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            metadata: MetadataExtractor::new(),
            content: ContentSelector::new(&settings.content_selectors, settings.min_paragraphs)?,
            sanitizer: Sanitizer::new(&settings.denied_tags, &settings.denied_terms),
            images: ImageCollector::new(settings.max_images),
        })
    }

    /// Parses `markup` and extracts it as if it had been fetched from `url`.
    pub fn extract_html(&self, markup: &str, url: &str) -> ExtractionResult {
        let document = Document::parse(markup);
        let base_url = Url::parse(url).ok();
        self.extract_document(&document, url, base_url.as_ref())
    }

    /// `url` is reported back verbatim; `base_url` (normally the address after
    /// redirects) anchors relative image sources.
    pub fn extract_document(
        &self,
        document: &Document,
        url: &str,
        base_url: Option<&Url>,
    ) -> ExtractionResult {
        let metadata = {
            let _timer = StageTimer::new("metadata", url);
            self.metadata.extract(document)
        };

        let (content, html_content) = {
            let _timer = StageTimer::new("content", url);
            let selection = self.content.select(document);
            extract_debug!("article body of {url}: {selection}");
            self.render_selection(document, &selection)
        };

        let images = {
            let _timer = StageTimer::new("images", url);
            self.images.collect(document, base_url)
        };

        if metadata.title.is_empty() || content.is_empty() {
            extract_debug!(
                "degraded extraction for {url}: title {}, content {} chars",
                if metadata.title.is_empty() { "missing" } else { "present" },
                content.len()
            );
        }

        ExtractionResult {
            url: url.to_string(),
            metadata,
            content,
            html_content,
            images,
        }
    }

    /// Plain text from the untouched subtree, HTML from its sanitized copy.
    fn render_selection(&self, document: &Document, selection: &ContentSelection) -> (String, String) {
        let html = document.html();
        match selection {
            ContentSelection::Selector { node, .. } | ContentSelection::Densest { node, .. } => {
                let text = html
                    .tree
                    .get(*node)
                    .and_then(ElementRef::wrap)
                    .map(element_text)
                    .unwrap_or_default();
                (text, self.sanitizer.inner_html(html, *node))
            }
            ContentSelection::Paragraphs(nodes) => {
                let joined = nodes
                    .iter()
                    .filter_map(|id| html.tree.get(*id).and_then(ElementRef::wrap))
                    .map(element_text)
                    .collect::<Vec<_>>()
                    .join("\n");
                let markup = self.sanitizer.outer_html(html, nodes).join("\n");
                (normalize_lines(&joined), markup)
            }
        }
    }
}
