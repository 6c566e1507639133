use scraper::{ElementRef, Html, Selector};

use crate::dom::Document;
use crate::ExtractedMetadata;

/// Where a rule reads its value from once its selector matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Attr(&'static str),
    Text,
    /// The attribute when present and non-blank, else the element text.
    AttrOrText(&'static str),
}

/// One link of a selector chain: a selector paired with a value source.
#[derive(Debug, Clone)]
pub struct MetaRule {
    css: &'static str,
    selector: Selector,
    source: ValueSource,
}

impl MetaRule {
    pub fn new(css: &'static str, source: ValueSource) -> Option<Self> {
        let selector = Selector::parse(css).ok()?;
        Some(Self {
            css,
            selector,
            source,
        })
    }

    pub fn css(&self) -> &str {
        self.css
    }

    /// Value of the first element matching the selector, trimmed.
    /// `None` when nothing matches or the value is blank.
    pub fn apply(&self, html: &Html) -> Option<String> {
        let element = html.select(&self.selector).next()?;
        let value = match self.source {
            ValueSource::Attr(name) => element.value().attr(name)?.to_string(),
            ValueSource::Text => element_text(element),
            ValueSource::AttrOrText(name) => match element.value().attr(name) {
                Some(attr) if !attr.trim().is_empty() => attr.to_string(),
                _ => element_text(element),
            },
        };
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}

fn element_text(element: ElementRef) -> String {
    element.text().collect()
}

/// Ordered rules for one field; the first rule with a value wins.
#[derive(Debug, Clone, Default)]
pub struct RuleChain {
    rules: Vec<MetaRule>,
}

impl RuleChain {
    pub fn new(rules: &[(&'static str, ValueSource)]) -> Self {
        Self {
            rules: rules
                .iter()
                .filter_map(|(css, source)| MetaRule::new(css, *source))
                .collect(),
        }
    }

    pub fn rules(&self) -> &[MetaRule] {
        &self.rules
    }

    pub fn first_match(&self, html: &Html) -> String {
        self.rules
            .iter()
            .find_map(|rule| rule.apply(html))
            .unwrap_or_default()
    }
}

const CONTENT: ValueSource = ValueSource::Attr("content");

pub const TITLE_RULES: &[(&str, ValueSource)] = &[
    (r#"meta[property="og:title"]"#, CONTENT),
    ("title", ValueSource::Text),
];

pub const AUTHOR_RULES: &[(&str, ValueSource)] = &[
    (r#"meta[name="author"]"#, CONTENT),
    (r#"meta[property="article:author"]"#, CONTENT),
    (".author", ValueSource::Text),
    (".byline", ValueSource::Text),
    (r#"[rel="author"]"#, ValueSource::Text),
];

pub const PUBLISH_DATE_RULES: &[(&str, ValueSource)] = &[
    (r#"meta[property="article:published_time"]"#, CONTENT),
    (r#"meta[name="date"]"#, CONTENT),
    ("time[datetime]", ValueSource::Attr("datetime")),
    (".publish-date", ValueSource::AttrOrText("content")),
    (".date", ValueSource::AttrOrText("content")),
];

pub const DESCRIPTION_RULES: &[(&str, ValueSource)] = &[
    (r#"meta[property="og:description"]"#, CONTENT),
    (r#"meta[name="description"]"#, CONTENT),
];

pub const SITE_NAME_RULES: &[(&str, ValueSource)] =
    &[(r#"meta[property="og:site_name"]"#, CONTENT)];

#[derive(Debug, Clone)]
pub struct MetadataExtractor {
    title: RuleChain,
    author: RuleChain,
    publish_date: RuleChain,
    description: RuleChain,
    site_name: RuleChain,
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self {
            title: RuleChain::new(TITLE_RULES),
            author: RuleChain::new(AUTHOR_RULES),
            publish_date: RuleChain::new(PUBLISH_DATE_RULES),
            description: RuleChain::new(DESCRIPTION_RULES),
            site_name: RuleChain::new(SITE_NAME_RULES),
        }
    }

    pub fn extract(&self, document: &Document) -> ExtractedMetadata {
        let html = document.html();
        ExtractedMetadata {
            title: self.title.first_match(html),
            author: self.author.first_match(html),
            publish_date: self.publish_date.first_match(html),
            description: self.description.first_match(html),
            site_name: self.site_name.first_match(html),
        }
    }
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}
