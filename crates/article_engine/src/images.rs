use extract_logging::extract_debug;
use scraper::Selector;
use url::Url;

use crate::dom::Document;
use crate::ImageRecord;

/// Collects every `<img>` with a usable `src`, in document order.
#[derive(Debug, Clone)]
pub struct ImageCollector {
    selector: Option<Selector>,
    max_images: Option<usize>,
}

impl ImageCollector {
    pub fn new(max_images: Option<usize>) -> Self {
        Self {
            selector: Selector::parse("img[src]").ok(),
            max_images,
        }
    }

    pub fn collect(&self, document: &Document, base_url: Option<&Url>) -> Vec<ImageRecord> {
        let Some(selector) = self.selector.as_ref() else {
            return Vec::new();
        };
        let limit = self.max_images.unwrap_or(usize::MAX);

        document
            .html()
            .select(selector)
            .filter_map(|img| {
                let element = img.value();
                let raw = element.attr("src")?;
                let src = resolve_image_src(raw, base_url)?;
                Some(ImageRecord {
                    src,
                    alt: element.attr("alt").unwrap_or_default().to_string(),
                    title: element.attr("title").unwrap_or_default().to_string(),
                })
            })
            .take(limit)
            .collect()
    }
}

impl Default for ImageCollector {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Makes an image `src` absolute.
///
/// 1. `//host/path` gets an `https:` scheme.
/// 2. `/path` is resolved against the base URL's authority.
/// 3. anything that is not already an absolute `http:`/`https:` URL is joined
///    onto the base URL.
/// 4. absolute `http:`/`https:` URLs are returned unchanged.
///
/// Inline `data:` images and references that cannot be made absolute are dropped.
pub fn resolve_image_src(raw: &str, base_url: Option<&Url>) -> Option<String> {
    let src = raw.trim();
    if src.is_empty() || has_scheme_prefix(src, "data:") {
        return None;
    }

    if src.starts_with("//") {
        return Some(format!("https:{src}"));
    }
    if has_scheme_prefix(src, "http:") || has_scheme_prefix(src, "https:") {
        if Url::parse(src).is_ok() {
            return Some(src.to_string());
        }
        extract_debug!("skipping image with malformed absolute src {src:?}");
        return None;
    }

    // Both the root-relative and the path-relative case are plain RFC 3986 joins.
    let resolved = base_url.and_then(|base| base.join(src).ok());
    if resolved.is_none() {
        extract_debug!("skipping image with unresolvable src {src:?}");
    }
    resolved.map(String::from)
}

fn has_scheme_prefix(src: &str, prefix: &str) -> bool {
    src.get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}
