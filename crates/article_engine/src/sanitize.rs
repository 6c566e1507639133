use ego_tree::{NodeId, NodeRef};
use extract_logging::extract_trace;
use scraper::node::{Element, Node};
use scraper::{ElementRef, Html};

/// Removes non-content elements from a selected subtree.
///
/// Works in two passes: the nodes to drop are collected from the original
/// tree, then detached from a copy. The caller's document is never mutated.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    denied_tags: Vec<String>,
    denied_terms: Vec<String>,
}

impl Sanitizer {
    pub fn new(denied_tags: &[String], denied_terms: &[String]) -> Self {
        Self {
            denied_tags: denied_tags.iter().map(|t| t.to_ascii_lowercase()).collect(),
            denied_terms: denied_terms
                .iter()
                .map(|t| t.to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Tag in the denylist, or a denied term inside `class` or `id`.
    pub fn is_denied(&self, element: &Element) -> bool {
        let tag = element.name();
        if self.denied_tags.iter().any(|t| tag.eq_ignore_ascii_case(t)) {
            return true;
        }
        ["class", "id"]
            .iter()
            .filter_map(|attr| element.attr(attr))
            .map(str::to_lowercase)
            .any(|value| self.denied_terms.iter().any(|term| value.contains(term.as_str())))
    }

    /// Outermost denied descendants of `root`. Their subtrees go with them, so
    /// the walk does not descend into them.
    pub fn removal_set(&self, root: NodeRef<'_, Node>) -> Vec<NodeId> {
        let mut removals = Vec::new();
        let mut pending: Vec<NodeRef<'_, Node>> = root.children().collect();
        while let Some(node) = pending.pop() {
            if node.value().as_element().is_some_and(|e| self.is_denied(e)) {
                removals.push(node.id());
                continue;
            }
            pending.extend(node.children());
        }
        removals
    }

    /// Inner HTML of `root` with every denied descendant removed. The root
    /// itself is kept even when it would match.
    pub fn inner_html(&self, html: &Html, root: NodeId) -> String {
        let Some(node) = html.tree.get(root) else {
            return String::new();
        };
        let removals = self.removal_set(node);
        let cleaned = filtered_copy(html, &removals);
        cleaned
            .tree
            .get(root)
            .and_then(ElementRef::wrap)
            .map(|element| element.inner_html().trim().to_string())
            .unwrap_or_default()
    }

    /// Outer HTML of each root that survives sanitization, in order. Unlike
    /// [`Sanitizer::inner_html`] the roots themselves are checked too.
    pub fn outer_html(&self, html: &Html, roots: &[NodeId]) -> Vec<String> {
        let mut removals = Vec::new();
        let mut kept = Vec::new();
        for &root in roots {
            let Some(node) = html.tree.get(root) else {
                continue;
            };
            if node.value().as_element().is_some_and(|e| self.is_denied(e)) {
                continue;
            }
            removals.extend(self.removal_set(node));
            kept.push(root);
        }

        let cleaned = filtered_copy(html, &removals);
        kept.into_iter()
            .filter_map(|id| cleaned.tree.get(id).and_then(ElementRef::wrap))
            .map(|element| element.html())
            .collect()
    }
}

fn filtered_copy(html: &Html, removals: &[NodeId]) -> Html {
    extract_trace!("sanitizer dropping {} subtrees", removals.len());
    let mut copy = html.clone();
    for &id in removals {
        if let Some(mut node) = copy.tree.get_mut(id) {
            node.detach();
        }
    }
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{DEFAULT_DENIED_TAGS, DEFAULT_DENIED_TERMS};
    use scraper::Selector;

    fn sanitizer() -> Sanitizer {
        let tags: Vec<String> = DEFAULT_DENIED_TAGS.iter().map(|s| s.to_string()).collect();
        let terms: Vec<String> = DEFAULT_DENIED_TERMS.iter().map(|s| s.to_string()).collect();
        Sanitizer::new(&tags, &terms)
    }

    fn first(html: &Html, css: &str) -> NodeId {
        let selector = Selector::parse(css).unwrap();
        html.select(&selector).next().unwrap().id()
    }

    #[test]
    fn nested_script_and_advertisement_are_removed() {
        let html = Html::parse_document(
            r#"<main id="root">
                <p>keep me</p>
                <div><section><div><script>alert(1)</script><span>also kept</span></div></section></div>
                <div><div><div class="Promo ADVERTISEMENT-slot"><p>buy</p></div></div></div>
                <div><div><div id="TopAdvertisement">buy more</div></div></div>
            </main>"#,
        );
        let out = sanitizer().inner_html(&html, first(&html, "#root"));
        assert!(out.contains("keep me"));
        assert!(out.contains("also kept"));
        assert!(!out.to_lowercase().contains("<script"));
        assert!(!out.to_lowercase().contains("advertisement"));
        assert!(!out.contains("buy"));
    }

    #[test]
    fn structural_chrome_is_removed() {
        let html = Html::parse_document(
            r#"<article id="root"><header>hdr</header><nav>menu</nav><p>body</p><aside>more</aside><footer>ftr</footer></article>"#,
        );
        let out = sanitizer().inner_html(&html, first(&html, "#root"));
        assert_eq!(out, "<p>body</p>");
    }

    #[test]
    fn class_terms_match_case_insensitive_substrings() {
        let html = Html::parse_document(
            r#"<div id="root"><div class="Social-Links">s</div><div class="share-bar">x</div><ol class="comment-list">c</ol><p>text</p></div>"#,
        );
        let out = sanitizer().inner_html(&html, first(&html, "#root"));
        assert_eq!(out, "<p>text</p>");
    }

    #[test]
    fn short_ad_term_and_sidebar_descendants_are_removed() {
        let html = Html::parse_document(
            r#"<section id="root"><p>story</p><div class="ad-slot">buy</div><div><div id="left-sidebar">links</div></div></section>"#,
        );
        let out = sanitizer().inner_html(&html, first(&html, "#root"));
        assert_eq!(out, "<p>story</p><div></div>");
    }

    #[test]
    fn ins_and_iframe_tags_are_removed() {
        let html = Html::parse_document(
            r#"<div id="root"><p>story</p><ins class="slot">ad</ins><iframe src="https://e.x/embed"></iframe></div>"#,
        );
        let out = sanitizer().inner_html(&html, first(&html, "#root"));
        assert_eq!(out, "<p>story</p>");
    }

    #[test]
    fn root_is_kept_and_source_document_untouched() {
        let html = Html::parse_document(r#"<div class="sidebar" id="root"><p>x</p><nav>n</nav></div>"#);
        let root = first(&html, "#root");
        assert_eq!(sanitizer().inner_html(&html, root), "<p>x</p>");
        // the original tree still holds the nav
        let nav = Selector::parse("nav").unwrap();
        assert_eq!(html.select(&nav).count(), 1);
    }

    #[test]
    fn outer_html_drops_denied_roots() {
        let html = Html::parse_document(
            r#"<body><p>one <script>x</script></p><p class="share">two</p><p>three</p></body>"#,
        );
        let selector = Selector::parse("p").unwrap();
        let roots: Vec<NodeId> = html.select(&selector).map(|p| p.id()).collect();
        let out = sanitizer().outer_html(&html, &roots);
        assert_eq!(out, vec!["<p>one </p>".to_string(), "<p>three</p>".to_string()]);
    }
}
