use std::fmt;

use ego_tree::iter::Edge;
use ego_tree::{NodeId, NodeRef};
use scraper::node::Node;
use scraper::{Html, Selector};

use crate::dom::Document;
use crate::SettingsError;

/// Which subtree was judged to be the article body, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSelection {
    /// First element of the first selector that matched anything.
    Selector { css: String, node: NodeId },
    /// `div`/`section` with the most descendant paragraphs.
    Densest { node: NodeId, paragraphs: usize },
    /// Every `<p>` of the page, in document order.
    Paragraphs(Vec<NodeId>),
}

impl fmt::Display for ContentSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentSelection::Selector { css, .. } => write!(f, "selector {css}"),
            ContentSelection::Densest { paragraphs, .. } => {
                write!(f, "densest container ({paragraphs} paragraphs)")
            }
            ContentSelection::Paragraphs(nodes) => {
                write!(f, "all paragraphs ({} found)", nodes.len())
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct ContentSelector {
    selectors: Vec<(String, Selector)>,
    paragraph: Selector,
    min_paragraphs: usize,
}

impl ContentSelector {
    pub fn new(selectors: &[String], min_paragraphs: usize) -> Result<Self, SettingsError> {
        let selectors = selectors
            .iter()
            .map(|css| compile(css).map(|selector| (css.clone(), selector)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            selectors,
            paragraph: compile("p")?,
            min_paragraphs,
        })
    }

    pub fn select(&self, document: &Document) -> ContentSelection {
        let html = document.html();

        let by_selector = self.selectors.iter().find_map(|(css, selector)| {
            html.select(selector)
                .next()
                .map(|element| ContentSelection::Selector {
                    css: css.clone(),
                    node: element.id(),
                })
        });
        if let Some(selection) = by_selector {
            return selection;
        }

        if let Some((node, paragraphs)) = densest_container(html) {
            if paragraphs >= self.min_paragraphs {
                return ContentSelection::Densest { node, paragraphs };
            }
        }

        ContentSelection::Paragraphs(html.select(&self.paragraph).map(|p| p.id()).collect())
    }
}

pub(crate) fn compile(css: &str) -> Result<Selector, SettingsError> {
    Selector::parse(css).map_err(|err| SettingsError::InvalidSelector {
        selector: css.to_string(),
        message: err.to_string(),
    })
}

/// Container with the strictly highest paragraph count; the earliest one in
/// document order wins a tie.
pub fn densest_container(html: &Html) -> Option<(NodeId, usize)> {
    paragraph_counts(html)
        .into_iter()
        .fold(None, |best, (node, count)| match best {
            Some((_, best_count)) if count <= best_count => best,
            _ => Some((node, count)),
        })
}

/// Every `div`/`section` in document order with its number of descendant
/// `<p>` elements, computed in one traversal.
pub fn paragraph_counts(html: &Html) -> Vec<(NodeId, usize)> {
    let mut containers: Vec<(NodeId, usize)> = Vec::new();
    // (paragraphs below the open node, slot in `containers`)
    let mut open: Vec<(usize, Option<usize>)> = Vec::new();

    for edge in html.tree.root().traverse() {
        match edge {
            Edge::Open(node) => {
                let slot = is_tag(node, &["div", "section"]).then(|| {
                    containers.push((node.id(), 0));
                    containers.len() - 1
                });
                open.push((0, slot));
            }
            Edge::Close(node) => {
                let Some((below, slot)) = open.pop() else {
                    continue;
                };
                if let Some(slot) = slot {
                    containers[slot].1 = below;
                }
                let own = usize::from(is_tag(node, &["p"]));
                if let Some((parent_count, _)) = open.last_mut() {
                    *parent_count += below + own;
                }
            }
        }
    }

    containers
}

fn is_tag(node: NodeRef<'_, Node>, tags: &[&str]) -> bool {
    node.value()
        .as_element()
        .is_some_and(|element| tags.iter().any(|tag| element.name() == *tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::ElementRef;

    fn default_selector() -> ContentSelector {
        let selectors: Vec<String> = crate::extract::DEFAULT_CONTENT_SELECTORS
            .iter()
            .map(|s| s.to_string())
            .collect();
        ContentSelector::new(&selectors, 3).unwrap()
    }

    fn id_attr(doc: &Document, node: NodeId) -> String {
        let element = ElementRef::wrap(doc.html().tree.get(node).unwrap()).unwrap();
        element.value().attr("id").unwrap_or_default().to_string()
    }

    fn paragraphs(n: usize) -> String {
        (0..n).map(|i| format!("<p>p{i}</p>")).collect()
    }

    #[test]
    fn first_listed_selector_wins_over_document_order() {
        let doc = Document::parse(
            r#"<body><div class="post-content" id="first">x</div><article id="second">y</article></body>"#,
        );
        match default_selector().select(&doc) {
            ContentSelection::Selector { css, node } => {
                assert_eq!(css, "article");
                assert_eq!(id_attr(&doc, node), "second");
            }
            other => panic!("unexpected selection {other:?}"),
        }
    }

    #[test]
    fn first_element_of_matching_selector_is_used() {
        let doc = Document::parse(
            r#"<body><article id="a1">one</article><article id="a2">two</article></body>"#,
        );
        match default_selector().select(&doc) {
            ContentSelection::Selector { node, .. } => assert_eq!(id_attr(&doc, node), "a1"),
            other => panic!("unexpected selection {other:?}"),
        }
    }

    #[test]
    fn densest_div_wins_without_known_selectors() {
        let doc = Document::parse(&format!(
            r#"<body><div id="five">{}</div><div id="two">{}</div></body>"#,
            paragraphs(5),
            paragraphs(2)
        ));
        match default_selector().select(&doc) {
            ContentSelection::Densest { node, paragraphs } => {
                assert_eq!(paragraphs, 5);
                assert_eq!(id_attr(&doc, node), "five");
            }
            other => panic!("unexpected selection {other:?}"),
        }
    }

    #[test]
    fn ties_go_to_the_first_container() {
        let doc = Document::parse(&format!(
            r#"<body><section id="s1">{}</section><div id="d2">{}</div></body>"#,
            paragraphs(4),
            paragraphs(4)
        ));
        let (node, count) = densest_container(doc.html()).unwrap();
        assert_eq!(count, 4);
        assert_eq!(id_attr(&doc, node), "s1");
    }

    #[test]
    fn counts_include_nested_descendants() {
        let doc = Document::parse(&format!(
            r#"<body><div id="outer"><p>a</p><section id="inner">{}</section></div></body>"#,
            paragraphs(3)
        ));
        let counts: Vec<(String, usize)> = paragraph_counts(doc.html())
            .into_iter()
            .map(|(node, count)| (id_attr(&doc, node), count))
            .collect();
        assert_eq!(
            counts,
            vec![("outer".to_string(), 4), ("inner".to_string(), 3)]
        );
    }

    #[test]
    fn below_threshold_falls_back_to_all_paragraphs() {
        let doc = Document::parse(&format!(
            r#"<body><div>{}</div><p>loose</p></body>"#,
            paragraphs(2)
        ));
        match default_selector().select(&doc) {
            ContentSelection::Paragraphs(nodes) => assert_eq!(nodes.len(), 3),
            other => panic!("unexpected selection {other:?}"),
        }
    }

    #[test]
    fn invalid_selector_is_reported() {
        let err = ContentSelector::new(&["div[".to_string()], 3).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidSelector { selector, .. } if selector == "div["));
    }
}
