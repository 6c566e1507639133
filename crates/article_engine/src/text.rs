use ego_tree::NodeRef;
use scraper::node::Node;
use scraper::ElementRef;

/// Text inside these never renders.
const NON_RENDERED_TAGS: &[&str] = &["script", "style", "noscript", "template"];

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "aside", "blockquote", "dd", "details", "div", "dl", "dt",
    "fieldset", "figcaption", "figure", "footer", "form", "h1", "h2", "h3", "h4", "h5", "h6",
    "header", "hr", "li", "main", "nav", "ol", "p", "pre", "section", "summary", "table",
    "tbody", "td", "tfoot", "th", "thead", "tr", "ul",
];

/// Plain text of an element with one line per block, every line trimmed and
/// blank lines dropped.
pub fn element_text(element: ElementRef) -> String {
    let mut builder = TextBuilder::default();
    builder.visit_children(*element);
    normalize_lines(&builder.into_string())
}

/// Trims every line and drops the blank ones, keeping line order.
pub fn normalize_lines(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[derive(Default)]
struct TextBuilder {
    builder: String,
    last_char: Option<char>,
}

impl TextBuilder {
    fn into_string(self) -> String {
        self.builder
    }

    fn visit_node(&mut self, node: NodeRef<'_, Node>) {
        match node.value() {
            Node::Text(text) => self.append_text(text),
            Node::Element(element) => {
                let tag = element.name();
                if NON_RENDERED_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t)) {
                    return;
                }
                if tag.eq_ignore_ascii_case("br") {
                    self.push_char('\n');
                    return;
                }
                if BLOCK_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t)) {
                    self.ensure_newline();
                    self.visit_children(node);
                    self.ensure_newline();
                } else {
                    self.visit_children(node);
                }
            }
            _ => self.visit_children(node),
        }
    }

    fn visit_children(&mut self, node: NodeRef<'_, Node>) {
        for child in node.children() {
            self.visit_node(child);
        }
    }

    /// Source line breaks survive, other whitespace runs collapse to one space.
    fn append_text(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' || ch == '\r' {
                self.push_char('\n');
            } else if ch.is_whitespace() {
                if self.last_char == Some(' ') {
                    continue;
                }
                self.push_char(' ');
            } else {
                self.push_char(ch);
            }
        }
    }

    fn ensure_newline(&mut self) {
        if self.last_char == Some('\n') || self.builder.is_empty() {
            return;
        }
        self.push_char('\n');
    }

    fn push_char(&mut self, ch: char) {
        self.builder.push(ch);
        self.last_char = Some(ch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn text_of(markup: &str, css: &str) -> String {
        let html = Html::parse_document(markup);
        let selector = Selector::parse(css).unwrap();
        element_text(html.select(&selector).next().unwrap())
    }

    #[test]
    fn blocks_become_lines() {
        let text = text_of(
            "<article><h1>Title</h1><p>First <em>para</em>.</p><ul><li>a</li><li>b</li></ul></article>",
            "article",
        );
        assert_eq!(text, "Title\nFirst para.\na\nb");
    }

    #[test]
    fn lines_are_trimmed_and_blank_lines_dropped() {
        let text = text_of(
            "<div id=\"x\">\n\n   leading\t\tspaces   \n\n\n<p>  \n  </p>trailing  </div>",
            "#x",
        );
        assert_eq!(text, "leading spaces\ntrailing");
        for line in text.lines() {
            assert_eq!(line, line.trim());
            assert!(!line.is_empty());
        }
    }

    #[test]
    fn script_and_style_text_is_not_rendered() {
        let text = text_of(
            "<main><script>var a = 1;</script><style>p{}</style><p>kept</p></main>",
            "main",
        );
        assert_eq!(text, "kept");
    }

    #[test]
    fn br_splits_lines() {
        assert_eq!(text_of("<p id=\"p\">one<br>two</p>", "#p"), "one\ntwo");
    }

    #[test]
    fn normalize_lines_handles_crlf() {
        assert_eq!(normalize_lines("  a \r\n\r\n b\n"), "a\nb");
    }
}
