use encoding_rs::Encoding;
use extract_logging::extract_debug;
use scraper::Html;

use crate::decode::decode_html;
use crate::ParseError;

const BINARY_SNIFF_LEN: usize = 1024;

#[derive(Debug, Clone)]
pub struct LoaderSettings {
    /// Media types accepted from the `Content-Type` header. A response without
    /// the header is always accepted.
    pub allowed_content_types: Vec<String>,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
                "application/xml".to_string(),
                "text/xml".to_string(),
                "text/plain".to_string(),
            ],
        }
    }
}

impl LoaderSettings {
    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        ct.is_empty()
            || self
                .allowed_content_types
                .iter()
                .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }
}

/// A parsed page. Owned by a single extraction and dropped with it.
#[derive(Debug, Clone)]
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses already-decoded markup. html5ever recovers from any malformed
    /// input, so this cannot fail.
    pub fn parse(markup: &str) -> Self {
        Self {
            html: Html::parse_document(markup),
        }
    }

    pub fn html(&self) -> &Html {
        &self.html
    }
}

/// Turns response bytes into a [`Document`], rejecting only content that is
/// clearly not a web page.
pub fn load_document(
    bytes: &[u8],
    content_type: Option<&str>,
    settings: &LoaderSettings,
) -> Result<Document, ParseError> {
    if let Some(ct) = content_type {
        if !settings.is_content_type_allowed(ct) {
            return Err(ParseError::UnsupportedContentType {
                content_type: ct.to_string(),
            });
        }
    }

    if looks_binary(bytes) {
        return Err(ParseError::BinaryContent);
    }

    let decoded = decode_html(bytes, content_type);
    extract_debug!(
        "decoded {} bytes as {}{}",
        bytes.len(),
        decoded.encoding_label,
        if decoded.had_errors { " (lossy)" } else { "" }
    );
    Ok(Document::parse(&decoded.html))
}

/// NUL bytes never occur in text encodings without a BOM (UTF-16 carries one).
fn looks_binary(bytes: &[u8]) -> bool {
    if Encoding::for_bom(bytes).is_some() {
        return false;
    }
    bytes.iter().take(BINARY_SNIFF_LEN).any(|&b| b == 0)
}
