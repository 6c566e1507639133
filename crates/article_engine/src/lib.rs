//! Article engine: fetch a page and pull a readable article out of it.
mod content;
mod decode;
mod dom;
mod extract;
mod fetch;
mod images;
mod llm;
mod metadata;
mod pipeline;
mod sanitize;
mod text;
mod types;

pub use content::{densest_container, paragraph_counts, ContentSelection, ContentSelector};
pub use decode::{decode_html, DecodedHtml};
pub use dom::{load_document, Document, LoaderSettings};
pub use extract::{
    ArticleExtractor, ExtractionSettings, SettingsError, DEFAULT_CONTENT_SELECTORS,
    DEFAULT_DENIED_TAGS, DEFAULT_DENIED_TERMS, DEFAULT_MIN_PARAGRAPHS,
};
pub use fetch::{FetchSettings, Fetcher, ReqwestFetcher, BROWSER_USER_AGENT};
pub use images::{resolve_image_src, ImageCollector};
pub use llm::{ChatCompletionsBridge, LlmBridge, LlmError, LlmRequest, LlmSettings};
pub use metadata::{MetaRule, MetadataExtractor, RuleChain, ValueSource};
pub use pipeline::{ArticlePipeline, BatchError, BatchItem, BatchReport, BatchSettings, BatchSummary};
pub use sanitize::Sanitizer;
pub use text::{element_text, normalize_lines};
pub use types::{
    ExtractError, ExtractedMetadata, ExtractionResult, FailureKind, FetchError, FetchMetadata,
    FetchOutput, ImageRecord, ParseError,
};
pub use tokio_util::sync::CancellationToken;
