use std::sync::Arc;
use std::time::{Duration, Instant};

use extract_logging::{extract_info, extract_warn, StageTimer};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::dom::{load_document, LoaderSettings};
use crate::extract::{ArticleExtractor, ExtractionSettings, SettingsError};
use crate::fetch::{FetchSettings, Fetcher, ReqwestFetcher};
use crate::{ExtractError, ExtractionResult, FetchOutput};

/// Fetch, parse and extract a single page per call.
///
/// Cloning is cheap; clones share the fetcher and the compiled extractor.
#[derive(Clone)]
pub struct ArticlePipeline {
    fetcher: Arc<dyn Fetcher>,
    extractor: Arc<ArticleExtractor>,
    loader: LoaderSettings,
}

impl ArticlePipeline {
    pub fn new(fetch: FetchSettings, extraction: &ExtractionSettings) -> Result<Self, SettingsError> {
        let extractor = ArticleExtractor::new(extraction)?;
        Ok(Self::with_fetcher(
            Arc::new(ReqwestFetcher::new(fetch)),
            extractor,
        ))
    }

    pub fn with_fetcher(fetcher: Arc<dyn Fetcher>, extractor: ArticleExtractor) -> Self {
        Self {
            fetcher,
            extractor: Arc::new(extractor),
            loader: LoaderSettings::default(),
        }
    }

    /// Runs the whole pipeline. A fetch or parse failure ends it; missing
    /// fields never do. Dropping the future aborts the outbound request.
    pub async fn extract(&self, url: &str) -> Result<ExtractionResult, ExtractError> {
        let output = {
            let _timer = StageTimer::new("fetch", url);
            self.fetcher.fetch(url).await?
        };
        self.process(url, output)
    }

    /// Like [`ArticlePipeline::extract`] but gives up as soon as `cancel` fires.
    pub async fn extract_with_cancel(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> Result<ExtractionResult, ExtractError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                extract_info!("extraction of {url} cancelled");
                Err(ExtractError::Cancelled)
            }
            result = self.extract(url) => result,
        }
    }

    // The parsed document is not Send, so it must never live across an await.
    fn process(&self, url: &str, output: FetchOutput) -> Result<ExtractionResult, ExtractError> {
        let document = {
            let _timer = StageTimer::new("parse", url);
            load_document(
                &output.bytes,
                output.metadata.content_type.as_deref(),
                &self.loader,
            )?
        };
        let base_url = Url::parse(&output.metadata.final_url).ok();
        let result = self
            .extractor
            .extract_document(&document, url, base_url.as_ref());
        extract_info!(
            "extracted {url}: {} chars of text, {} images",
            result.content.len(),
            result.images.len()
        );
        Ok(result)
    }

    /// Extracts several pages with bounded concurrency. One failing page
    /// becomes a failed item; it never fails the batch.
    pub async fn extract_batch(
        &self,
        urls: &[String],
        settings: &BatchSettings,
    ) -> Result<BatchReport, BatchError> {
        let started = Instant::now();
        let valid: Vec<String> = urls
            .iter()
            .filter(|url| Url::parse(url).is_ok())
            .take(settings.max_urls)
            .cloned()
            .collect();
        if valid.is_empty() {
            return Err(BatchError::NoValidUrls);
        }
        if valid.len() < urls.len() {
            extract_warn!(
                "batch: {} of {} urls dropped as invalid or over the limit",
                urls.len() - valid.len(),
                urls.len()
            );
        }

        let results: Vec<BatchItem> = futures_util::stream::iter(
            valid.into_iter().map(|url| self.batch_item(url, settings)),
        )
        .buffered(settings.max_concurrent.max(1))
        .collect()
        .await;

        let successful = results.iter().filter(|item| item.success).count();
        let summary = BatchSummary {
            total: results.len(),
            successful,
            failed: results.len() - successful,
            total_time_ms: started.elapsed().as_millis() as u64,
        };
        extract_info!(
            "batch finished: {}/{} succeeded in {} ms",
            summary.successful,
            summary.total,
            summary.total_time_ms
        );
        Ok(BatchReport { results, summary })
    }

    async fn batch_item(&self, url: String, settings: &BatchSettings) -> BatchItem {
        let started = Instant::now();
        let outcome = tokio::time::timeout(settings.per_url_timeout, self.extract(&url)).await;
        let fetch_time_ms = started.elapsed().as_millis() as u64;

        let failure = |error: String| {
            extract_warn!("batch item {url} failed: {error}");
            BatchItem {
                url: url.clone(),
                success: false,
                result: None,
                error: Some(error),
                fetch_time_ms,
            }
        };

        match outcome {
            Ok(Ok(mut result)) => {
                if let Some(cap) = settings.max_images {
                    result.images.truncate(cap);
                }
                BatchItem {
                    url: url.clone(),
                    success: true,
                    result: Some(result),
                    error: None,
                    fetch_time_ms,
                }
            }
            Ok(Err(err)) => failure(err.to_string()),
            Err(_) => failure(format!(
                "timeout after {} ms",
                settings.per_url_timeout.as_millis()
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub max_urls: usize,
    pub max_concurrent: usize,
    pub per_url_timeout: Duration,
    pub max_images: Option<usize>,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            max_urls: 5,
            max_concurrent: 3,
            per_url_timeout: Duration::from_secs(10),
            max_images: Some(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BatchError {
    #[error("no valid urls provided")]
    NoValidUrls,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub url: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ExtractionResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub fetch_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub successful: usize,
    pub failed: usize,
    pub total_time_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub results: Vec<BatchItem>,
    pub summary: BatchSummary,
}
