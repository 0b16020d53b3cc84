use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use super::types::{ExtractedDocument, ExtractedFile, ExtractionStatus};
use super::{ExtractionError, Extractor};
use crate::pipeline::types::CandidateTender;

/// Scripted extractor for tests: per-URL outcomes, with a default success
/// for unscripted URLs.
pub struct MockExtractor {
    outcomes: Mutex<HashMap<String, ExtractedDocument>>,
    fail_urls: Mutex<Vec<String>>,
    extract_calls: AtomicUsize,
    shutdown_called: AtomicBool,
}

impl Default for MockExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MockExtractor {
    pub fn new() -> Self {
        Self {
            outcomes: Mutex::new(HashMap::new()),
            fail_urls: Mutex::new(Vec::new()),
            extract_calls: AtomicUsize::new(0),
            shutdown_called: AtomicBool::new(false),
        }
    }

    /// Scripts a specific outcome for `url`.
    pub fn script(self, url: &str, document: ExtractedDocument) -> Self {
        self.outcomes.lock().insert(url.to_string(), document);
        self
    }

    /// Makes extraction for `url` report [`ExtractionStatus::Failed`].
    pub fn failing_for(self, url: &str) -> Self {
        self.fail_urls.lock().push(url.to_string());
        self
    }

    /// Number of extraction calls seen.
    pub fn extract_calls(&self) -> usize {
        self.extract_calls.load(Ordering::SeqCst)
    }

    /// Whether [`Extractor::shutdown`] was invoked.
    pub fn shutdown_called(&self) -> bool {
        self.shutdown_called.load(Ordering::SeqCst)
    }

    fn default_document(tender: &CandidateTender) -> ExtractedDocument {
        ExtractedDocument::success(
            vec![ExtractedFile {
                filename: "notice.pdf".to_string(),
                locator: format!("store://{}", tender.name.replace(' ', "-").to_lowercase()),
                size_bytes: 4096,
                text: format!(
                    "Tender {} issued by {}. Scope includes road maintenance, \
                     resurfacing and winter services. Bidders must hold ISO 9001 \
                     certification. Deadline for submission is next month.",
                    tender.name, tender.organization
                ),
            }],
            format!("{} — {}", tender.name, tender.organization),
        )
    }
}

#[async_trait]
impl Extractor for MockExtractor {
    async fn extract(
        &self,
        tender: &CandidateTender,
    ) -> Result<ExtractedDocument, ExtractionError> {
        self.extract_calls.fetch_add(1, Ordering::SeqCst);

        if self.fail_urls.lock().iter().any(|u| u == &tender.url) {
            return Ok(ExtractedDocument {
                status: ExtractionStatus::Failed,
                files: Vec::new(),
                seed_text: String::new(),
            });
        }

        if let Some(document) = self.outcomes.lock().get(&tender.url) {
            return Ok(document.clone());
        }

        Ok(Self::default_document(tender))
    }

    async fn shutdown(&self) -> Result<(), ExtractionError> {
        self.shutdown_called.store(true, Ordering::SeqCst);
        Ok(())
    }
}
