use async_trait::async_trait;
use parking_lot::Mutex;

use super::{SearchError, SearchQuery, TenderSearch};
use crate::pipeline::types::CandidateTender;

/// Canned search results for tests.
pub struct MockSearch {
    results: Mutex<Vec<CandidateTender>>,
}

impl MockSearch {
    pub fn new(results: Vec<CandidateTender>) -> Self {
        Self {
            results: Mutex::new(results),
        }
    }

    /// A search that finds nothing.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl TenderSearch for MockSearch {
    async fn search(&self, _query: &SearchQuery) -> Result<Vec<CandidateTender>, SearchError> {
        Ok(self.results.lock().clone())
    }
}
