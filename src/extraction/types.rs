use serde::{Deserialize, Serialize};

/// Terminal status of one extraction attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStatus {
    /// Text was extracted.
    Success,
    /// Extraction ran and failed.
    Failed,
    /// Nothing extractable was found (no documents on the page).
    Skipped,
}

/// One file the extraction service processed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedFile {
    /// Original filename.
    pub filename: String,
    /// Storage locator assigned by the service.
    pub locator: String,
    /// File size in bytes.
    pub size_bytes: u64,
    /// Extracted plain text.
    pub text: String,
}

/// Everything the extraction service produced for one tender.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// Extraction status.
    pub status: ExtractionStatus,
    /// Processed files with their text.
    #[serde(default)]
    pub files: Vec<ExtractedFile>,
    /// Page-level text used to seed description generation.
    #[serde(default)]
    pub seed_text: String,
}

impl ExtractedDocument {
    /// A successful extraction of `files` with `seed_text`.
    pub fn success(files: Vec<ExtractedFile>, seed_text: impl Into<String>) -> Self {
        Self {
            status: ExtractionStatus::Success,
            files,
            seed_text: seed_text.into(),
        }
    }

    /// Whether the pipeline can proceed with this extraction.
    pub fn is_usable(&self) -> bool {
        self.status == ExtractionStatus::Success && !self.files.is_empty()
    }
}
