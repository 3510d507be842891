//! Scan pipeline configuration.
//!
//! One configuration for every scan path — the extraction model, its
//! sampling parameters and token ceilings, and where uploads and
//! persisted reports land. HTTP timeouts are set where each client is
//! constructed; the defaults below reflect the latency spread of the
//! external services involved.

use std::path::PathBuf;

use serde::Serialize;

/// OCR requests finish in seconds; the margin covers large photos.
pub const DEFAULT_OCR_TIMEOUT_SECS: u64 = 60;

/// Completion calls on multi-expense forms can run long.
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 120;

/// Metadata fetches, inserts and uploads.
pub const DEFAULT_STORAGE_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Serialize)]
pub struct ScanConfig {
    /// Completion model used for extraction.
    pub model: String,
    /// Sampling temperature, shared by every call site. Extraction is a
    /// transcription task — deterministic output is the point.
    pub temperature: f32,
    /// Token ceiling for single-form extractions.
    pub max_tokens_single: u32,
    /// Token ceiling for batch extractions covering a whole PDF.
    pub max_tokens_batch: u32,
    /// How many leading PDF pages feed the text-layer path.
    pub pdf_page_limit: usize,
    /// Root directory of per-language prompt templates.
    pub template_dir: PathBuf,
    /// Storage bucket receiving uploaded source files.
    pub upload_bucket: String,
    /// Path prefix within the bucket.
    pub upload_prefix: String,
    /// Table receiving persisted enriched reports.
    pub report_table: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            model: "gpt-3.5-turbo".into(),
            temperature: 0.0,
            max_tokens_single: 1500,
            max_tokens_batch: 4000,
            pdf_page_limit: 3,
            template_dir: PathBuf::from("locales"),
            upload_bucket: "expense-reports".into(),
            upload_prefix: "custom-reports".into(),
            report_table: "expense_reports".into(),
        }
    }
}
