pub mod extract;
pub mod language;
pub mod ocr;
pub mod orchestrator;
pub mod prompt;
pub mod reconcile;

pub use orchestrator::*;

use serde::Serialize;
use thiserror::Error;

use self::extract::ExtractError;
use self::ocr::{OcrError, PreprocessError};
use self::prompt::TemplateError;
use self::reconcile::ReconcileError;

use crate::storage::StorageError;

/// Pipeline stage a failure belongs to, for observability. Stages run
/// strictly in this order; there are no per-stage retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStage {
    Upload,
    MetadataFetch,
    Preprocess,
    Ocr,
    PromptBuild,
    Extract,
    Reconcile,
    Persist,
}

/// Any stage-local failure is fatal to the whole request — no partial
/// report is ever returned.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("upload rejected: {0}")]
    Upload(String),

    #[error("failed to fetch project metadata: {0}")]
    MetadataFetch(#[source] StorageError),

    #[error("image preprocessing failed: {0}")]
    Preprocess(#[from] PreprocessError),

    #[error("OCR failed: {0}")]
    Ocr(#[from] OcrError),

    #[error("prompt template error: {0}")]
    Template(#[from] TemplateError),

    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),

    #[error("financial reconciliation failed: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("persistence failed: {0}")]
    Persistence(#[source] StorageError),
}

impl ScanError {
    pub fn stage(&self) -> ScanStage {
        match self {
            ScanError::Upload(_) => ScanStage::Upload,
            ScanError::MetadataFetch(_) => ScanStage::MetadataFetch,
            ScanError::Preprocess(_) => ScanStage::Preprocess,
            ScanError::Ocr(_) => ScanStage::Ocr,
            ScanError::Template(_) => ScanStage::PromptBuild,
            ScanError::Extraction(_) => ScanStage::Extract,
            ScanError::Reconcile(_) => ScanStage::Reconcile,
            ScanError::Persistence(_) => ScanStage::Persist,
        }
    }

    /// Single user-facing message; the stage and source chain carry the
    /// machine-readable detail.
    pub fn user_message(&self) -> String {
        format!("Processing error: {self}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_stages() {
        assert_eq!(
            ScanError::Upload("no file".into()).stage(),
            ScanStage::Upload
        );
        assert_eq!(
            ScanError::Extraction(ExtractError::EmptyResponse).stage(),
            ScanStage::Extract
        );
        assert_eq!(
            ScanError::Persistence(StorageError::ProjectNotFound("p".into())).stage(),
            ScanStage::Persist
        );
    }

    #[test]
    fn stage_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ScanStage::MetadataFetch).unwrap(),
            "\"metadata_fetch\""
        );
    }

    #[test]
    fn user_message_is_prefixed() {
        let err = ScanError::Upload("Project ID is required".into());
        assert_eq!(
            err.user_message(),
            "Processing error: upload rejected: Project ID is required"
        );
    }
}
