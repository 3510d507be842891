pub mod layout;
pub mod pdf;
pub mod preprocess;
pub mod types;
pub mod vision;

pub use layout::*;
pub use pdf::*;
pub use preprocess::*;
pub use types::*;
pub use vision::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum OcrError {
    #[error("OCR service unreachable at {0}")]
    Unreachable(String),

    #[error("OCR request timed out after {0}s")]
    Timeout(u64),

    #[error("OCR service returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("OCR response parsing error: {0}")]
    ResponseParsing(String),

    #[error("PDF parsing failed: {0}")]
    PdfParsing(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum PreprocessError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to encode image: {0}")]
    Encode(String),

    #[error("preprocessing subprocess exited with {code:?}")]
    Subprocess { code: Option<i32> },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
