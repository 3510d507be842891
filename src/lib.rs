//! Expense-report scanning for Emergency Response Room volunteers.
//!
//! Turns an uploaded form image or PDF into a structured expense report:
//! OCR with reading-order reconstruction, language detection, templated
//! prompt assembly, LLM-based field extraction, and authoritative
//! financial reconciliation. External services — the OCR provider, the
//! completion model, and storage — are injected trait objects, so the
//! whole pipeline runs against mocks in tests.

pub mod config;
pub mod models;
pub mod pipeline;
pub mod storage;

pub use config::ScanConfig;
pub use models::report::{EnrichedReport, StructuredReport};
pub use pipeline::{BatchScanOutcome, ScanError, ScanOutcome, ScanPipeline, ScanStage};
