//! Scan orchestration.
//!
//! Each scan is one linear chain: acquire text (preprocess + OCR, or
//! PDF text layer) → detect language → build prompt → extract →
//! reconcile → upload source file → enrich. Every stage either produces
//! input for the next or fails the whole request; nothing is retried,
//! so a scan is at-most-once per uploaded file.

use chrono::Utc;
use uuid::Uuid;

use super::extract::{
    parse_report, parse_report_batch, CompletionClient, CompletionRequest, JSON_SYSTEM_PROMPT,
};
use super::language::{detect_language, Language};
use super::ocr::{
    reconstruct_text_with_layout, NativePreprocessor, OcrProvider, PdfTextExtractor,
    PdfTextSource, Preprocessor,
};
use super::prompt::{build_prompt, clean_text, prompt_values, TemplateKind, TemplateStore};
use super::reconcile::{prefill_summary, reconcile};
use super::ScanError;
use crate::config::ScanConfig;
use crate::models::project::ProjectMetadata;
use crate::models::report::{EnrichedReport, StructuredReport};
use crate::storage::StorageClient;

/// Terminal result of a single-form scan: the enriched report plus the
/// raw OCR text for audit.
#[derive(Debug)]
pub struct ScanOutcome {
    pub report: EnrichedReport,
    pub ocr_text: String,
}

/// Terminal result of a batch scan over a multi-form PDF.
#[derive(Debug)]
pub struct BatchScanOutcome {
    pub reports: Vec<EnrichedReport>,
    pub ocr_text: String,
}

/// The scan pipeline with its injected collaborators. Construct once
/// and share; every method is stateless per request.
pub struct ScanPipeline {
    preprocessor: Box<dyn Preprocessor>,
    ocr: Box<dyn OcrProvider>,
    pdf: Box<dyn PdfTextSource>,
    completion: Box<dyn CompletionClient>,
    storage: Box<dyn StorageClient>,
    templates: TemplateStore,
    config: ScanConfig,
}

impl ScanPipeline {
    pub fn new(
        ocr: Box<dyn OcrProvider>,
        completion: Box<dyn CompletionClient>,
        storage: Box<dyn StorageClient>,
        config: ScanConfig,
    ) -> Self {
        Self {
            preprocessor: Box::new(NativePreprocessor::default()),
            ocr,
            pdf: Box::new(PdfTextExtractor),
            completion,
            storage,
            templates: TemplateStore::new(&config.template_dir),
            config,
        }
    }

    /// Swap the image normalizer (e.g. for the subprocess-backed one).
    pub fn with_preprocessor(mut self, preprocessor: Box<dyn Preprocessor>) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    /// Swap the PDF text source.
    pub fn with_pdf_source(mut self, pdf: Box<dyn PdfTextSource>) -> Self {
        self.pdf = pdf;
        self
    }

    /// Scan a photographed paper form.
    pub fn scan_image(
        &self,
        image: &[u8],
        file_name: &str,
        project_id: &str,
    ) -> Result<ScanOutcome, ScanError> {
        let _span = tracing::info_span!(
            "scan_image",
            scan_id = %Uuid::new_v4(),
            file = file_name,
        )
        .entered();

        validate_upload(image, project_id)?;
        let metadata = self.fetch_metadata(project_id)?;

        // Normalize the photo, OCR it, and rebuild reading order. A form
        // with no detectable text continues with empty input rather than
        // failing — the reviewer sees an empty draft, not an error.
        let processed = self.preprocessor.preprocess(image)?;
        let ocr_text = match self.ocr.detect_document_text(&processed)? {
            Some(annotation) => reconstruct_text_with_layout(&annotation),
            None => String::new(),
        };
        if ocr_text.is_empty() {
            tracing::warn!("No text detected in uploaded image");
        }

        let language = detect_language(&ocr_text);
        let report = self.extract_single(&ocr_text, language, TemplateKind::CustomForm, &metadata)?;
        let file_url = self.upload_source(image, file_name)?;

        tracing::info!(language = language.code(), "Scan complete");
        Ok(ScanOutcome {
            report: EnrichedReport {
                report,
                project_metadata: metadata,
                file_url,
            },
            ocr_text,
        })
    }

    /// Scan a digital PDF expected to hold one form.
    pub fn scan_pdf(
        &self,
        pdf: &[u8],
        file_name: &str,
        project_id: &str,
    ) -> Result<ScanOutcome, ScanError> {
        let _span = tracing::info_span!(
            "scan_pdf",
            scan_id = %Uuid::new_v4(),
            file = file_name,
        )
        .entered();

        validate_upload(pdf, project_id)?;
        let metadata = self.fetch_metadata(project_id)?;

        let text = self.pdf_text(pdf)?;
        let language = detect_language(&text);
        let report = self.extract_single(&text, language, TemplateKind::PdfForm, &metadata)?;
        let file_url = self.upload_source(pdf, file_name)?;

        tracing::info!(language = language.code(), "PDF scan complete");
        Ok(ScanOutcome {
            report: EnrichedReport {
                report,
                project_metadata: metadata,
                file_url,
            },
            ocr_text: text,
        })
    }

    /// Scan a digital PDF holding several forms. One completion call
    /// covers all of them — a single large response instead of a call
    /// per form.
    pub fn scan_pdf_batch(
        &self,
        pdf: &[u8],
        file_name: &str,
        project_id: &str,
    ) -> Result<BatchScanOutcome, ScanError> {
        let _span = tracing::info_span!(
            "scan_pdf_batch",
            scan_id = %Uuid::new_v4(),
            file = file_name,
        )
        .entered();

        validate_upload(pdf, project_id)?;
        let metadata = self.fetch_metadata(project_id)?;

        let text = self.pdf_text(pdf)?;
        let language = detect_language(&text);
        let prompt = self.build_form_prompt(&text, language, TemplateKind::PdfForm, &metadata)?;

        let content = self.completion.complete(&CompletionRequest {
            model: &self.config.model,
            system: Some(JSON_SYSTEM_PROMPT),
            prompt: &prompt,
            max_tokens: self.config.max_tokens_batch,
            temperature: self.config.temperature,
            json_mode: true,
        })?;

        let mut forms = parse_report_batch(&content)?;
        for form in &mut forms {
            reconcile(form, &metadata)?;
        }

        let file_url = self.upload_source(pdf, file_name)?;
        tracing::info!(
            language = language.code(),
            forms = forms.len(),
            "Batch PDF scan complete"
        );

        let reports = forms
            .into_iter()
            .map(|report| EnrichedReport {
                report,
                project_metadata: metadata.clone(),
                file_url: file_url.clone(),
            })
            .collect();

        Ok(BatchScanOutcome {
            reports,
            ocr_text: text,
        })
    }

    /// Hand a finished report to storage.
    pub fn persist(&self, report: &EnrichedReport) -> Result<(), ScanError> {
        let record = serde_json::to_value(report).map_err(|e| {
            ScanError::Persistence(crate::storage::StorageError::ResponseParsing(e.to_string()))
        })?;
        self.storage
            .insert(&self.config.report_table, &record)
            .map_err(ScanError::Persistence)?;
        tracing::info!(table = %self.config.report_table, "Report persisted");
        Ok(())
    }

    fn fetch_metadata(&self, project_id: &str) -> Result<ProjectMetadata, ScanError> {
        self.storage
            .fetch_project_metadata(project_id)
            .map_err(ScanError::MetadataFetch)
    }

    /// Text layer of the leading PDF pages, pages joined by blank lines.
    fn pdf_text(&self, pdf: &[u8]) -> Result<String, ScanError> {
        let pages = self.pdf.extract_pages(pdf)?;
        Ok(pages
            .iter()
            .take(self.config.pdf_page_limit)
            .map(|p| p.as_str())
            .collect::<Vec<_>>()
            .join("\n\n"))
    }

    fn build_form_prompt(
        &self,
        raw_text: &str,
        language: Language,
        kind: TemplateKind,
        metadata: &ProjectMetadata,
    ) -> Result<String, ScanError> {
        let template = self.templates.load(language, kind)?;
        let cleaned = clean_text(raw_text);
        let summary = prefill_summary(metadata);
        let values = prompt_values(&cleaned, metadata, &summary);
        Ok(build_prompt(&template.prompt, &values))
    }

    fn extract_single(
        &self,
        raw_text: &str,
        language: Language,
        kind: TemplateKind,
        metadata: &ProjectMetadata,
    ) -> Result<StructuredReport, ScanError> {
        let prompt = self.build_form_prompt(raw_text, language, kind, metadata)?;

        let content = self.completion.complete(&CompletionRequest {
            model: &self.config.model,
            system: Some(JSON_SYSTEM_PROMPT),
            prompt: &prompt,
            max_tokens: self.config.max_tokens_single,
            temperature: self.config.temperature,
            json_mode: true,
        })?;

        let mut report = parse_report(&content)?;
        reconcile(&mut report, metadata)?;
        Ok(report)
    }

    fn upload_source(&self, bytes: &[u8], file_name: &str) -> Result<String, ScanError> {
        let path = format!(
            "{}/{}-{}",
            self.config.upload_prefix,
            Utc::now().timestamp_millis(),
            file_name
        );
        self.storage
            .upload(
                &self.config.upload_bucket,
                &path,
                bytes,
                content_type_for(file_name),
            )
            .map_err(ScanError::Persistence)
    }
}

fn validate_upload(bytes: &[u8], project_id: &str) -> Result<(), ScanError> {
    if bytes.is_empty() {
        return Err(ScanError::Upload("No file uploaded".into()));
    }
    if project_id.trim().is_empty() {
        return Err(ScanError::Upload("Project ID is required".into()));
    }
    Ok(())
}

fn content_type_for(file_name: &str) -> &'static str {
    match file_name.rsplit('.').next().map(str::to_ascii_lowercase) {
        Some(ext) if ext == "jpg" || ext == "jpeg" => "image/jpeg",
        Some(ext) if ext == "png" => "image/png",
        Some(ext) if ext == "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}
