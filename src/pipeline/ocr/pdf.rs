use super::OcrError;

/// PDF text-layer extraction abstraction (allows mocking for tests).
pub trait PdfTextSource: Send + Sync {
    /// Extract per-page text from a digital PDF.
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, OcrError>;
}

/// PDF text extractor using the pdf-extract crate.
/// Handles digital PDFs with embedded text layers; scanned PDFs come
/// back empty and belong on the image path instead.
pub struct PdfTextExtractor;

impl PdfTextSource for PdfTextExtractor {
    fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<String>, OcrError> {
        pdf_extract::extract_text_from_mem_by_pages(pdf_bytes)
            .map_err(|e| OcrError::PdfParsing(e.to_string()))
    }
}

/// Mock PDF text source for testing — returns configured pages.
pub struct MockPdfTextSource {
    pages: Vec<String>,
}

impl MockPdfTextSource {
    pub fn new(pages: Vec<String>) -> Self {
        Self { pages }
    }
}

impl PdfTextSource for MockPdfTextSource {
    fn extract_pages(&self, _pdf_bytes: &[u8]) -> Result<Vec<String>, OcrError> {
        Ok(self.pages.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Generate a valid PDF with text using lopdf (the library that
    /// pdf-extract uses internally).
    fn make_test_pdf(text: &str) -> Vec<u8> {
        use lopdf::dictionary;
        use lopdf::{Document, Object, Stream};

        let mut doc = Document::with_version("1.4");

        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
        });

        let content = format!("BT /F1 12 Tf 100 700 Td ({text}) Tj ET");
        let content_stream = Stream::new(dictionary! {}, content.into_bytes());
        let content_id = doc.add_object(content_stream);

        let page_id = doc.new_object_id();
        let pages_id = doc.new_object_id();

        doc.objects.insert(
            page_id,
            Object::Dictionary(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => dictionary! { "F1" => font_id },
                },
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            }),
        );

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    #[test]
    fn extracts_text_layer() {
        let pdf = make_test_pdf("Financial Report Q2");
        let pages = PdfTextExtractor.extract_pages(&pdf).unwrap();
        assert_eq!(pages.len(), 1);
        assert!(pages[0].contains("Financial Report Q2"));
    }

    #[test]
    fn garbage_bytes_fail_to_parse() {
        let result = PdfTextExtractor.extract_pages(b"not a pdf at all");
        assert!(matches!(result, Err(OcrError::PdfParsing(_))));
    }

    #[test]
    fn mock_returns_configured_pages() {
        let source = MockPdfTextSource::new(vec!["page one".into(), "page two".into()]);
        let pages = source.extract_pages(b"ignored").unwrap();
        assert_eq!(pages, vec!["page one", "page two"]);
    }
}
