use serde::{Deserialize, Serialize};

use super::OcrError;

/// Full text annotation tree returned by the OCR provider:
/// pages → blocks → paragraphs → words → symbols, each word carrying a
/// bounding polygon. Field names match the provider's camelCase wire
/// format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextAnnotation {
    #[serde(default)]
    pub pages: Vec<AnnotationPage>,
    /// The provider's own flat rendering of the text. Not used for line
    /// reconstruction — kept for debugging comparisons.
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationPage {
    #[serde(default)]
    pub blocks: Vec<AnnotationBlock>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationBlock {
    #[serde(default)]
    pub paragraphs: Vec<AnnotationParagraph>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationParagraph {
    #[serde(default)]
    pub words: Vec<AnnotationWord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationWord {
    #[serde(default)]
    pub symbols: Vec<AnnotationSymbol>,
    #[serde(default)]
    pub bounding_box: Option<BoundingPoly>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationSymbol {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingPoly {
    #[serde(default)]
    pub vertices: Vec<Vertex>,
}

/// The wire format omits zero-valued coordinates, hence the defaults.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vertex {
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

/// One recognized word anchored at its top-left bounding vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordBox {
    pub text: String,
    pub x: i32,
    pub y: i32,
}

/// OCR provider abstraction (allows mocking for tests).
///
/// Returns `Ok(None)` when the provider detects no text at all — a
/// non-fatal outcome that flows through the pipeline as empty input.
pub trait OcrProvider: Send + Sync {
    fn detect_document_text(&self, image: &[u8]) -> Result<Option<TextAnnotation>, OcrError>;
}

/// Mock OCR provider for testing — returns a configurable annotation.
pub struct MockOcrProvider {
    annotation: Option<TextAnnotation>,
}

impl MockOcrProvider {
    pub fn new(annotation: TextAnnotation) -> Self {
        Self {
            annotation: Some(annotation),
        }
    }

    /// Provider that detects no text.
    pub fn empty() -> Self {
        Self { annotation: None }
    }

    /// Build a single-page annotation from word boxes, one symbol per
    /// character — convenient for layout tests.
    pub fn from_word_boxes(words: &[(&str, i32, i32)]) -> Self {
        let annotation_words = words
            .iter()
            .map(|(text, x, y)| AnnotationWord {
                symbols: text
                    .chars()
                    .map(|c| AnnotationSymbol { text: c.to_string() })
                    .collect(),
                bounding_box: Some(BoundingPoly {
                    vertices: vec![Vertex { x: *x, y: *y }],
                }),
            })
            .collect();

        Self::new(TextAnnotation {
            pages: vec![AnnotationPage {
                blocks: vec![AnnotationBlock {
                    paragraphs: vec![AnnotationParagraph {
                        words: annotation_words,
                    }],
                }],
            }],
            text: String::new(),
        })
    }
}

impl OcrProvider for MockOcrProvider {
    fn detect_document_text(&self, _image: &[u8]) -> Result<Option<TextAnnotation>, OcrError> {
        Ok(self.annotation.clone())
    }
}
