//! Reading-order reconstruction from OCR word geometry.
//!
//! The annotation tree loses visual line structure; this rebuilds it by
//! sorting words top-to-bottom, left-to-right and greedily grouping
//! words whose vertical positions fall within a fixed proximity of the
//! line they would join.

use super::types::{TextAnnotation, WordBox};

/// Vertical distance (in image units) within which a word joins the
/// currently open line instead of starting a new one. Tuned against
/// scanned handwritten report forms; changing it reorders output lines.
pub const LINE_PROXIMITY: i32 = 15;

/// A line being accumulated during reconstruction. Its `y` is the
/// anchor of the word that opened it, not a running average.
#[derive(Debug)]
struct TextLine {
    y: i32,
    text: String,
}

/// Rebuild the document text from an annotation tree, one line per
/// visual row, rows joined by `\n`. Empty annotation yields an empty
/// string.
pub fn reconstruct_text_with_layout(annotation: &TextAnnotation) -> String {
    let mut words = flatten_words(annotation);
    words.sort_by(|a, b| a.y.cmp(&b.y).then(a.x.cmp(&b.x)));

    let mut lines: Vec<TextLine> = Vec::new();
    for word in words {
        match lines.last_mut() {
            // Membership is decided against the open line only — a word
            // close to an earlier, already-closed line still starts or
            // joins the current row.
            Some(line) if (line.y - word.y).abs() < LINE_PROXIMITY => {
                line.text.push(' ');
                line.text.push_str(&word.text);
            }
            _ => lines.push(TextLine {
                y: word.y,
                text: word.text,
            }),
        }
    }

    lines
        .into_iter()
        .map(|line| line.text)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Flatten the annotation tree into word boxes, anchoring each word at
/// its first bounding vertex and concatenating its symbols.
pub fn flatten_words(annotation: &TextAnnotation) -> Vec<WordBox> {
    let mut words = Vec::new();
    for page in &annotation.pages {
        for block in &page.blocks {
            for paragraph in &block.paragraphs {
                for word in &paragraph.words {
                    let text: String =
                        word.symbols.iter().map(|s| s.text.as_str()).collect();
                    let anchor = word
                        .bounding_box
                        .as_ref()
                        .and_then(|b| b.vertices.first())
                        .copied()
                        .unwrap_or_default();
                    words.push(WordBox {
                        text,
                        x: anchor.x,
                        y: anchor.y,
                    });
                }
            }
        }
    }
    words
}
