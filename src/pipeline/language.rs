//! Language detection for reconstructed form text.
//!
//! Arabic script presence is decisive; statistical identification only
//! runs on script-free text. Undetectable text defaults to Arabic, the
//! language most report forms are filled in.

use serde::{Deserialize, Serialize};

/// Detected form language. Drives prompt template selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "ar")]
    Arabic,
    #[serde(rename = "en")]
    English,
}

impl Language {
    /// Two-letter code used in template paths and report records.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Arabic => "ar",
            Language::English => "en",
        }
    }
}

/// Detect the primary language of extracted text.
///
/// Order matters: Arabic-Indic digits are normalized first so they
/// neither trip the script check nor confuse the statistical detector,
/// then any remaining Arabic-block character decides the answer
/// outright.
pub fn detect_language(text: &str) -> Language {
    let normalized = normalize_arabic_digits(text);

    if normalized.chars().any(is_arabic_block) {
        return Language::Arabic;
    }

    match whatlang::detect(&normalized).map(|info| info.lang()) {
        Some(whatlang::Lang::Ara) => Language::Arabic,
        Some(whatlang::Lang::Eng) => Language::English,
        // Anything else — other languages, too little text — defaults
        // to Arabic (primary user base).
        _ => Language::Arabic,
    }
}

/// Remap Arabic-Indic digits (٠–٩) to ASCII by their position in the
/// digit sequence. Other characters pass through unchanged.
pub fn normalize_arabic_digits(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{0660}'..='\u{0669}' => {
                char::from(b'0' + (c as u32 - 0x0660) as u8)
            }
            _ => c,
        })
        .collect()
}

fn is_arabic_block(c: char) -> bool {
    ('\u{0600}'..='\u{06FF}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arabic_script_is_decisive() {
        let text = "تقرير مصروفات غرفة الطوارئ";
        assert_eq!(detect_language(text), Language::Arabic);
    }

    #[test]
    fn single_arabic_char_overrides_english_text() {
        // Statistical detection would say English; the script check wins.
        let text = "The report was submitted by the volunteer team in م";
        assert_eq!(detect_language(text), Language::Arabic);
    }

    #[test]
    fn english_text_detected_statistically() {
        let text = "The emergency response room received the grant and spent \
                    the full amount on water distribution and communal kitchens \
                    during the reporting period.";
        assert_eq!(detect_language(text), Language::English);
    }

    #[test]
    fn empty_text_defaults_to_arabic() {
        assert_eq!(detect_language(""), Language::Arabic);
        assert_eq!(detect_language("   "), Language::Arabic);
    }

    #[test]
    fn digits_only_defaults_to_arabic() {
        assert_eq!(detect_language("12345 67890"), Language::Arabic);
    }

    #[test]
    fn arabic_indic_digits_normalize_to_ascii() {
        assert_eq!(normalize_arabic_digits("٠١٢٣٤٥٦٧٨٩"), "0123456789");
        assert_eq!(normalize_arabic_digits("المبلغ ٥٠٠"), "المبلغ 500");
        assert_eq!(normalize_arabic_digits("no digits"), "no digits");
    }

    #[test]
    fn normalized_digits_alone_do_not_force_arabic() {
        // Arabic-Indic digits sit in the Arabic block, but normalization
        // runs first — a receipt of bare digits still goes through the
        // statistical path (and falls back to Arabic by default).
        let normalized = normalize_arabic_digits("٤٢٠");
        assert!(!normalized.chars().any(is_arabic_block));
    }

    #[test]
    fn language_codes() {
        assert_eq!(Language::Arabic.code(), "ar");
        assert_eq!(Language::English.code(), "en");
    }

    #[test]
    fn language_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Language::Arabic).unwrap(), "\"ar\"");
        assert_eq!(serde_json::to_string(&Language::English).unwrap(), "\"en\"");
    }
}
