use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::TemplateError;
use crate::pipeline::language::Language;

/// Which prompt template a scan operation needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Photographed paper form (the custom-form scan path).
    CustomForm,
    /// Digital PDF form text layer.
    PdfForm,
}

impl TemplateKind {
    fn file_name(&self) -> &'static str {
        match self {
            TemplateKind::CustomForm => "custom-prompts.json",
            TemplateKind::PdfForm => "pdf-prompts.json",
        }
    }
}

/// A loaded prompt template. The `prompt` text carries `${...}`
/// placeholders substituted at build time.
#[derive(Debug, Clone, Deserialize)]
pub struct PromptTemplate {
    pub prompt: String,
}

/// Per-language template files under a locale directory:
/// `<root>/<lang-code>/<kind>.json`. A missing file for a requested
/// language is a hard error — never a silent fallback to another
/// language.
pub struct TemplateStore {
    root: PathBuf,
}

impl TemplateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn load(
        &self,
        language: Language,
        kind: TemplateKind,
    ) -> Result<PromptTemplate, TemplateError> {
        let path = self.template_path(language, kind);

        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(TemplateError::NotFound {
                    language: language.code().to_string(),
                    path,
                });
            }
            Err(e) => return Err(TemplateError::Io { path, source: e }),
        };

        serde_json::from_str(&raw).map_err(|e| TemplateError::Invalid { path, source: e })
    }

    fn template_path(&self, language: Language, kind: TemplateKind) -> PathBuf {
        self.root.join(language.code()).join(kind.file_name())
    }
}

impl TemplateStore {
    /// Root directory the store reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }
}
