pub mod builder;
pub mod template;

pub use builder::*;
pub use template::*;

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("no prompt template for language \"{language}\" at {path}")]
    NotFound { language: String, path: PathBuf },

    #[error("template file {path} is not valid JSON: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error reading template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
