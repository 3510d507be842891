pub mod openai;
pub mod parser;

pub use openai::*;
pub use parser::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("completion service unreachable at {0}")]
    Unreachable(String),

    #[error("completion request timed out after {0}s")]
    Timeout(u64),

    #[error("completion service returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("completion transport error: {0}")]
    Http(String),

    #[error("empty response from completion service")]
    EmptyResponse,

    #[error("no JSON object found in completion response")]
    MissingJson,

    #[error("completion response is not valid JSON: {0}")]
    InvalidJson(String),
}
