//! Document text detection via the Google Vision REST API.
//!
//! One request per scanned image, `DOCUMENT_TEXT_DETECTION` with Arabic
//! and English language hints. The response's full text annotation tree
//! is handed to layout reconstruction unchanged.

use base64::Engine as _;
use serde::{Deserialize, Serialize};

use super::types::{OcrProvider, TextAnnotation};
use super::OcrError;

const DEFAULT_ENDPOINT: &str = "https://vision.googleapis.com";

/// Language hints sent with every OCR request. Report forms are filled
/// in Arabic, English, or a mix of both.
const LANGUAGE_HINTS: &[&str] = &["ar", "en"];

/// Google Vision OCR client.
pub struct GoogleVisionOcr {
    endpoint: String,
    api_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl GoogleVisionOcr {
    pub fn new(api_key: &str, timeout_secs: u64) -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT, api_key, timeout_secs)
    }

    /// Point the client at a non-default endpoint (tests, proxies).
    pub fn with_endpoint(endpoint: &str, api_key: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            client,
            timeout_secs,
        }
    }
}

#[derive(Serialize)]
struct AnnotateBatchRequest<'a> {
    requests: Vec<AnnotateRequest<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateRequest<'a> {
    image: ImageContent,
    features: Vec<Feature<'a>>,
    image_context: ImageContext<'a>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature<'a> {
    #[serde(rename = "type")]
    feature_type: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImageContext<'a> {
    language_hints: &'a [&'a str],
}

#[derive(Deserialize)]
struct AnnotateBatchResponse {
    #[serde(default)]
    responses: Vec<AnnotateResponse>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotateResponse {
    #[serde(default)]
    full_text_annotation: Option<TextAnnotation>,
    #[serde(default)]
    error: Option<ApiStatus>,
}

#[derive(Deserialize)]
struct ApiStatus {
    #[serde(default)]
    code: i32,
    #[serde(default)]
    message: String,
}

impl OcrProvider for GoogleVisionOcr {
    fn detect_document_text(&self, image: &[u8]) -> Result<Option<TextAnnotation>, OcrError> {
        let _span = tracing::info_span!("vision_ocr", image_size = image.len()).entered();
        let start = std::time::Instant::now();

        let url = format!("{}/v1/images:annotate?key={}", self.endpoint, self.api_key);
        let body = AnnotateBatchRequest {
            requests: vec![AnnotateRequest {
                image: ImageContent {
                    content: base64::engine::general_purpose::STANDARD.encode(image),
                },
                features: vec![Feature {
                    feature_type: "DOCUMENT_TEXT_DETECTION",
                }],
                image_context: ImageContext {
                    language_hints: LANGUAGE_HINTS,
                },
            }],
        };

        let response = self.client.post(&url).json(&body).send().map_err(|e| {
            if e.is_connect() {
                OcrError::Unreachable(self.endpoint.clone())
            } else if e.is_timeout() {
                OcrError::Timeout(self.timeout_secs)
            } else {
                OcrError::ResponseParsing(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(OcrError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: AnnotateBatchResponse = response
            .json()
            .map_err(|e| OcrError::ResponseParsing(e.to_string()))?;

        let first = parsed
            .responses
            .into_iter()
            .next()
            .ok_or_else(|| OcrError::ResponseParsing("empty annotate response".into()))?;

        if let Some(err) = first.error {
            return Err(OcrError::Api {
                status: err.code as u16,
                body: err.message,
            });
        }

        match &first.full_text_annotation {
            Some(_) => tracing::info!(
                elapsed_ms = %start.elapsed().as_millis(),
                "Document text detected"
            ),
            None => tracing::info!("No text detected"),
        }

        Ok(first.full_text_annotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let client = GoogleVisionOcr::with_endpoint("http://localhost:9090/", "key", 30);
        assert_eq!(client.endpoint, "http://localhost:9090");
        assert_eq!(client.timeout_secs, 30);
    }

    #[test]
    fn default_endpoint_is_google() {
        let client = GoogleVisionOcr::new("key", 30);
        assert_eq!(client.endpoint, "https://vision.googleapis.com");
    }

    #[test]
    fn request_serializes_wire_shape() {
        let body = AnnotateBatchRequest {
            requests: vec![AnnotateRequest {
                image: ImageContent {
                    content: "aGVsbG8=".into(),
                },
                features: vec![Feature {
                    feature_type: "DOCUMENT_TEXT_DETECTION",
                }],
                image_context: ImageContext {
                    language_hints: LANGUAGE_HINTS,
                },
            }],
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(
            json["requests"][0]["features"][0]["type"],
            "DOCUMENT_TEXT_DETECTION"
        );
        assert_eq!(
            json["requests"][0]["imageContext"]["languageHints"][0],
            "ar"
        );
    }

    #[test]
    fn response_without_annotation_is_none() {
        let parsed: AnnotateBatchResponse = serde_json::from_str(r#"{"responses":[{}]}"#).unwrap();
        assert!(parsed.responses[0].full_text_annotation.is_none());
        assert!(parsed.responses[0].error.is_none());
    }

    #[test]
    fn response_error_parses() {
        let parsed: AnnotateBatchResponse = serde_json::from_str(
            r#"{"responses":[{"error":{"code":7,"message":"permission denied"}}]}"#,
        )
        .unwrap();
        let err = parsed.responses[0].error.as_ref().unwrap();
        assert_eq!(err.code, 7);
        assert_eq!(err.message, "permission denied");
    }
}
