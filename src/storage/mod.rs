//! Storage collaborator: project metadata reads, report inserts, and
//! source-file uploads.
//!
//! The pipeline only reads metadata and hands finished artifacts over —
//! it owns no transaction semantics across these calls.

use std::sync::Mutex;

use serde::Deserialize;
use thiserror::Error;

use crate::models::project::ProjectMetadata;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("storage service unreachable at {0}")]
    Unreachable(String),

    #[error("storage request timed out after {0}s")]
    Timeout(u64),

    #[error("storage service returned error (status {status}): {body}")]
    Api { status: u16, body: String },

    #[error("no project found with id {0}")]
    ProjectNotFound(String),

    #[error("storage response parsing error: {0}")]
    ResponseParsing(String),

    #[error("storage transport error: {0}")]
    Http(String),
}

/// Storage service abstraction (allows mocking for tests).
pub trait StorageClient: Send + Sync {
    fn fetch_project_metadata(&self, project_id: &str) -> Result<ProjectMetadata, StorageError>;

    fn insert(&self, table: &str, record: &serde_json::Value) -> Result<(), StorageError>;

    /// Upload a file and return its public URL.
    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError>;
}

impl<T: StorageClient + ?Sized> StorageClient for std::sync::Arc<T> {
    fn fetch_project_metadata(&self, project_id: &str) -> Result<ProjectMetadata, StorageError> {
        (**self).fetch_project_metadata(project_id)
    }

    fn insert(&self, table: &str, record: &serde_json::Value) -> Result<(), StorageError> {
        (**self).insert(table, record)
    }

    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError> {
        (**self).upload(bucket, path, bytes, content_type)
    }
}

/// Supabase-backed storage client: PostgREST for rows, the storage API
/// for files.
pub struct SupabaseStorage {
    base_url: String,
    service_key: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

/// Table holding project records.
const PROJECTS_TABLE: &str = "err_projects";

impl SupabaseStorage {
    pub fn new(base_url: &str, service_key: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
            client,
            timeout_secs,
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> StorageError {
        if e.is_connect() {
            StorageError::Unreachable(self.base_url.clone())
        } else if e.is_timeout() {
            StorageError::Timeout(self.timeout_secs)
        } else {
            StorageError::Http(e.to_string())
        }
    }

    fn check_status(response: reqwest::blocking::Response) -> Result<reqwest::blocking::Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        Err(StorageError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

impl StorageClient for SupabaseStorage {
    fn fetch_project_metadata(&self, project_id: &str) -> Result<ProjectMetadata, StorageError> {
        let url = format!(
            "{}/rest/v1/{}?id=eq.{}&select=*",
            self.base_url, PROJECTS_TABLE, project_id
        );

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .map_err(|e| self.transport_error(e))?;
        let response = Self::check_status(response)?;

        #[derive(Deserialize)]
        struct Rows(Vec<ProjectMetadata>);

        let Rows(rows) = response
            .json()
            .map_err(|e| StorageError::ResponseParsing(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| StorageError::ProjectNotFound(project_id.to_string()))
    }

    fn insert(&self, table: &str, record: &serde_json::Value) -> Result<(), StorageError> {
        let url = format!("{}/rest/v1/{}", self.base_url, table);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .map_err(|e| self.transport_error(e))?;
        Self::check_status(response)?;
        Ok(())
    }

    fn upload(
        &self,
        bucket: &str,
        path: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, StorageError> {
        let url = format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, path);

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .header(reqwest::header::CACHE_CONTROL, "3600")
            .body(bytes.to_vec())
            .send()
            .map_err(|e| self.transport_error(e))?;
        Self::check_status(response)?;

        Ok(format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, path
        ))
    }
}

/// Mock storage for testing — serves configured metadata and records
/// every insert and upload it receives.
pub struct MockStorage {
    metadata: Option<ProjectMetadata>,
    pub inserts: Mutex<Vec<(String, serde_json::Value)>>,
    pub uploads: Mutex<Vec<(String, String)>>,
}

impl MockStorage {
    pub fn new(metadata: ProjectMetadata) -> Self {
        Self {
            metadata: Some(metadata),
            inserts: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }

    /// Storage with no matching project.
    pub fn without_project() -> Self {
        Self {
            metadata: None,
            inserts: Mutex::new(Vec::new()),
            uploads: Mutex::new(Vec::new()),
        }
    }
}

impl StorageClient for MockStorage {
    fn fetch_project_metadata(&self, project_id: &str) -> Result<ProjectMetadata, StorageError> {
        self.metadata
            .clone()
            .ok_or_else(|| StorageError::ProjectNotFound(project_id.to_string()))
    }

    fn insert(&self, table: &str, record: &serde_json::Value) -> Result<(), StorageError> {
        self.inserts
            .lock()
            .unwrap()
            .push((table.to_string(), record.clone()));
        Ok(())
    }

    fn upload(
        &self,
        bucket: &str,
        path: &str,
        _bytes: &[u8],
        _content_type: &str,
    ) -> Result<String, StorageError> {
        self.uploads
            .lock()
            .unwrap()
            .push((bucket.to_string(), path.to_string()));
        Ok(format!("https://storage.test/{bucket}/{path}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn supabase_trims_trailing_slash() {
        let storage = SupabaseStorage::new("https://proj.supabase.co/", "key", 30);
        assert_eq!(storage.base_url, "https://proj.supabase.co");
        assert_eq!(storage.timeout_secs, 30);
    }

    #[test]
    fn mock_serves_metadata() {
        let metadata = ProjectMetadata {
            id: "p1".into(),
            ..Default::default()
        };
        let storage = MockStorage::new(metadata);
        assert_eq!(storage.fetch_project_metadata("p1").unwrap().id, "p1");
    }

    #[test]
    fn mock_without_project_errors() {
        let storage = MockStorage::without_project();
        assert!(matches!(
            storage.fetch_project_metadata("missing"),
            Err(StorageError::ProjectNotFound(_))
        ));
    }

    #[test]
    fn mock_records_inserts_and_uploads() {
        let storage = MockStorage::new(ProjectMetadata::default());
        storage
            .insert("expense_reports", &serde_json::json!({"err_id": "X"}))
            .unwrap();
        let url = storage
            .upload("expense-reports", "custom-reports/1-a.jpg", b"bytes", "image/jpeg")
            .unwrap();

        assert_eq!(storage.inserts.lock().unwrap().len(), 1);
        assert_eq!(storage.uploads.lock().unwrap().len(), 1);
        assert_eq!(
            url,
            "https://storage.test/expense-reports/custom-reports/1-a.jpg"
        );
    }
}
