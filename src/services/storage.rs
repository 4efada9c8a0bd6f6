use std::time::Duration;

use bytes::Bytes;
use reqwest::Client;
use uuid::Uuid;

use crate::config::settings::StorageConfig;
use crate::error::AppError;

const UPLOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the object store: accepts raw bytes plus a file name and
/// returns the publicly resolvable URL of the stored object. One PUT, no
/// retry; a failed upload is terminal for the request.
pub struct StorageService {
    client: Client,
    base_url: String,
    key_prefix: String,
}

impl StorageService {
    pub fn new(config: &StorageConfig) -> Self {
        let client = Client::builder()
            .timeout(UPLOAD_TIMEOUT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: config.base_url.clone(),
            key_prefix: config.key_prefix.clone(),
        }
    }

    /// Uploads the bytes under `{prefix}/{uuid}_{name}` and returns the
    /// object URL. The random segment keeps concurrent uploads of
    /// identically named files from clobbering each other.
    pub async fn upload(
        &self,
        data: Bytes,
        file_name: &str,
        content_type: &str,
    ) -> Result<String, AppError> {
        let object_url = format!(
            "{}/{}/{}_{}",
            self.base_url,
            self.key_prefix,
            Uuid::new_v4(),
            sanitize_file_name(file_name)
        );

        let response = self
            .client
            .put(&object_url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(data)
            .send()
            .await
            .map_err(|e| AppError::External(format!("Object storage upload failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::External(format!(
                "Object storage returned HTTP {}",
                response.status()
            )));
        }

        log::debug!("Uploaded bill image to {}", object_url);
        Ok(object_url)
    }
}

/// Keeps object keys URL-safe; anything outside [A-Za-z0-9._-] becomes '-'.
fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service(base_url: &str) -> StorageService {
        StorageService::new(&StorageConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            key_prefix: "receipts".to_string(),
        })
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("receipt.jpg"), "receipt.jpg");
        assert_eq!(sanitize_file_name("dinner at joe's.png"), "dinner-at-joe-s.png");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[tokio::test]
    async fn test_upload_returns_object_url() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", mockito::Matcher::Regex(r"^/receipts/.*_receipt\.jpg$".to_string()))
            .with_status(200)
            .create_async()
            .await;

        let service = test_service(&server.url());
        let url = service
            .upload(Bytes::from_static(b"fake-image"), "receipt.jpg", "image/jpeg")
            .await
            .unwrap();

        assert!(url.contains("/receipts/"));
        assert!(url.ends_with("_receipt.jpg"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_failure_is_external_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("PUT", mockito::Matcher::Any)
            .with_status(503)
            .create_async()
            .await;

        let service = test_service(&server.url());
        match service
            .upload(Bytes::from_static(b"fake-image"), "receipt.jpg", "image/jpeg")
            .await
        {
            Err(AppError::External(_)) => {}
            other => panic!("expected External error, got {:?}", other),
        }
    }
}
