use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::config::settings::OcrConfig;
use crate::error::AppError;
use crate::models::ReceiptAnalysis;

const ANALYZE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("OCR request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("OCR vendor returned HTTP {0}")]
    UnexpectedStatus(reqwest::StatusCode),
    #[error("OCR response did not decode: {0}")]
    Decode(String),
}

impl From<OcrError> for AppError {
    fn from(error: OcrError) -> Self {
        AppError::External(error.to_string())
    }
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    url: &'a str,
}

/// Client for the document-intelligence vendor. Only the input/output
/// contract is modeled: a receipt image URL goes in, merchant name,
/// transaction date, and line items come out.
pub struct OcrService {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl OcrService {
    pub fn new(config: &OcrConfig) -> Self {
        let client = Client::builder()
            .timeout(ANALYZE_TIMEOUT)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        }
    }

    pub async fn analyze(&self, image_url: &str) -> Result<ReceiptAnalysis, OcrError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .json(&AnalyzeRequest { url: image_url })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(OcrError::UnexpectedStatus(response.status()));
        }

        let analysis = response
            .json::<ReceiptAnalysis>()
            .await
            .map_err(|e| OcrError::Decode(e.to_string()))?;

        log::debug!(
            "Receipt analysis extracted {} line items (merchant: {:?})",
            analysis.items.len(),
            analysis.merchant_name
        );

        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_service(endpoint: String) -> OcrService {
        OcrService::new(&OcrConfig {
            endpoint,
            api_key: "test-key".to_string(),
        })
    }

    #[tokio::test]
    async fn test_analyze_decodes_vendor_response() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/analyze")
            .match_header("api-key", "test-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "merchantName": "Joe's Diner",
                    "transactionDate": "2026-03-02",
                    "items": [
                        {"description": "Burger", "totalPrice": 12.5, "quantity": 1.0},
                        {"description": "Fries", "totalPrice": 4.0, "quantity": 2.0}
                    ]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let service = test_service(format!("{}/analyze", server.url()));
        let analysis = service.analyze("https://store.example/r.jpg").await.unwrap();

        assert_eq!(analysis.merchant_name.as_deref(), Some("Joe's Diner"));
        assert_eq!(analysis.items.len(), 2);
        assert_eq!(analysis.items[0].description, "Burger");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_analyze_vendor_failure_surfaces_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/analyze")
            .with_status(429)
            .create_async()
            .await;

        let service = test_service(format!("{}/analyze", server.url()));
        match service.analyze("https://store.example/r.jpg").await {
            Err(OcrError::UnexpectedStatus(status)) => assert_eq!(status.as_u16(), 429),
            other => panic!("expected UnexpectedStatus, got {:?}", other),
        }
    }
}
