use actix_web::{HttpResponse, Responder};
use serde::{Serialize, Deserialize};

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    service: String,
    status: String,
    version: String,
}

pub async fn health_check() -> impl Responder {
    // Public endpoint - basic status only, nothing sensitive
    let response = HealthResponse {
        service: env!("CARGO_PKG_NAME").to_string(),
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    };

    HttpResponse::Ok().json(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[tokio::test]
    async fn test_health_reports_ok() {
        let response = health_check().await.respond_to(&actix_web::test::TestRequest::default().to_http_request());
        let body = to_bytes(response.into_body()).await.unwrap();
        let parsed: HealthResponse = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed.status, "ok");
    }
}
