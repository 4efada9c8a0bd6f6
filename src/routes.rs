use actix_web::http::header;
use actix_web::{HttpResponse, web};

use crate::handlers;

/// Shared 405 reply: unlisted methods on a known route answer with the
/// enumerated allow-list. CORS preflights never reach this — the CORS
/// middleware replies to OPTIONS before routing.
fn method_not_allowed(allowed: &'static str) -> HttpResponse {
    HttpResponse::MethodNotAllowed()
        .insert_header((header::ALLOW, allowed))
        .json(serde_json::json!({
            "code": 405,
            "message": format!("Method not allowed. Allowed: {}", allowed),
            "error_type": "method_not_allowed"
        }))
}

/// Configures the API routes. One resource per operation family, each with
/// a `default_service` so the method-gating contract is uniform.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users")
            .route(web::post().to(handlers::user_handlers::create_user))
            .default_service(web::route().to(|| async { method_not_allowed("POST, OPTIONS") })),
    );
    cfg.service(
        web::resource("/users/{id}")
            .route(web::get().to(handlers::user_handlers::get_user))
            .route(web::put().to(handlers::user_handlers::update_user))
            .route(web::delete().to(handlers::user_handlers::delete_user))
            .default_service(
                web::route().to(|| async { method_not_allowed("GET, PUT, DELETE, OPTIONS") }),
            ),
    );

    cfg.service(
        web::resource("/parties")
            .route(web::post().to(handlers::party_handlers::create_party))
            .default_service(web::route().to(|| async { method_not_allowed("POST, OPTIONS") })),
    );
    cfg.service(
        web::resource("/parties/{id}")
            .route(web::get().to(handlers::party_handlers::get_party))
            .route(web::put().to(handlers::party_handlers::update_party))
            .route(web::delete().to(handlers::party_handlers::delete_party))
            .default_service(
                web::route().to(|| async { method_not_allowed("GET, PUT, DELETE, OPTIONS") }),
            ),
    );
    cfg.service(
        web::resource("/parties/{id}/contributors")
            .route(web::post().to(handlers::party_handlers::add_contributor))
            .default_service(web::route().to(|| async { method_not_allowed("POST, OPTIONS") })),
    );
    cfg.service(
        web::resource("/parties/{id}/receipts")
            .route(web::get().to(handlers::receipt_handlers::list_receipts))
            .route(web::post().to(handlers::receipt_handlers::upload_receipt))
            .default_service(
                web::route().to(|| async { method_not_allowed("GET, POST, OPTIONS") }),
            ),
    );

    cfg.service(
        web::resource("/expenses")
            .route(web::post().to(handlers::expense_handlers::create_expense))
            .default_service(web::route().to(|| async { method_not_allowed("POST, OPTIONS") })),
    );
    cfg.service(
        web::resource("/expenses/{id}")
            .route(web::get().to(handlers::expense_handlers::get_expense))
            .route(web::put().to(handlers::expense_handlers::update_expense))
            .route(web::delete().to(handlers::expense_handlers::delete_expense))
            .default_service(
                web::route().to(|| async { method_not_allowed("GET, PUT, DELETE, OPTIONS") }),
            ),
    );

    cfg.service(
        web::resource("/auth/me")
            .route(web::get().to(handlers::auth_handlers::get_me))
            .default_service(web::route().to(|| async { method_not_allowed("GET, OPTIONS") })),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_cors::Cors;
    use actix_web::http::Method;
    use actix_web::{App, test};
    use sqlx::postgres::PgPoolOptions;
    use std::sync::Arc;

    use crate::config::settings::{AuthConfig, OcrConfig, StorageConfig};
    use crate::db::repositories::UserRepository;
    use crate::services::auth::{AuthService, TokenValidator};
    use crate::services::ocr::OcrService;
    use crate::services::storage::StorageService;

    // No test below reaches the database; the pool never connects
    fn lazy_pool() -> sqlx::PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost:1/unreachable")
            .unwrap()
    }

    fn test_app_data() -> (
        web::Data<sqlx::PgPool>,
        web::Data<AuthService>,
        web::Data<StorageService>,
        web::Data<OcrService>,
    ) {
        let pool = lazy_pool();
        let validator = TokenValidator::new(&AuthConfig {
            issuer: "https://issuer.example".to_string(),
            client_id: "splitwell-web".to_string(),
        });
        let auth = AuthService::new(Arc::new(validator), UserRepository::new(pool.clone()));
        let storage = StorageService::new(&StorageConfig {
            base_url: "https://storage.example".to_string(),
            key_prefix: "receipts".to_string(),
        });
        let ocr = OcrService::new(&OcrConfig {
            endpoint: "https://ocr.example/analyze".to_string(),
            api_key: "test".to_string(),
        });

        (
            web::Data::new(pool),
            web::Data::new(auth),
            web::Data::new(storage),
            web::Data::new(ocr),
        )
    }

    macro_rules! test_service {
        () => {{
            let (pool, auth, storage, ocr) = test_app_data();
            test::init_service(
                App::new()
                    .wrap(Cors::permissive())
                    .app_data(pool)
                    .app_data(auth)
                    .app_data(storage)
                    .app_data(ocr)
                    .configure(configure_routes),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn test_unlisted_method_is_405_with_allow_header() {
        let app = test_service!();

        let cases = [
            ("/users", Method::PATCH),
            ("/parties", Method::GET),
            ("/parties/7d7f9c91-9a51-4f2e-8d38-2a31f4a35c2a", Method::PATCH),
            ("/expenses", Method::GET),
            ("/expenses/7d7f9c91-9a51-4f2e-8d38-2a31f4a35c2a", Method::POST),
            ("/auth/me", Method::POST),
        ];

        for (uri, method) in cases {
            let req = test::TestRequest::with_uri(uri).method(method.clone()).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status().as_u16(), 405, "{} {}", method, uri);
            assert!(
                resp.headers().contains_key(header::ALLOW),
                "missing Allow header for {} {}",
                method,
                uri
            );
        }
    }

    #[actix_web::test]
    async fn test_preflight_gets_cors_reply() {
        let app = test_service!();

        let uris = ["/users", "/parties", "/expenses", "/auth/me"];
        for uri in uris {
            let req = test::TestRequest::with_uri(uri)
                .method(Method::OPTIONS)
                .insert_header((header::ORIGIN, "https://app.example"))
                .insert_header((header::ACCESS_CONTROL_REQUEST_METHOD, "POST"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert!(resp.status().is_success(), "preflight failed for {}", uri);
            assert!(
                resp.headers()
                    .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN),
                "missing CORS header for {}",
                uri
            );
        }
    }

    #[actix_web::test]
    async fn test_create_user_names_missing_fields() {
        let app = test_service!();

        let req = test::TestRequest::post()
            .uri("/users")
            .set_json(serde_json::json!({"name": "Ada"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);

        let body = test::read_body(resp).await;
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("email"), "body was: {}", body);
    }

    #[actix_web::test]
    async fn test_create_party_requires_owner() {
        let app = test_service!();

        let req = test::TestRequest::post()
            .uri("/parties")
            .set_json(serde_json::json!({"name": "Trip"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);

        let body = test::read_body(resp).await;
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("ownerId"), "body was: {}", body);
    }

    #[actix_web::test]
    async fn test_malformed_json_is_400() {
        let app = test_service!();

        let req = test::TestRequest::post()
            .uri("/parties")
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 400);
    }

    #[actix_web::test]
    async fn test_me_without_credentials_is_401() {
        let app = test_service!();

        let req = test::TestRequest::get().uri("/auth/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 401);
    }

    #[actix_web::test]
    async fn test_receipt_upload_without_credentials_is_401() {
        let app = test_service!();

        let req = test::TestRequest::post()
            .uri("/parties/7d7f9c91-9a51-4f2e-8d38-2a31f4a35c2a/receipts")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status().as_u16(), 401);
    }
}
