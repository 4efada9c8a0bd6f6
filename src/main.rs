use actix_web::{App, HttpServer, middleware::Logger, web};
use actix_cors::Cors;
use dotenv::dotenv;
use std::net::TcpListener;
use std::sync::Arc;

mod config;
mod db;
mod error;
mod handlers;
mod models;
mod routes;
mod services;
mod utils;

use crate::config::AppSettings;
use crate::db::connection::{create_pool, verify_connection};
use crate::db::repositories::UserRepository;
use crate::routes::configure_routes;
use crate::services::auth::{AuthService, TokenValidator};
use crate::services::ocr::OcrService;
use crate::services::storage::StorageService;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    // Load application settings
    let app_settings = match AppSettings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            log::error!("Failed to load application settings: {}", e);
            log::error!("Cannot start server without valid settings");
            std::process::exit(1);
        }
    };

    // Database connection setup
    let db_pool = match create_pool(&app_settings.database).await {
        Ok(pool) => {
            if let Err(e) = verify_connection(&pool).await {
                log::error!("Database connection verification failed: {}", e);
                log::error!("Cannot start server without a working database connection");
                std::process::exit(1);
            }
            log::info!("Database connection established successfully");
            pool
        }
        Err(e) => {
            log::error!("Failed to create database connection pool: {}", e);
            log::error!("Cannot start server without a working database connection");
            std::process::exit(1);
        }
    };

    // Every service receives its collaborators here; nothing constructs
    // its own dependencies or reads the environment later
    let token_validator = Arc::new(TokenValidator::new(&app_settings.auth));
    let auth_service = web::Data::new(AuthService::new(
        token_validator,
        UserRepository::new(db_pool.clone()),
    ));
    let storage_service = web::Data::new(StorageService::new(&app_settings.storage));
    let ocr_service = web::Data::new(OcrService::new(&app_settings.ocr));
    log::info!("Auth, storage, and OCR services initialized");

    let host = &app_settings.server.host;
    let port = app_settings.server.port;

    log::info!("Starting server at http://{}:{}", host, port);

    let server_addr = format!("{}:{}", host, port);
    let listener = TcpListener::bind(server_addr)?;

    HttpServer::new(move || {
        let app_settings = app_settings.clone();

        // Configure CORS using actix-cors
        let mut cors = Cors::default().supports_credentials();

        if app_settings.server.cors_origins.contains(&"*".to_string()) {
            cors = cors.allow_any_origin();
        } else {
            for origin in &app_settings.server.cors_origins {
                cors = cors.allowed_origin(origin);
            }
        }

        cors = cors.allow_any_method().allow_any_header();

        App::new()
            .wrap(Logger::default())
            .wrap(cors)
            .app_data(web::Data::new(app_settings.clone()))
            .app_data(web::Data::new(db_pool.clone()))
            .app_data(auth_service.clone())
            .app_data(storage_service.clone())
            .app_data(ocr_service.clone())
            // Health check endpoint outside the API scope
            .service(web::resource("/health").route(web::get().to(handlers::health::health_check)))
            .service(web::scope("/api").configure(configure_routes))
    })
    .listen(listener)?
    .run()
    .await
}
