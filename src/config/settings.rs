use std::env;
use crate::error::AppError;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppSettings {
    pub app: AppConfig,
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub ocr: OcrConfig,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    pub name: String,
    pub environment: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Token issuer, e.g. `https://cognito-idp.eu-west-1.amazonaws.com/pool-id`.
    /// The JWKS document is fetched from `{issuer}/.well-known/jwks.json`.
    pub issuer: String,
    /// Client identifier checked against the token's audience claim
    /// (only when the token carries one).
    pub client_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    pub base_url: String,
    pub key_prefix: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OcrConfig {
    pub endpoint: String,
    pub api_key: String,
}

impl AppSettings {
    pub fn from_env() -> Result<Self, AppError> {
        // App config
        let app_name = env::var("APP_NAME").unwrap_or_else(|_| "splitwell".to_string());
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        // Database config
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| AppError::Configuration("DATABASE_URL must be set".to_string()))?;

        // Server config
        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|_| AppError::Configuration("SERVER_PORT must be a valid port number".to_string()))?;

        // CORS origins
        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        // Identity provider
        let auth_issuer = env::var("AUTH_ISSUER")
            .map_err(|_| AppError::Configuration("AUTH_ISSUER must be set".to_string()))?;
        let auth_issuer = auth_issuer.trim_end_matches('/').to_string();

        url::Url::parse(&auth_issuer)
            .map_err(|_| AppError::Configuration("AUTH_ISSUER must be a valid URL".to_string()))?;

        let auth_client_id = env::var("AUTH_CLIENT_ID")
            .map_err(|_| AppError::Configuration("AUTH_CLIENT_ID must be set".to_string()))?;

        // Object storage
        let storage_base_url = env::var("STORAGE_BASE_URL")
            .map_err(|_| AppError::Configuration("STORAGE_BASE_URL must be set".to_string()))?;
        let storage_base_url = storage_base_url.trim_end_matches('/').to_string();

        let storage_key_prefix = env::var("STORAGE_KEY_PREFIX")
            .unwrap_or_else(|_| "receipts".to_string());

        // OCR vendor
        let ocr_endpoint = env::var("OCR_ENDPOINT")
            .map_err(|_| AppError::Configuration("OCR_ENDPOINT must be set".to_string()))?;

        let ocr_api_key = env::var("OCR_API_KEY")
            .map_err(|_| AppError::Configuration("OCR_API_KEY must be set".to_string()))?;

        Ok(Self {
            app: AppConfig {
                name: app_name,
                environment,
            },
            database: DatabaseConfig {
                url: database_url,
            },
            server: ServerConfig {
                host: server_host,
                port: server_port,
                cors_origins,
            },
            auth: AuthConfig {
                issuer: auth_issuer,
                client_id: auth_client_id,
            },
            storage: StorageConfig {
                base_url: storage_base_url,
                key_prefix: storage_key_prefix,
            },
            ocr: OcrConfig {
                endpoint: ocr_endpoint,
                api_key: ocr_api_key,
            },
        })
    }
}
