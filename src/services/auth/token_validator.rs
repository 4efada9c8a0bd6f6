use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::config::settings::AuthConfig;
use crate::error::AppError;
use crate::models::IdentityClaims;
use super::TokenVerifier;

/// Tokens up to this far past nominal expiry still validate.
pub const EXPIRY_LEEWAY_SECS: u64 = 300;

// JWKS documents are reused for this long before a re-fetch
const JWKS_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug, Deserialize, Clone)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Jwk {
    pub kty: String,
    pub r#use: Option<String>,
    pub kid: Option<String>,
    pub n: String,
    pub e: String,
    pub alg: Option<String>,
}

/// Claim set as it appears on the wire, deserialized without trusting it.
/// The legacy name-identifier and the provider-prefixed claims are kept as
/// fallbacks for tokens minted by older clients.
#[derive(Debug, Deserialize)]
struct RawClaims {
    sub: Option<String>,
    #[serde(rename = "nameid")]
    name_id: Option<String>,
    email: Option<String>,
    name: Option<String>,
    given_name: Option<String>,
    username: Option<String>,
    #[serde(rename = "cognito:username")]
    cognito_username: Option<String>,
    #[serde(rename = "cognito:groups")]
    groups: Option<Vec<String>>,
    aud: Option<serde_json::Value>,
}

/// Verifies bearer tokens against the issuer's published signing keys.
///
/// Every failure path — fetch, parse, signature, claim checks — logs and
/// yields `None` from `validate`. Callers treat a missing identity as
/// "unauthenticated"; nothing here raises.
pub struct TokenValidator {
    client: Client,
    issuer: String,
    client_id: String,
    jwks_cache: Arc<Mutex<Option<(Jwks, Instant)>>>,
}

impl TokenValidator {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            client: Client::new(),
            issuer: config.issuer.clone(),
            client_id: config.client_id.clone(),
            jwks_cache: Arc::new(Mutex::new(None)),
        }
    }

    pub async fn validate(&self, raw_token: &str) -> Option<IdentityClaims> {
        match self.try_validate(raw_token).await {
            Ok(claims) => Some(claims),
            Err(e) => {
                warn!("Token validation failed: {}", e);
                None
            }
        }
    }

    async fn try_validate(&self, raw_token: &str) -> Result<IdentityClaims, AppError> {
        let header = decode_header(raw_token)
            .map_err(|e| AppError::Auth(format!("Invalid token header: {}", e)))?;

        let jwks = self.get_jwks().await?;

        // Prefer the key the header names; without a usable kid, every key
        // in the set is a candidate
        let candidates: Vec<&Jwk> = match header.kid.as_deref() {
            Some(kid) if jwks.keys.iter().any(|k| k.kid.as_deref() == Some(kid)) => jwks
                .keys
                .iter()
                .filter(|k| k.kid.as_deref() == Some(kid))
                .collect(),
            _ => jwks.keys.iter().collect(),
        };

        if candidates.is_empty() {
            return Err(AppError::Auth("JWKS document contains no keys".to_string()));
        }

        let validation = self.build_validation();
        let mut last_error = AppError::Auth("No signing key verified the token".to_string());

        for key in candidates {
            let n = normalize_component(&key.n);
            let e = normalize_component(&key.e);
            let decoding_key = match DecodingKey::from_rsa_components(&n, &e) {
                Ok(k) => k,
                Err(e) => {
                    debug!("Skipping unusable JWKS key {:?}: {}", key.kid, e);
                    continue;
                }
            };

            match decode::<RawClaims>(raw_token, &decoding_key, &validation) {
                Ok(data) => {
                    check_audience(data.claims.aud.as_ref(), &self.client_id)?;
                    return into_identity(data.claims);
                }
                Err(e) => {
                    last_error = AppError::Auth(format!("Token verification failed: {}", e));
                }
            }
        }

        Err(last_error)
    }

    fn build_validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&self.issuer]);
        // The audience claim can be a string or an array, and may be
        // absent entirely; checked manually after decoding
        validation.validate_aud = false;
        validation.leeway = EXPIRY_LEEWAY_SECS;
        validation
    }

    /// Returns the issuer's signing keys, re-fetching when the cached
    /// document is older than the TTL. A failed fetch with a cold or
    /// expired cache fails the validation — stale keys are never used
    /// past their window.
    async fn get_jwks(&self) -> Result<Jwks, AppError> {
        {
            let cache_guard = self.jwks_cache.lock().await;
            if let Some((jwks, cached_at)) = &*cache_guard {
                if cached_at.elapsed() < JWKS_CACHE_TTL {
                    return Ok(jwks.clone());
                }
            }
        } // cache_guard dropped here

        let jwks_url = format!("{}/.well-known/jwks.json", self.issuer);
        let response = self
            .client
            .get(&jwks_url)
            .send()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to fetch JWKS: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::Auth(format!(
                "JWKS endpoint returned HTTP {}",
                response.status()
            )));
        }

        let jwks: Jwks = response
            .json()
            .await
            .map_err(|e| AppError::Auth(format!("Failed to parse JWKS: {}", e)))?;

        {
            let mut cache_guard = self.jwks_cache.lock().await;
            *cache_guard = Some((jwks.clone(), Instant::now()));
        }

        Ok(jwks)
    }
}

#[async_trait]
impl TokenVerifier for TokenValidator {
    async fn validate(&self, raw_token: &str) -> Option<IdentityClaims> {
        TokenValidator::validate(self, raw_token).await
    }
}

/// Some providers publish RSA components padded or in the standard
/// alphabet; `jsonwebtoken` wants unpadded base64url. Values that do not
/// decode at all pass through untouched and fail key construction instead.
fn normalize_component(value: &str) -> String {
    let standardish = value
        .trim_end_matches('=')
        .replace('-', "+")
        .replace('_', "/");

    match STANDARD_NO_PAD.decode(standardish.as_bytes()) {
        Ok(bytes) => URL_SAFE_NO_PAD.encode(bytes),
        Err(_) => value.to_string(),
    }
}

/// Tokens without an audience claim skip the check entirely; access-token
/// flows never carry one. A present claim must name the configured client.
fn check_audience(aud: Option<&serde_json::Value>, client_id: &str) -> Result<(), AppError> {
    let Some(aud) = aud else { return Ok(()) };

    let matches = match aud {
        serde_json::Value::String(s) => s == client_id,
        serde_json::Value::Array(values) => values.iter().any(|v| v.as_str() == Some(client_id)),
        _ => false,
    };

    if matches {
        Ok(())
    } else {
        Err(AppError::Auth(format!(
            "Token audience does not include {}",
            client_id
        )))
    }
}

fn into_identity(claims: RawClaims) -> Result<IdentityClaims, AppError> {
    let subject = claims
        .sub
        .or(claims.name_id)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Auth("Token carries no subject claim".to_string()))?;

    let name = claims
        .name
        .or(claims.given_name)
        .or(claims.username)
        .or(claims.cognito_username);

    Ok(IdentityClaims {
        subject,
        email: claims.email,
        name,
        groups: claims.groups.unwrap_or_default(),
        local_user_id: None,
    })
}
