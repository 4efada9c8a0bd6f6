use std::sync::Arc;

use actix_web::HttpRequest;
use actix_web::http::header;
use log::{debug, info};
use uuid::Uuid;

use crate::db::repositories::UserRepository;
use crate::error::AppError;
use crate::models::IdentityClaims;
use super::TokenVerifier;

/// Cookie the web dashboard stores the access token under.
pub const ACCESS_TOKEN_COOKIE: &str = "splitwell_access_token";

/// Turns an inbound request into an authenticated identity and reconciles
/// it against the local user store. There is no registration step: the
/// first successful login for an email provisions its user row.
///
/// Both collaborators arrive through the constructor; the service never
/// builds its own validator or repository.
pub struct AuthService {
    verifier: Arc<dyn TokenVerifier>,
    users: UserRepository,
}

impl AuthService {
    pub fn new(verifier: Arc<dyn TokenVerifier>, users: UserRepository) -> Self {
        Self { verifier, users }
    }

    /// Resolves the request's credential into identity claims, attaching
    /// the local user id when a matching row exists. Every failure on this
    /// path — missing credential, invalid token, storage trouble during
    /// the lookup — converts to an authentication failure; nothing
    /// propagates as a server error.
    pub async fn resolve(&self, req: &HttpRequest) -> Result<IdentityClaims, AppError> {
        let token = extract_token(req)
            .ok_or_else(|| AppError::Auth("No credentials presented".to_string()))?;

        let mut claims = self
            .verifier
            .validate(&token)
            .await
            .ok_or_else(|| AppError::Auth("Token validation failed".to_string()))?;

        if let Some(email) = claims.email.clone() {
            match self.users.get_by_email(&email).await {
                Ok(Some(user)) => claims.local_user_id = Some(user.user_id),
                Ok(None) => {}
                Err(e) => {
                    debug!("Local user lookup failed during session resolution: {}", e);
                    return Err(AppError::Auth("Session resolution failed".to_string()));
                }
            }
        }

        Ok(claims)
    }

    /// Returns the local user id for the identity, minting the row on
    /// first sight. The insert-or-get runs as one atomic statement, so two
    /// near-simultaneous first logins converge on the same row.
    pub async fn ensure_provisioned(&self, claims: &IdentityClaims) -> Result<Uuid, AppError> {
        if let Some(id) = claims.local_user_id {
            return Ok(id);
        }

        let email = claims
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::Auth("Token carries no email claim".to_string()))?;

        // Blank display names fall back to the email
        let name = claims
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(email);

        let user = self
            .users
            .upsert_by_email(name, email, Some(&claims.subject))
            .await?;

        info!("Provisioned local user {} for subject {}", user.user_id, claims.subject);
        Ok(user.user_id)
    }
}

/// Pulls the bearer credential out of the request. Priority order:
/// Authorization header, application cookie, `token` query parameter —
/// first match wins.
pub(crate) fn extract_token(req: &HttpRequest) -> Option<String> {
    if let Some(value) = req.headers().get(header::AUTHORIZATION) {
        if let Ok(raw) = value.to_str() {
            let mut parts = raw.trim().splitn(2, ' ');
            if let (Some(scheme), Some(token)) = (parts.next(), parts.next()) {
                if scheme.eq_ignore_ascii_case("bearer") {
                    let token = token.trim();
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    if let Some(cookie) = req.cookie(ACCESS_TOKEN_COOKIE) {
        let value = cookie.value().trim();
        if !value.is_empty() {
            return Some(value.to_string());
        }
    }

    url::form_urlencoded::parse(req.query_string().as_bytes())
        .find(|(key, value)| key == "token" && !value.trim().is_empty())
        .map(|(_, value)| value.trim().to_string())
}
