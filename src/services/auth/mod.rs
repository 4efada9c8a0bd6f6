pub mod session;
pub mod token_validator;

use async_trait::async_trait;

use crate::models::IdentityClaims;

pub use session::AuthService;
pub use token_validator::TokenValidator;

/// Seam between session resolution and credential verification, so the
/// resolver can be exercised without a network-reachable identity provider.
///
/// A `None` return means "no identity" — implementations never raise;
/// callers decide whether that is a 401.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn validate(&self, raw_token: &str) -> Option<IdentityClaims>;
}
