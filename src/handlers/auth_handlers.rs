use actix_web::{HttpRequest, HttpResponse, web};
use sqlx::PgPool;

use crate::db::repositories::UserRepository;
use crate::error::AppError;
use crate::services::auth::AuthService;

/// GET /auth/me — resolves the caller's session and returns the local
/// user, provisioning it on first sight. Logging in is signing up.
pub async fn get_me(
    req: HttpRequest,
    auth: web::Data<AuthService>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let claims = auth.resolve(&req).await?;
    let user_id = auth.ensure_provisioned(&claims).await?;

    let repo = UserRepository::new(db_pool.get_ref().clone());
    let user = repo.get_by_id(&user_id).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "userId": user.user_id,
        "name": user.name,
        "email": user.email,
        "groups": claims.groups,
    })))
}
