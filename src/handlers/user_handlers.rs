use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::repositories::UserRepository;
use crate::error::AppError;
use crate::utils::validation::require_fields;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// POST /users — 201 with the created user, 409 on a duplicate email.
pub async fn create_user(
    db_pool: web::Data<PgPool>,
    body: web::Json<CreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    require_fields(&[
        ("name", body.name.as_deref()),
        ("email", body.email.as_deref()),
    ])?;

    let name = body.name.as_deref().unwrap_or_default().trim();
    let email = body.email.as_deref().unwrap_or_default().trim();

    let repo = UserRepository::new(db_pool.get_ref().clone());
    let user = repo.create(name, email, None).await?;

    Ok(HttpResponse::Created().json(user))
}

/// GET /users/{id}
pub async fn get_user(
    db_pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let repo = UserRepository::new(db_pool.get_ref().clone());
    let user = repo.get_by_id(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(user))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// PUT /users/{id} — partial update; at least one field must be supplied.
pub async fn update_user(
    db_pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let name = body.name.as_deref().map(str::trim).filter(|s| !s.is_empty());
    let email = body.email.as_deref().map(str::trim).filter(|s| !s.is_empty());

    if name.is_none() && email.is_none() {
        return Err(AppError::Validation(
            "At least one of name, email is required".to_string(),
        ));
    }

    let repo = UserRepository::new(db_pool.get_ref().clone());
    let user = repo.update(&path.into_inner(), name, email).await?;

    Ok(HttpResponse::Ok().json(user))
}

/// DELETE /users/{id}
pub async fn delete_user(
    db_pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let repo = UserRepository::new(db_pool.get_ref().clone());
    repo.delete(&path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
