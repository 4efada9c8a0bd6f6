use actix_web::{HttpResponse, web};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::repositories::PartyRepository;
use crate::error::AppError;
use crate::utils::validation::require_fields;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePartyRequest {
    pub owner_id: Option<Uuid>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePartyRequest {
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddContributorRequest {
    pub user_id: Option<Uuid>,
}

/// POST /parties — 201 with the created party.
pub async fn create_party(
    db_pool: web::Data<PgPool>,
    body: web::Json<CreatePartyRequest>,
) -> Result<HttpResponse, AppError> {
    require_fields(&[("name", body.name.as_deref())])?;
    let owner_id = body.owner_id.ok_or_else(|| {
        AppError::Validation("Missing required fields: ownerId".to_string())
    })?;

    let name = body.name.as_deref().unwrap_or_default().trim();

    let repo = PartyRepository::new(db_pool.get_ref().clone());
    let party = repo.create(&owner_id, name).await?;

    Ok(HttpResponse::Created().json(party))
}

/// GET /parties/{id} — the full aggregate in one round trip.
pub async fn get_party(
    db_pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let repo = PartyRepository::new(db_pool.get_ref().clone());
    let aggregate = repo.get_aggregate(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(aggregate))
}

/// PUT /parties/{id}
pub async fn update_party(
    db_pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePartyRequest>,
) -> Result<HttpResponse, AppError> {
    require_fields(&[("name", body.name.as_deref())])?;

    let name = body.name.as_deref().unwrap_or_default().trim();

    let repo = PartyRepository::new(db_pool.get_ref().clone());
    let party = repo.update_name(&path.into_inner(), name).await?;

    Ok(HttpResponse::Ok().json(party))
}

/// DELETE /parties/{id}
pub async fn delete_party(
    db_pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let repo = PartyRepository::new(db_pool.get_ref().clone());
    repo.delete(&path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// POST /parties/{id}/contributors
pub async fn add_contributor(
    db_pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    body: web::Json<AddContributorRequest>,
) -> Result<HttpResponse, AppError> {
    let user_id = body.user_id.ok_or_else(|| {
        AppError::Validation("Missing required fields: userId".to_string())
    })?;

    let party_id = path.into_inner();
    let repo = PartyRepository::new(db_pool.get_ref().clone());
    repo.add_contributor(&party_id, &user_id).await?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "partyId": party_id,
        "userId": user_id,
    })))
}
