use actix_web::{HttpResponse, web};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::repositories::{ExpenseRepository, NewExpense, NewParticipant};
use crate::error::AppError;
use crate::utils::validation::require_fields;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateExpenseRequest {
    pub party_id: Option<Uuid>,
    pub payer_id: Option<Uuid>,
    pub description: Option<String>,
    pub amount: Option<BigDecimal>,
    #[serde(default)]
    pub participants: Vec<ParticipantRequest>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRequest {
    pub user_id: Uuid,
    pub share: BigDecimal,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpenseRequest {
    pub description: Option<String>,
    pub amount: Option<BigDecimal>,
}

fn require_positive_amount(amount: &BigDecimal) -> Result<(), AppError> {
    if amount <= &BigDecimal::from(0) {
        return Err(AppError::Validation(
            "amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// POST /expenses — the expense and its participant rows land in one
/// transaction; 201 with the created expense.
pub async fn create_expense(
    db_pool: web::Data<PgPool>,
    body: web::Json<CreateExpenseRequest>,
) -> Result<HttpResponse, AppError> {
    require_fields(&[("description", body.description.as_deref())])?;

    let party_id = body.party_id.ok_or_else(|| {
        AppError::Validation("Missing required fields: partyId".to_string())
    })?;
    let payer_id = body.payer_id.ok_or_else(|| {
        AppError::Validation("Missing required fields: payerId".to_string())
    })?;
    let amount = body.amount.clone().ok_or_else(|| {
        AppError::Validation("Missing required fields: amount".to_string())
    })?;
    require_positive_amount(&amount)?;

    let new_expense = NewExpense {
        party_id,
        payer_id,
        description: body.description.as_deref().unwrap_or_default().trim().to_string(),
        amount,
        participants: body
            .participants
            .iter()
            .map(|p| NewParticipant {
                user_id: p.user_id,
                share: p.share.clone(),
            })
            .collect(),
    };

    let repo = ExpenseRepository::new(db_pool.get_ref().clone());
    let expense = repo.create(&new_expense).await?;

    Ok(HttpResponse::Created().json(expense))
}

/// GET /expenses/{id} — expense with its participants.
pub async fn get_expense(
    db_pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let repo = ExpenseRepository::new(db_pool.get_ref().clone());
    let expense = repo.get_by_id(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(expense))
}

/// PUT /expenses/{id}
pub async fn update_expense(
    db_pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateExpenseRequest>,
) -> Result<HttpResponse, AppError> {
    require_fields(&[("description", body.description.as_deref())])?;
    let amount = body.amount.clone().ok_or_else(|| {
        AppError::Validation("Missing required fields: amount".to_string())
    })?;
    require_positive_amount(&amount)?;

    let description = body.description.as_deref().unwrap_or_default().trim().to_string();

    let repo = ExpenseRepository::new(db_pool.get_ref().clone());
    let expense = repo.update(&path.into_inner(), &description, &amount).await?;

    Ok(HttpResponse::Ok().json(expense))
}

/// DELETE /expenses/{id}
pub async fn delete_expense(
    db_pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let repo = ExpenseRepository::new(db_pool.get_ref().clone());
    repo.delete(&path.into_inner()).await?;

    Ok(HttpResponse::NoContent().finish())
}
