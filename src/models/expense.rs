use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    pub expense_id: Uuid,
    pub party_id: Uuid,
    pub payer_id: Uuid,
    pub description: String,
    pub amount: BigDecimal,
    pub created_at: DateTime<Utc>,
}

/// One participant's share of an expense.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseParticipant {
    pub expense_id: Uuid,
    pub user_id: Uuid,
    pub share: BigDecimal,
}
