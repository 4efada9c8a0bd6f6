use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The fully reconstructed party graph: party, owner, expenses (each with
/// its participants), contributors, and bill images, as assembled by one
/// server-side query. Field names match the keys the aggregate query emits.
///
/// Child collections are always present: a party with no expenses carries
/// an empty `expenses` list, never a null.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyAggregate {
    pub party_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub owner: UserSummary,
    pub expenses: Vec<ExpenseAggregate>,
    pub contributors: Vec<Contributor>,
    pub bill_images: Vec<BillImageSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseAggregate {
    pub expense_id: Uuid,
    pub description: String,
    pub amount: BigDecimal,
    pub payer_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub participants: Vec<Participant>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub user: UserSummary,
    pub share: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contributor {
    pub user: UserSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillImageSummary {
    pub bill_id: Uuid,
    pub file_title: String,
    pub image_url: String,
}

/// User projection embedded in aggregate documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
}
