use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A locally provisioned user. Rows are created once (explicitly or on
/// first authenticated sight of an email) and never mutated by the
/// authentication flow.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub user_id: Uuid,
    pub name: String,
    pub email: String,
    /// Identity-provider subject for users provisioned through login.
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
