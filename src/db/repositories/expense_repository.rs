use bigdecimal::BigDecimal;
use uuid::Uuid;
use sqlx::PgPool;
use serde::{Deserialize, Serialize};
use crate::error::AppError;
use crate::models::{Expense, ExpenseParticipant};

/// Input for expense creation: the expense row plus its participant rows,
/// written in one transaction.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub party_id: Uuid,
    pub payer_id: Uuid,
    pub description: String,
    pub amount: BigDecimal,
    pub participants: Vec<NewParticipant>,
}

#[derive(Debug, Clone)]
pub struct NewParticipant {
    pub user_id: Uuid,
    pub share: BigDecimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseWithParticipants {
    #[serde(flatten)]
    pub expense: Expense,
    pub participants: Vec<ExpenseParticipant>,
}

pub struct ExpenseRepository {
    db_pool: PgPool,
}

impl ExpenseRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    // Create an expense together with its participant rows
    pub async fn create(&self, new_expense: &NewExpense) -> Result<Expense, AppError> {
        let expense_id = Uuid::new_v4();

        let mut tx = self
            .db_pool
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open transaction: {}", e)))?;

        let expense = sqlx::query_as::<_, Expense>(
            r#"
            INSERT INTO expenses (expense_id, party_id, payer_id, description, amount, created_at)
            VALUES ($1, $2, $3, $4, $5, now())
            RETURNING expense_id, party_id, payer_id, description, amount, created_at
            "#,
        )
        .bind(expense_id)
        .bind(new_expense.party_id)
        .bind(new_expense.payer_id)
        .bind(&new_expense.description)
        .bind(&new_expense.amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to create expense: {}", e)))?;

        for participant in &new_expense.participants {
            sqlx::query(
                r#"
                INSERT INTO expense_participants (expense_id, user_id, share)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(expense_id)
            .bind(participant.user_id)
            .bind(&participant.share)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Failed to add expense participant: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit expense creation: {}", e)))?;

        Ok(expense)
    }

    // Get an expense with its participants
    pub async fn get_by_id(&self, id: &Uuid) -> Result<ExpenseWithParticipants, AppError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            SELECT expense_id, party_id, payer_id, description, amount, created_at
            FROM expenses
            WHERE expense_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("Expense not found: {}", id)),
            _ => AppError::Database(format!("Failed to fetch expense: {}", e)),
        })?;

        let participants = sqlx::query_as::<_, ExpenseParticipant>(
            r#"
            SELECT expense_id, user_id, share
            FROM expense_participants
            WHERE expense_id = $1
            "#,
        )
        .bind(id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch expense participants: {}", e)))?;

        Ok(ExpenseWithParticipants {
            expense,
            participants,
        })
    }

    // Update description and amount
    pub async fn update(
        &self,
        id: &Uuid,
        description: &str,
        amount: &BigDecimal,
    ) -> Result<Expense, AppError> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            UPDATE expenses
            SET description = $1, amount = $2
            WHERE expense_id = $3
            RETURNING expense_id, party_id, payer_id, description, amount, created_at
            "#,
        )
        .bind(description)
        .bind(amount)
        .bind(id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("Expense not found: {}", id)),
            _ => AppError::Database(format!("Failed to update expense: {}", e)),
        })?;

        Ok(expense)
    }

    // Delete an expense and its participant rows
    pub async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tx = self
            .db_pool
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open transaction: {}", e)))?;

        sqlx::query("DELETE FROM expense_participants WHERE expense_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete expense participants: {}", e)))?;

        let result = sqlx::query("DELETE FROM expenses WHERE expense_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete expense: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Expense not found: {}", id)));
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit expense deletion: {}", e)))?;

        Ok(())
    }
}
