use uuid::Uuid;
use sqlx::PgPool;
use crate::error::AppError;
use crate::models::User;

pub struct UserRepository {
    db_pool: PgPool,
}

impl UserRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    // Get user by ID
    pub async fn get_by_id(&self, id: &Uuid) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, email, external_id, created_at
            FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("User not found: {}", id)),
            _ => AppError::Database(format!("Failed to fetch user: {}", e)),
        })?;

        Ok(user)
    }

    // Get user by email; absence is not an error here, the session
    // resolver treats a missing row as "not provisioned yet"
    pub async fn get_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, name, email, external_id, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to fetch user by email: {}", e)))?;

        Ok(user)
    }

    // Create a new user
    pub async fn create(
        &self,
        name: &str,
        email: &str,
        external_id: Option<&str>,
    ) -> Result<User, AppError> {
        let user_id = Uuid::new_v4();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, name, email, external_id, created_at)
            VALUES ($1, $2, $3, $4, now())
            RETURNING user_id, name, email, external_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(email)
        .bind(external_id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(user)
    }

    /// Atomic insert-or-get keyed by email, used by login provisioning.
    ///
    /// Two concurrent first logins with the same email both land on the
    /// same row: the loser of the insert race takes the DO UPDATE arm and
    /// still gets the row back. The no-op SET keeps RETURNING available on
    /// the conflict path without mutating the existing record.
    pub async fn upsert_by_email(
        &self,
        name: &str,
        email: &str,
        external_id: Option<&str>,
    ) -> Result<User, AppError> {
        let user_id = Uuid::new_v4();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (user_id, name, email, external_id, created_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (email) DO UPDATE SET email = EXCLUDED.email
            RETURNING user_id, name, email, external_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(name)
        .bind(email)
        .bind(external_id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to provision user: {}", e)))?;

        Ok(user)
    }

    // Update user; omitted fields keep their current values
    pub async fn update(
        &self,
        id: &Uuid,
        name: Option<&str>,
        email: Option<&str>,
    ) -> Result<User, AppError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($1, name),
                email = COALESCE($2, email)
            WHERE user_id = $3
            RETURNING user_id, name, email, external_id, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(id)
        .fetch_one(&self.db_pool)
        .await?;

        Ok(user)
    }

    // Delete user
    pub async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE user_id = $1
            "#,
        )
        .bind(id)
        .execute(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete user: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User not found: {}", id)));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    async fn test_pool() -> Option<PgPool> {
        // Provisioning tests need a live database; skip otherwise
        let url = env::var("DATABASE_URL").ok()?;
        PgPool::connect(&url).await.ok()
    }

    #[tokio::test]
    async fn test_upsert_by_email_is_idempotent() {
        let Some(pool) = test_pool().await else { return };
        let repo = UserRepository::new(pool);

        let email = format!("{}@example.com", Uuid::new_v4());
        let first = repo.upsert_by_email("Ada", &email, Some("sub-1")).await.unwrap();
        let second = repo.upsert_by_email("Ada", &email, Some("sub-1")).await.unwrap();

        assert_eq!(first.user_id, second.user_id);
        assert_eq!(second.email, email);

        repo.delete(&first.user_id).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_by_email_missing_row_is_none() {
        let Some(pool) = test_pool().await else { return };
        let repo = UserRepository::new(pool);

        let found = repo
            .get_by_email(&format!("{}@nowhere.example", Uuid::new_v4()))
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
