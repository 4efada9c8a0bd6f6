use uuid::Uuid;
use sqlx::PgPool;
use crate::error::AppError;
use crate::models::{Party, PartyAggregate};

/// The aggregate read path: one statement reconstructs the whole party
/// graph server-side. The party row and its owner come from the outer
/// join; expenses (each embedding its own participants), contributors,
/// and bill images are correlated subqueries aggregated into JSON and
/// coalesced to `[]` so an empty collection is an empty list, never null.
///
/// Because everything is a subquery of one outer statement, the store
/// executes it atomically: the nested collections cannot reflect
/// different transaction states.
const PARTY_AGGREGATE_SQL: &str = r#"
SELECT json_build_object(
    'partyId', p.party_id,
    'name', p.name,
    'createdAt', p.created_at,
    'owner', json_build_object('userId', o.user_id, 'name', o.name, 'email', o.email),
    'expenses', COALESCE((
        SELECT json_agg(json_build_object(
            'expenseId', e.expense_id,
            'description', e.description,
            'amount', e.amount::text,
            'payerId', e.payer_id,
            'createdAt', e.created_at,
            'participants', COALESCE((
                SELECT json_agg(json_build_object(
                    'user', json_build_object('userId', pu.user_id, 'name', pu.name, 'email', pu.email),
                    'share', ep.share::text
                ))
                FROM expense_participants ep
                JOIN users pu ON pu.user_id = ep.user_id
                WHERE ep.expense_id = e.expense_id
            ), '[]'::json)
        ) ORDER BY e.created_at)
        FROM expenses e
        WHERE e.party_id = p.party_id
    ), '[]'::json),
    'contributors', COALESCE((
        SELECT json_agg(json_build_object(
            'user', json_build_object('userId', cu.user_id, 'name', cu.name, 'email', cu.email)
        ))
        FROM party_contributors pc
        JOIN users cu ON cu.user_id = pc.user_id
        WHERE pc.party_id = p.party_id
    ), '[]'::json),
    'billImages', COALESCE((
        SELECT json_agg(json_build_object(
            'billId', b.bill_id,
            'fileTitle', b.file_title,
            'imageUrl', b.image_url
        ))
        FROM party_bill_images b
        WHERE b.party_id = p.party_id
    ), '[]'::json)
) AS aggregate
FROM parties p
JOIN users o ON o.user_id = p.owner_id
WHERE p.party_id = $1
"#;

pub struct PartyRepository {
    db_pool: PgPool,
}

impl PartyRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    // Create a new party; the owner is seeded as its first contributor
    pub async fn create(&self, owner_id: &Uuid, name: &str) -> Result<Party, AppError> {
        let party_id = Uuid::new_v4();

        let mut tx = self
            .db_pool
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open transaction: {}", e)))?;

        let party = sqlx::query_as::<_, Party>(
            r#"
            INSERT INTO parties (party_id, owner_id, name, created_at)
            VALUES ($1, $2, $3, now())
            RETURNING party_id, owner_id, name, created_at
            "#,
        )
        .bind(party_id)
        .bind(owner_id)
        .bind(name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO party_contributors (party_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(party_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to add owner as contributor: {}", e)))?;

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit party creation: {}", e)))?;

        Ok(party)
    }

    /// Reconstructs the full party aggregate in one round trip.
    ///
    /// A missing party is `NotFound` (callers map it to 404, not an error
    /// log); a document that comes back but does not decode is a distinct
    /// `Serialization` failure.
    pub async fn get_aggregate(&self, party_id: &Uuid) -> Result<PartyAggregate, AppError> {
        let document = sqlx::query_scalar::<_, serde_json::Value>(PARTY_AGGREGATE_SQL)
            .bind(party_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to fetch party aggregate: {}", e)))?
            .ok_or_else(|| AppError::NotFound(format!("Party not found: {}", party_id)))?;

        parse_aggregate(document)
    }

    // Rename a party
    pub async fn update_name(&self, id: &Uuid, name: &str) -> Result<Party, AppError> {
        let party = sqlx::query_as::<_, Party>(
            r#"
            UPDATE parties
            SET name = $1
            WHERE party_id = $2
            RETURNING party_id, owner_id, name, created_at
            "#,
        )
        .bind(name)
        .bind(id)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => AppError::NotFound(format!("Party not found: {}", id)),
            _ => AppError::Database(format!("Failed to update party: {}", e)),
        })?;

        Ok(party)
    }

    // Add a contributor to a party
    pub async fn add_contributor(&self, party_id: &Uuid, user_id: &Uuid) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO party_contributors (party_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(party_id)
        .bind(user_id)
        .execute(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to add contributor: {}", e)))?;

        Ok(())
    }

    // Delete a party and its dependent rows
    pub async fn delete(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tx = self
            .db_pool
            .begin()
            .await
            .map_err(|e| AppError::Database(format!("Failed to open transaction: {}", e)))?;

        sqlx::query(
            "DELETE FROM expense_participants WHERE expense_id IN \
             (SELECT expense_id FROM expenses WHERE party_id = $1)",
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to delete expense participants: {}", e)))?;

        sqlx::query("DELETE FROM expenses WHERE party_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete expenses: {}", e)))?;

        sqlx::query("DELETE FROM party_contributors WHERE party_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete contributors: {}", e)))?;

        sqlx::query("DELETE FROM party_bill_images WHERE party_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete bill images: {}", e)))?;

        let result = sqlx::query("DELETE FROM parties WHERE party_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(format!("Failed to delete party: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Party not found: {}", id)));
        }

        tx.commit()
            .await
            .map_err(|e| AppError::Database(format!("Failed to commit party deletion: {}", e)))?;

        Ok(())
    }
}

/// Decodes the JSON document the aggregate query emits. Split out so the
/// malformed-document case is testable without a database.
fn parse_aggregate(document: serde_json::Value) -> Result<PartyAggregate, AppError> {
    serde_json::from_value(document).map_err(|e| {
        log::error!("Party aggregate document failed to decode: {}", e);
        AppError::Serialization(format!("Malformed party aggregate document: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample_document() -> serde_json::Value {
        json!({
            "partyId": "7d7f9c91-9a51-4f2e-8d38-2a31f4a35c2a",
            "name": "Ski Trip",
            "createdAt": "2026-03-01T10:00:00+00:00",
            "owner": {
                "userId": "f3f0c5ce-95a5-41a3-9de3-f9cbb5a1d0c1",
                "name": "Ada",
                "email": "ada@example.com"
            },
            "expenses": [
                {
                    "expenseId": "0d4e2c21-7a0a-45be-bb90-dfb40e44ab21",
                    "description": "Cabin",
                    "amount": "420.50",
                    "payerId": "f3f0c5ce-95a5-41a3-9de3-f9cbb5a1d0c1",
                    "createdAt": "2026-03-01T11:00:00+00:00",
                    "participants": [
                        {
                            "user": {
                                "userId": "f3f0c5ce-95a5-41a3-9de3-f9cbb5a1d0c1",
                                "name": "Ada",
                                "email": "ada@example.com"
                            },
                            "share": "210.25"
                        },
                        {
                            "user": {
                                "userId": "da9ad12e-5a16-4f6e-a8bb-df9c4ad80a1e",
                                "name": "Brin",
                                "email": "brin@example.com"
                            },
                            "share": "210.25"
                        }
                    ]
                },
                {
                    "expenseId": "9cf9b2f5-4e85-44dd-a7a8-9bfc6ef9fc53",
                    "description": "Lift passes",
                    "amount": "180",
                    "payerId": "da9ad12e-5a16-4f6e-a8bb-df9c4ad80a1e",
                    "createdAt": "2026-03-02T09:00:00+00:00",
                    "participants": [
                        {
                            "user": {
                                "userId": "da9ad12e-5a16-4f6e-a8bb-df9c4ad80a1e",
                                "name": "Brin",
                                "email": "brin@example.com"
                            },
                            "share": "180"
                        }
                    ]
                }
            ],
            "contributors": [
                {
                    "user": {
                        "userId": "f3f0c5ce-95a5-41a3-9de3-f9cbb5a1d0c1",
                        "name": "Ada",
                        "email": "ada@example.com"
                    }
                }
            ],
            "billImages": []
        })
    }

    #[test]
    fn test_aggregate_decodes_all_collections() {
        let aggregate = parse_aggregate(sample_document()).unwrap();

        assert_eq!(aggregate.name, "Ski Trip");
        assert_eq!(aggregate.owner.email, "ada@example.com");
        assert_eq!(aggregate.expenses.len(), 2);
        assert_eq!(aggregate.expenses[0].participants.len(), 2);
        assert_eq!(aggregate.expenses[1].participants.len(), 1);
        assert_eq!(aggregate.contributors.len(), 1);
        assert!(aggregate.bill_images.is_empty());
    }

    #[test]
    fn test_fresh_party_has_empty_collections() {
        let document = json!({
            "partyId": "7d7f9c91-9a51-4f2e-8d38-2a31f4a35c2a",
            "name": "Trip",
            "createdAt": "2026-03-01T10:00:00+00:00",
            "owner": {
                "userId": "f3f0c5ce-95a5-41a3-9de3-f9cbb5a1d0c1",
                "name": "Ada",
                "email": "ada@example.com"
            },
            "expenses": [],
            "contributors": [],
            "billImages": []
        });

        let aggregate = parse_aggregate(document).unwrap();
        assert!(aggregate.expenses.is_empty());
        assert!(aggregate.contributors.is_empty());
        assert!(aggregate.bill_images.is_empty());
    }

    #[test]
    fn test_malformed_document_is_serialization_error() {
        // A null collection violates the empty-list contract
        let document = json!({
            "partyId": "7d7f9c91-9a51-4f2e-8d38-2a31f4a35c2a",
            "name": "Trip",
            "createdAt": "2026-03-01T10:00:00+00:00",
            "owner": null,
            "expenses": null,
            "contributors": [],
            "billImages": []
        });

        match parse_aggregate(document) {
            Err(AppError::Serialization(_)) => {}
            other => panic!("expected Serialization error, got {:?}", other),
        }
    }

    mod live {
        use super::super::*;
        use crate::db::repositories::UserRepository;
        use std::env;

        async fn test_pool() -> Option<PgPool> {
            let url = env::var("DATABASE_URL").ok()?;
            PgPool::connect(&url).await.ok()
        }

        #[tokio::test]
        async fn test_fresh_party_aggregate_round_trip() {
            let Some(pool) = test_pool().await else { return };
            let users = UserRepository::new(pool.clone());
            let parties = PartyRepository::new(pool.clone());

            let owner = users
                .create("Owner", &format!("{}@example.com", Uuid::new_v4()), None)
                .await
                .unwrap();
            let party = parties.create(&owner.user_id, "Trip").await.unwrap();

            let aggregate = parties.get_aggregate(&party.party_id).await.unwrap();
            assert_eq!(aggregate.owner.user_id, owner.user_id);
            assert!(aggregate.expenses.is_empty());
            assert!(aggregate.bill_images.is_empty());
            // The owner is seeded as the first contributor
            assert_eq!(aggregate.contributors.len(), 1);

            parties.delete(&party.party_id).await.unwrap();
            users.delete(&owner.user_id).await.unwrap();
        }

        #[tokio::test]
        async fn test_aggregate_is_single_snapshot() {
            let Some(pool) = test_pool().await else { return };
            let users = UserRepository::new(pool.clone());
            let parties = PartyRepository::new(pool.clone());

            let owner = users
                .create("Owner", &format!("{}@example.com", Uuid::new_v4()), None)
                .await
                .unwrap();
            let party = parties.create(&owner.user_id, "Trip").await.unwrap();

            // Write an expense inside an open transaction; a concurrent
            // aggregate read must not see any of it until commit.
            let mut tx = pool.begin().await.unwrap();
            sqlx::query(
                "INSERT INTO expenses (expense_id, party_id, payer_id, description, amount, created_at) \
                 VALUES ($1, $2, $3, 'Pending', 10, now())",
            )
            .bind(Uuid::new_v4())
            .bind(party.party_id)
            .bind(owner.user_id)
            .execute(&mut *tx)
            .await
            .unwrap();

            let aggregate = parties.get_aggregate(&party.party_id).await.unwrap();
            assert!(aggregate.expenses.is_empty(), "uncommitted expense leaked into aggregate");

            tx.rollback().await.unwrap();

            parties.delete(&party.party_id).await.unwrap();
            users.delete(&owner.user_id).await.unwrap();
        }
    }
}
