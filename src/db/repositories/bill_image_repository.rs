use uuid::Uuid;
use sqlx::PgPool;
use crate::error::AppError;
use crate::models::BillImage;

pub struct BillImageRepository {
    db_pool: PgPool,
}

impl BillImageRepository {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    // Record an uploaded bill image for a party
    pub async fn create(
        &self,
        party_id: &Uuid,
        file_title: &str,
        image_url: &str,
    ) -> Result<BillImage, AppError> {
        let bill_id = Uuid::new_v4();

        let image = sqlx::query_as::<_, BillImage>(
            r#"
            INSERT INTO party_bill_images (bill_id, file_title, party_id, image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING bill_id, file_title, party_id, image_url
            "#,
        )
        .bind(bill_id)
        .bind(file_title)
        .bind(party_id)
        .bind(image_url)
        .fetch_one(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to record bill image: {}", e)))?;

        Ok(image)
    }

    // List a party's bill images
    pub async fn list_by_party(&self, party_id: &Uuid) -> Result<Vec<BillImage>, AppError> {
        let images = sqlx::query_as::<_, BillImage>(
            r#"
            SELECT bill_id, file_title, party_id, image_url
            FROM party_bill_images
            WHERE party_id = $1
            "#,
        )
        .bind(party_id)
        .fetch_all(&self.db_pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to list bill images: {}", e)))?;

        Ok(images)
    }
}
