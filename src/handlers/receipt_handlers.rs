use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, web};
use bytes::Bytes;
use futures_util::StreamExt;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::repositories::BillImageRepository;
use crate::error::AppError;
use crate::services::auth::AuthService;
use crate::services::ocr::OcrService;
use crate::services::storage::StorageService;

struct ReceiptUpload {
    data: Vec<u8>,
    file_name: String,
    content_type: String,
    title: Option<String>,
}

/// POST /parties/{id}/receipts — authenticated. Uploads the image to
/// object storage first; once the URL exists, the bill-image record write
/// and the OCR analysis have no ordering dependency and run concurrently,
/// both awaited before the response.
pub async fn upload_receipt(
    req: HttpRequest,
    path: web::Path<Uuid>,
    payload: Multipart,
    auth: web::Data<AuthService>,
    storage: web::Data<StorageService>,
    ocr: web::Data<OcrService>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    auth.resolve(&req).await?;

    let party_id = path.into_inner();
    let upload = read_receipt_multipart(payload).await?;

    let image_url = storage
        .upload(Bytes::from(upload.data), &upload.file_name, &upload.content_type)
        .await?;

    let title = upload.title.unwrap_or_else(|| upload.file_name.clone());
    let bill_images = BillImageRepository::new(db_pool.get_ref().clone());

    let (image, analysis) = tokio::join!(
        bill_images.create(&party_id, &title, &image_url),
        ocr.analyze(&image_url)
    );

    let image = image?;
    let analysis = analysis?;

    Ok(HttpResponse::Created().json(serde_json::json!({
        "billImage": image,
        "analysis": analysis,
    })))
}

/// GET /parties/{id}/receipts — the party's stored bill images.
pub async fn list_receipts(
    path: web::Path<Uuid>,
    db_pool: web::Data<PgPool>,
) -> Result<HttpResponse, AppError> {
    let bill_images = BillImageRepository::new(db_pool.get_ref().clone());
    let images = bill_images.list_by_party(&path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(images))
}

async fn read_receipt_multipart(mut payload: Multipart) -> Result<ReceiptUpload, AppError> {
    let mut data = Vec::new();
    let mut file_name = String::from("receipt");
    let mut content_type = "application/octet-stream".to_string();
    let mut title: Option<String> = None;
    let mut saw_file = false;

    while let Some(item) = payload.next().await {
        let mut field = item?;

        let field_name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::BadRequest("Multipart field name missing".to_string()))?;

        match field_name.as_str() {
            "file" => {
                saw_file = true;
                if let Some(fname) = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename())
                {
                    file_name = fname.to_string();
                }
                if let Some(mime) = field.content_type() {
                    content_type = mime.to_string();
                }
                while let Some(chunk) = field.next().await {
                    data.extend_from_slice(&chunk?);
                }
            }
            "title" => {
                let mut raw = Vec::new();
                while let Some(chunk) = field.next().await {
                    raw.extend_from_slice(&chunk?);
                }
                let value = String::from_utf8(raw).map_err(|_| {
                    AppError::BadRequest("Invalid title encoding".to_string())
                })?;
                if !value.trim().is_empty() {
                    title = Some(value.trim().to_string());
                }
            }
            _ => {
                // Unknown fields are drained and ignored
                while let Some(chunk) = field.next().await {
                    let _ = chunk?;
                }
            }
        }
    }

    if !saw_file || data.is_empty() {
        return Err(AppError::Validation(
            "Missing required fields: file".to_string(),
        ));
    }

    Ok(ReceiptUpload {
        data,
        file_name,
        content_type,
        title,
    })
}
