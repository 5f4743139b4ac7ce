use crate::api::error::AppError;
use crate::utils::validation::sanitize_filename;
use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_id: String,
    pub preview_link: String,
    pub download_link: String,
}

#[derive(Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UploadMetadataRequest {
    #[validate(length(min = 1, max = 255, message = "originalName must be 1-255 characters"))]
    pub original_name: String,
    #[validate(length(min = 1, message = "fileType is required"))]
    pub file_type: String,
    #[validate(range(min = 1, message = "fileSize must be positive"))]
    pub file_size: i64,
    #[validate(url(message = "filePath must be a URL"))]
    pub file_path: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

fn map_multipart_err(e: axum::extract::multipart::MultipartError) -> AppError {
    let err_msg = e.to_string();
    if err_msg.contains("length limit exceeded") {
        AppError::PayloadTooLarge("Request body exceeds the maximum allowed limit".to_string())
    } else {
        AppError::BadRequest(err_msg)
    }
}

fn links(state: &crate::AppState, id: &str) -> (String, String) {
    (
        format!("{}/preview/{}", state.config.public_base_url, id),
        format!("{}/download/{}", state.config.public_base_url, id),
    )
}

#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content = Multipart, description = "file + password (+ optional expiresInHours)"),
    responses(
        (status = 200, description = "File uploaded", body = UploadResponse),
        (status = 400, description = "Missing file or password"),
        (status = 413, description = "Payload too large"),
        (status = 500, description = "Storage or persistence failure")
    )
)]
pub async fn upload_file(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file: Option<(String, Option<String>, bytes::Bytes)> = None;
    let mut password: Option<String> = None;
    let mut expires_in_hours: Option<i64> = None;

    while let Some(field) = multipart.next_field().await.map_err(map_multipart_err)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("unnamed").to_string();
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field.bytes().await.map_err(map_multipart_err)?;
                file = Some((filename, content_type, data));
            }
            "password" => {
                password = Some(field.text().await.map_err(map_multipart_err)?);
            }
            "expiresInHours" => {
                expires_in_hours = field
                    .text()
                    .await
                    .map_err(map_multipart_err)?
                    .parse()
                    .ok();
            }
            _ => {}
        }
    }

    let (filename, content_type, data) = file.ok_or_else(|| {
        AppError::BadRequest("File and password are required".to_string())
    })?;
    let password = password.filter(|p| !p.is_empty()).ok_or_else(|| {
        AppError::BadRequest("File and password are required".to_string())
    })?;

    let sanitized = sanitize_filename(&filename).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let record = state
        .file_service
        .create_upload(
            &sanitized,
            content_type,
            &password,
            expires_in_hours,
            Box::new(std::io::Cursor::new(data.to_vec())),
        )
        .await?;

    let (preview_link, download_link) = links(&state, &record.id);
    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        file_id: record.id,
        preview_link,
        download_link,
    }))
}

#[utoipa::path(
    post,
    path = "/api/upload/metadata",
    request_body = UploadMetadataRequest,
    responses(
        (status = 200, description = "Metadata registered", body = UploadResponse),
        (status = 400, description = "Missing file metadata or password"),
        (status = 500, description = "Persistence failure")
    )
)]
pub async fn upload_metadata(
    State(state): State<crate::AppState>,
    Json(req): Json<UploadMetadataRequest>,
) -> Result<Json<UploadResponse>, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let record = state
        .file_service
        .create_from_metadata(
            &req.original_name,
            &req.file_type,
            req.file_size,
            &req.file_path,
            &req.password,
        )
        .await?;

    let (preview_link, download_link) = links(&state, &record.id);
    Ok(Json(UploadResponse {
        message: "File metadata saved successfully".to_string(),
        file_id: record.id,
        preview_link,
        download_link,
    }))
}
