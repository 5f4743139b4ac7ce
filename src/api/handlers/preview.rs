use crate::api::error::AppError;
use crate::utils::preview::{PreviewKind, file_extension};
use axum::{
    Json,
    extract::{Path, State},
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FileMetadataResponse {
    pub original_name: String,
    pub file_type: String,
    pub file_size: i64,
    pub created_at: chrono::DateTime<Utc>,
    pub expires_at: Option<chrono::DateTime<Utc>>,
    pub ext: String,
    pub preview_kind: PreviewKind,
    pub url: String,
    pub views: i64,
    pub downloads: i64,
    pub preview_link: String,
    pub download_link: String,
}

#[derive(Serialize, ToSchema)]
pub struct ViewResponse {
    pub success: bool,
    pub views: i64,
}

/// Read-only metadata projection for the preview pane. Never increments
/// the view counter; safe to call repeatedly.
#[utoipa::path(
    get,
    path = "/api/file/{id}",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File metadata", body = FileMetadataResponse),
        (status = 404, description = "Unknown or expired file")
    )
)]
pub async fn get_file_metadata(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<FileMetadataResponse>, AppError> {
    let record = state.file_service.get_metadata(&id).await?;

    let ext = file_extension(&record.original_name);
    let url = state.file_service.resolve_url(&record);

    Ok(Json(FileMetadataResponse {
        ext: ext.clone(),
        preview_kind: PreviewKind::from_extension(&ext),
        url,
        preview_link: format!("/preview/{}", record.id),
        download_link: format!("/download/{}", record.id),
        original_name: record.original_name,
        file_type: record.file_type,
        file_size: record.file_size,
        created_at: record.created_at,
        expires_at: record.expires_at,
        views: record.views,
        downloads: record.downloads,
    }))
}

/// Count one preview view. Every invocation counts; the frontend calls
/// this once per page load.
#[utoipa::path(
    post,
    path = "/api/file/{id}/view",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "View counted", body = ViewResponse),
        (status = 404, description = "Unknown or expired file")
    )
)]
pub async fn record_view(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<ViewResponse>, AppError> {
    let views = state.file_service.record_view(&id).await?;
    Ok(Json(ViewResponse {
        success: true,
        views,
    }))
}
