use crate::api::error::AppError;
use crate::entities::files;
use crate::services::file_service::types::{Pagination, StorageStats};
use crate::utils::auth::create_admin_token;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, ToSchema)]
pub struct AdminLoginResponse {
    pub success: bool,
    pub token: String,
}

#[derive(Deserialize)]
pub struct ListFilesQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

#[derive(Serialize, ToSchema)]
pub struct AdminFilesResponse {
    pub success: bool,
    #[schema(value_type = Vec<Object>)]
    pub files: Vec<files::Model>,
    pub pagination: Pagination,
}

#[derive(Serialize, ToSchema)]
pub struct AdminActionResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Deserialize, ToSchema)]
pub struct BulkDeleteRequest {
    pub ids: Vec<String>,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteResponse {
    pub success: bool,
    pub message: String,
    pub deleted_count: usize,
}

#[derive(Serialize, ToSchema)]
pub struct StatsResponse {
    pub success: bool,
    pub stats: StorageStats,
}

/// Static-credential login. Every successful login mints its own signed,
/// expiring token; nothing is remembered server-side.
#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Login successful", body = AdminLoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn admin_login(
    State(state): State<crate::AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> Result<Json<AdminLoginResponse>, AppError> {
    if req.username != state.config.admin_username
        || req.password != state.config.admin_password
    {
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let token = create_admin_token(
        &state.config.jwt_secret,
        state.config.admin_token_ttl_hours,
    )
    .map_err(|e| AppError::Internal(e.to_string()))?;

    tracing::info!("🔑 Admin login successful");
    Ok(Json(AdminLoginResponse {
        success: true,
        token,
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/files",
    params(
        ("page" = Option<u64>, Query, description = "1-based page number"),
        ("limit" = Option<u64>, Query, description = "Page size")
    ),
    responses(
        (status = 200, description = "Paginated file listing", body = AdminFilesResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("admin_token" = []))
)]
pub async fn list_files(
    State(state): State<crate::AppState>,
    Query(query): Query<ListFilesQuery>,
) -> Result<Json<AdminFilesResponse>, AppError> {
    let (records, pagination) = state
        .file_service
        .list_files(query.page.unwrap_or(1), query.limit.unwrap_or(10))
        .await?;

    Ok(Json(AdminFilesResponse {
        success: true,
        files: records,
        pagination,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/admin/files/{id}",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File deleted", body = AdminActionResponse),
        (status = 401, description = "Missing or invalid token"),
        (status = 404, description = "File not found")
    ),
    security(("admin_token" = []))
)]
pub async fn delete_file(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
) -> Result<Json<AdminActionResponse>, AppError> {
    state.file_service.delete_file(&id).await?;
    Ok(Json(AdminActionResponse {
        success: true,
        message: "File deleted successfully".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/api/admin/files/bulk-delete",
    request_body = BulkDeleteRequest,
    responses(
        (status = 200, description = "Batch processed", body = BulkDeleteResponse),
        (status = 400, description = "Empty id list"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("admin_token" = []))
)]
pub async fn bulk_delete(
    State(state): State<crate::AppState>,
    Json(req): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, AppError> {
    if req.ids.is_empty() {
        return Err(AppError::BadRequest("No file ids provided".to_string()));
    }

    let deleted = state.file_service.bulk_delete(req.ids).await?;
    Ok(Json(BulkDeleteResponse {
        success: true,
        message: format!("Deleted {} files", deleted),
        deleted_count: deleted,
    }))
}

#[utoipa::path(
    get,
    path = "/api/admin/stats",
    responses(
        (status = 200, description = "Aggregate totals", body = StatsResponse),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("admin_token" = []))
)]
pub async fn stats(
    State(state): State<crate::AppState>,
) -> Result<Json<StatsResponse>, AppError> {
    let stats = state.file_service.stats().await?;
    Ok(Json(StatsResponse {
        success: true,
        stats,
    }))
}
