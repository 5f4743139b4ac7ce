pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::file_service::FileService;
use crate::services::storage::StorageService;
use axum::{
    Router,
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{delete, get, post},
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::upload::upload_file,
        api::handlers::upload::upload_metadata,
        api::handlers::preview::get_file_metadata,
        api::handlers::preview::record_view,
        api::handlers::download::download_file,
        api::handlers::serve::serve_file,
        api::handlers::admin::admin_login,
        api::handlers::admin::list_files,
        api::handlers::admin::delete_file,
        api::handlers::admin::bulk_delete,
        api::handlers::admin::stats,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::upload::UploadResponse,
            api::handlers::upload::UploadMetadataRequest,
            api::handlers::preview::FileMetadataResponse,
            api::handlers::preview::ViewResponse,
            api::handlers::download::DownloadRequest,
            api::handlers::admin::AdminLoginRequest,
            api::handlers::admin::AdminLoginResponse,
            api::handlers::admin::AdminFilesResponse,
            api::handlers::admin::AdminActionResponse,
            api::handlers::admin::BulkDeleteRequest,
            api::handlers::admin::BulkDeleteResponse,
            api::handlers::admin::StatsResponse,
            services::file_service::types::Pagination,
            services::file_service::types::StorageStats,
            utils::preview::PreviewKind,
        )
    ),
    tags(
        (name = "files", description = "Upload, preview and download endpoints"),
        (name = "admin", description = "Token-gated admin endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub storage: Arc<dyn StorageService>,
    pub file_service: Arc<FileService>,
    pub config: AppConfig,
}

pub fn create_app(state: AppState) -> Router {
    let cors = if state.config.allowed_origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route("/api/upload", post(api::handlers::upload::upload_file))
        .route(
            "/api/upload/metadata",
            post(api::handlers::upload::upload_metadata),
        )
        .route(
            "/api/file/:id",
            get(api::handlers::preview::get_file_metadata),
        )
        .route(
            "/api/file/:id/view",
            post(api::handlers::preview::record_view),
        )
        .route(
            "/api/download/:id",
            post(api::handlers::download::download_file),
        )
        .route("/files/:stored_name", get(api::handlers::serve::serve_file))
        .route("/api/admin/login", post(api::handlers::admin::admin_login))
        .route(
            "/api/admin/files",
            get(api::handlers::admin::list_files).layer(from_fn_with_state(
                state.clone(),
                api::middleware::admin::admin_auth_middleware,
            )),
        )
        .route(
            "/api/admin/files/:id",
            delete(api::handlers::admin::delete_file).layer(from_fn_with_state(
                state.clone(),
                api::middleware::admin::admin_auth_middleware,
            )),
        )
        .route(
            "/api/admin/files/bulk-delete",
            post(api::handlers::admin::bulk_delete).layer(from_fn_with_state(
                state.clone(),
                api::middleware::admin::admin_auth_middleware,
            )),
        )
        .route(
            "/api/admin/stats",
            get(api::handlers::admin::stats).layer(from_fn_with_state(
                state.clone(),
                api::middleware::admin::admin_auth_middleware,
            )),
        )
        .layer(cors)
        .layer(axum::extract::DefaultBodyLimit::max(
            state.config.max_file_size + 10 * 1024 * 1024, // multipart overhead headroom
        ))
        .with_state(state)
}
