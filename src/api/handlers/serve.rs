use crate::api::error::AppError;
use crate::services::file_service::is_external_url;
use crate::utils::range::{ByteRange, parse_range};
use axum::{
    body::Body,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::Response,
};
use tokio_util::io::ReaderStream;

use super::download::content_disposition;

/// Serves preview bytes for locally stored blobs with single-range support
/// so audio/video elements can scrub. Addressed by the opaque stored name;
/// expired and unknown names are both 404.
#[utoipa::path(
    get,
    path = "/files/{stored_name}",
    params(
        ("stored_name" = String, Path, description = "Opaque blob key")
    ),
    responses(
        (status = 200, description = "Full blob"),
        (status = 206, description = "Requested byte range"),
        (status = 404, description = "Unknown or expired blob"),
        (status = 416, description = "Unsatisfiable range")
    )
)]
pub async fn serve_file(
    State(state): State<crate::AppState>,
    Path(stored_name): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let record = state
        .file_service
        .find_live_by_stored_name(&stored_name)
        .await?;

    // Externally hosted blobs are reached through their own URL
    if is_external_url(&record.stored_name) {
        return Err(AppError::NotFound("File not found".to_string()));
    }

    let storage = state.file_service.storage();
    let total_size = storage
        .get_object_metadata(&record.stored_name)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?
        .size
        .max(0) as u64;

    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let disposition = content_disposition("inline", &record.original_name);

    match parse_range(range_header, total_size) {
        ByteRange::Unsatisfiable => Ok(Response::builder()
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(header::CONTENT_RANGE, format!("bytes */{}", total_size))
            .body(Body::empty())
            .unwrap()),

        ByteRange::Partial { start, end } => {
            let object = storage
                .get_object_range(&record.stored_name, start, end)
                .await
                .map_err(|e| AppError::Upstream(e.to_string()))?;

            Ok(Response::builder()
                .status(StatusCode::PARTIAL_CONTENT)
                .header(header::CONTENT_TYPE, record.file_type)
                .header(header::CONTENT_DISPOSITION, disposition)
                .header(header::ACCEPT_RANGES, "bytes")
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", start, end, total_size),
                )
                .header(header::CONTENT_LENGTH, end - start + 1)
                .body(Body::from_stream(ReaderStream::new(object.reader)))
                .unwrap())
        }

        ByteRange::Full => {
            let object = storage
                .get_object_stream(&record.stored_name)
                .await
                .map_err(|e| AppError::Upstream(e.to_string()))?;

            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, record.file_type)
                .header(header::CONTENT_DISPOSITION, disposition)
                .header(header::ACCEPT_RANGES, "bytes")
                .header(header::CONTENT_LENGTH, total_size)
                .body(Body::from_stream(ReaderStream::new(object.reader)))
                .unwrap())
        }
    }
}
