use crate::api::error::AppError;
use crate::services::file_service::is_external_url;
use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::Response,
};
use futures::TryStreamExt;
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct DownloadRequest {
    #[serde(default)]
    pub password: String,
}

/// Password-gated download of the original bytes. The bytes are streamed
/// from the blob store, or proxied through the backend when the record
/// points at an externally hosted blob.
#[utoipa::path(
    post,
    path = "/api/download/{id}",
    params(
        ("id" = String, Path, description = "File ID")
    ),
    request_body = DownloadRequest,
    responses(
        (status = 200, description = "File bytes as attachment"),
        (status = 400, description = "Missing password"),
        (status = 401, description = "Incorrect password"),
        (status = 404, description = "File not found"),
        (status = 410, description = "Link expired")
    )
)]
pub async fn download_file(
    State(state): State<crate::AppState>,
    Path(id): Path<String>,
    axum::Json(req): axum::Json<DownloadRequest>,
) -> Result<Response, AppError> {
    if req.password.is_empty() {
        return Err(AppError::BadRequest("Password is required".to_string()));
    }

    let record = state.file_service.verify_download(&id, &req.password).await?;

    let content_disposition = content_disposition("attachment", &record.original_name);

    if is_external_url(&record.stored_name) {
        // Externally hosted blob: proxy the bytes so the password gate holds
        let upstream = state
            .file_service
            .http_client()
            .get(&record.stored_name)
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if !upstream.status().is_success() {
            return Err(AppError::Upstream(format!(
                "blob fetch returned {}",
                upstream.status()
            )));
        }

        let stream = upstream.bytes_stream().map_err(std::io::Error::other);

        return Ok(Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, record.file_type)
            .header(header::CONTENT_DISPOSITION, content_disposition)
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from_stream(stream))
            .unwrap());
    }

    let object = state
        .file_service
        .storage()
        .get_object_stream(&record.stored_name)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, record.file_type)
        .header(header::CONTENT_DISPOSITION, content_disposition)
        .header(header::CACHE_CONTROL, "no-cache");
    if object.content_length > 0 {
        builder = builder.header(header::CONTENT_LENGTH, object.content_length);
    }

    Ok(builder
        .body(Body::from_stream(ReaderStream::new(object.reader)))
        .unwrap())
}

/// Content-Disposition with an ASCII fallback name plus the RFC 5987
/// UTF-8 form, so non-ASCII filenames survive every browser.
pub(crate) fn content_disposition(disposition_type: &str, filename: &str) -> String {
    let ascii_filename = filename
        .chars()
        .filter(|c| c.is_ascii() && !c.is_control() && *c != '"' && *c != '\\' && *c != ';')
        .take(64)
        .collect::<String>();
    let fallback_filename = if ascii_filename.is_empty() {
        "file"
    } else {
        &ascii_filename
    };

    let encoded_filename = utf8_percent_encode(filename, NON_ALPHANUMERIC).to_string();

    format!(
        "{}; filename=\"{}\"; filename*=UTF-8''{}",
        disposition_type, fallback_filename, encoded_filename
    )
}
