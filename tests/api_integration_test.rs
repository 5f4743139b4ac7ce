mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{DateTime, Duration, Utc};
use common::*;
use filevault_backend::entities::{files, prelude::Files};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::json;
use tower::ServiceExt;

const PDF_BYTES: &[u8] = b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\ntrailer\n%%EOF";

#[tokio::test]
async fn test_full_lifecycle_flow() {
    let (_state, app, _storage) = setup_app().await;

    // 1. Upload with a password
    let uploaded = upload(&app, "report.pdf", "application/pdf", PDF_BYTES, "secret1").await;
    let file_id = uploaded["fileId"].as_str().unwrap().to_string();
    assert!(uploaded["previewLink"]
        .as_str()
        .unwrap()
        .ends_with(&format!("/preview/{file_id}")));
    assert!(uploaded["downloadLink"]
        .as_str()
        .unwrap()
        .ends_with(&format!("/download/{file_id}")));

    // 2. Fresh metadata: zero counters, expiry exactly 24h after creation
    let (status, meta) = get_json(&app, &format!("/api/file/{file_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(meta["originalName"], "report.pdf");
    assert_eq!(meta["fileType"], "application/pdf");
    assert_eq!(meta["fileSize"], PDF_BYTES.len() as i64);
    assert_eq!(meta["ext"], "pdf");
    assert_eq!(meta["previewKind"], "document");
    assert_eq!(meta["views"], 0);
    assert_eq!(meta["downloads"], 0);

    let created_at: DateTime<Utc> =
        DateTime::parse_from_rfc3339(meta["createdAt"].as_str().unwrap())
            .unwrap()
            .into();
    let expires_at: DateTime<Utc> =
        DateTime::parse_from_rfc3339(meta["expiresAt"].as_str().unwrap())
            .unwrap()
            .into();
    assert_eq!(expires_at - created_at, Duration::hours(24));

    // 3. Metadata reads are idempotent; views only move via the view route
    let (_, meta_again) = get_json(&app, &format!("/api/file/{file_id}")).await;
    assert_eq!(meta_again["views"], 0);

    let response = post_json(&app, &format!("/api/file/{file_id}/view"), json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    let view = json_body(response).await;
    assert_eq!(view["success"], true);
    assert_eq!(view["views"], 1);

    let response = post_json(&app, &format!("/api/file/{file_id}/view"), json!({})).await;
    assert_eq!(json_body(response).await["views"], 2);

    // 4. Wrong password is rejected and leaves the download counter alone
    let response = post_json(
        &app,
        &format!("/api/download/{file_id}"),
        json!({"password": "wrong"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (_, meta) = get_json(&app, &format!("/api/file/{file_id}")).await;
    assert_eq!(meta["downloads"], 0);

    // 5. Missing password is a validation error, not an auth failure
    let response = post_json(&app, &format!("/api/download/{file_id}"), json!({})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // 6. Correct password returns the original bytes as an attachment
    let response = post_json(
        &app,
        &format!("/api/download/{file_id}"),
        json!({"password": "secret1"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let disposition = response
        .headers()
        .get("Content-Disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.starts_with("attachment"));
    assert!(disposition.contains("report.pdf"));
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], PDF_BYTES);

    let (_, meta) = get_json(&app, &format!("/api/file/{file_id}")).await;
    assert_eq!(meta["downloads"], 1);
}

#[tokio::test]
async fn test_upload_requires_file_and_password() {
    let (_state, app, _storage) = setup_app().await;

    // No password part at all
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(
                    "report.pdf",
                    "application/pdf",
                    PDF_BYTES,
                    None,
                )))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // No file part
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"password\"\r\n\r\nsecret1\r\n--{BOUNDARY}--\r\n"
        )
        .as_bytes(),
    );
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_failed_uploads_leave_no_state() {
    let (state, app, storage) = setup_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(
                    "Content-Type",
                    format!("multipart/form-data; boundary={BOUNDARY}"),
                )
                .body(Body::from(multipart_body(
                    "report.pdf",
                    "application/pdf",
                    PDF_BYTES,
                    None,
                )))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    assert!(storage.stored_keys().is_empty());
    assert_eq!(Files::find().all(&state.db).await.unwrap().len(), 0);
}

#[tokio::test]
async fn test_metadata_only_upload() {
    let (_state, app, _storage) = setup_app().await;

    let response = post_json(
        &app,
        "/api/upload/metadata",
        json!({
            "originalName": "slides.pptx",
            "fileType": "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "fileSize": 123456,
            "filePath": "https://cdn.example.com/v1/slides.pptx",
            "password": "secret1"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let uploaded = json_body(response).await;
    let file_id = uploaded["fileId"].as_str().unwrap();

    // The preview URL resolves straight to the external blob
    let (status, meta) = get_json(&app, &format!("/api/file/{file_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(meta["url"], "https://cdn.example.com/v1/slides.pptx");
    assert_eq!(meta["fileSize"], 123456);

    // Empty password is rejected
    let response = post_json(
        &app,
        "/api/upload/metadata",
        json!({
            "originalName": "slides.pptx",
            "fileType": "application/pdf",
            "fileSize": 1,
            "filePath": "https://cdn.example.com/x.pdf",
            "password": ""
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_id_is_not_found_everywhere() {
    let (_state, app, _storage) = setup_app().await;

    let (status, _) = get_json(&app, "/api/file/nope").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = post_json(&app, "/api/file/nope/view", json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = post_json(&app, "/api/download/nope", json!({"password": "x"})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_expired_record_is_hidden_from_reads_and_gone_for_download() {
    let (state, app, _storage) = setup_app().await;

    let uploaded = upload(&app, "report.pdf", "application/pdf", PDF_BYTES, "secret1").await;
    let file_id = uploaded["fileId"].as_str().unwrap().to_string();

    // Force the record past its expiry instant
    let record = Files::find_by_id(&file_id)
        .one(&state.db)
        .await
        .unwrap()
        .unwrap();
    let stored_name = record.stored_name.clone();
    let mut active: files::ActiveModel = record.into();
    active.expires_at = Set(Some(Utc::now() - Duration::seconds(1)));
    active.update(&state.db).await.unwrap();

    // Reads cannot tell an expired link from a missing one
    let (status, _) = get_json(&app, &format!("/api/file/{file_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let response = post_json(&app, &format!("/api/file/{file_id}/view"), json!({})).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/files/{stored_name}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // The download path acknowledges the link existed
    let response = post_json(
        &app,
        &format!("/api/download/{file_id}"),
        json!({"password": "secret1"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::GONE);
}

#[tokio::test]
async fn test_serve_file_supports_ranges() {
    let (_state, app, _storage) = setup_app().await;

    let uploaded = upload(&app, "notes.txt", "text/plain", b"0123456789", "secret1").await;
    let file_id = uploaded["fileId"].as_str().unwrap().to_string();

    let (_, meta) = get_json(&app, &format!("/api/file/{file_id}")).await;
    let url = meta["url"].as_str().unwrap();
    let stored_name = url.rsplit("/files/").next().unwrap().to_string();

    // Full read advertises range support
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/files/{stored_name}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["Accept-Ranges"], "bytes");
    assert_eq!(response.headers()["Content-Length"], "10");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"0123456789");

    // Bounded range
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/files/{stored_name}"))
                .header("Range", "bytes=2-5")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(response.headers()["Content-Range"], "bytes 2-5/10");
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&body[..], b"2345");

    // Range past the end
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/files/{stored_name}"))
                .header("Range", "bytes=99-")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
    assert_eq!(response.headers()["Content-Range"], "bytes */10");
}

#[tokio::test]
async fn test_content_type_sniffed_when_client_is_vague() {
    let (_state, app, _storage) = setup_app().await;

    // PNG magic bytes, but the client claims a generic type
    let png: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48,
        0x44, 0x52,
    ];
    let uploaded = upload(&app, "pixel.png", "application/octet-stream", png, "secret1").await;
    let file_id = uploaded["fileId"].as_str().unwrap();

    let (_, meta) = get_json(&app, &format!("/api/file/{file_id}")).await;
    assert_eq!(meta["fileType"], "image/png");
    assert_eq!(meta["previewKind"], "image");
}

#[tokio::test]
async fn test_concurrent_views_lose_no_updates() {
    let (state, app, _storage) = setup_app().await;

    let uploaded = upload(&app, "report.pdf", "application/pdf", PDF_BYTES, "secret1").await;
    let file_id = uploaded["fileId"].as_str().unwrap().to_string();

    let mut handles = Vec::new();
    for _ in 0..20 {
        let service = state.file_service.clone();
        let id = file_id.clone();
        handles.push(tokio::spawn(async move { service.record_view(&id).await }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let (_, meta) = get_json(&app, &format!("/api/file/{file_id}")).await;
    assert_eq!(meta["views"], 20);
}
