#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use filevault_backend::config::AppConfig;
use filevault_backend::infrastructure::database;
use filevault_backend::services::file_service::FileService;
use filevault_backend::services::storage::{
    ObjectMetadata, ObjectStream, StorageService, UploadResult,
};
use filevault_backend::{AppState, create_app};
use http_body_util::BodyExt;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncRead, AsyncReadExt};
use tower::ServiceExt;

/// In-memory blob store with per-key delete failure injection.
pub struct MockStorageService {
    files: Mutex<HashMap<String, Vec<u8>>>,
    failing_deletes: Mutex<HashSet<String>>,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            failing_deletes: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail_deletes_for(&self, key: &str) {
        self.failing_deletes.lock().unwrap().insert(key.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.files.lock().unwrap().contains_key(key)
    }

    pub fn stored_keys(&self) -> Vec<String> {
        self.files.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn upload_stream_with_hash<'a>(
        &self,
        key: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> anyhow::Result<UploadResult> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data).await?;

        let mut hasher = Sha256::new();
        hasher.update(&data);
        let hash = hex::encode(hasher.finalize());
        let size = data.len() as i64;

        self.files.lock().unwrap().insert(key.to_string(), data);

        Ok(UploadResult {
            hash,
            size,
            key: key.to_string(),
        })
    }

    async fn delete_file(&self, key: &str) -> anyhow::Result<()> {
        if self.failing_deletes.lock().unwrap().contains(key) {
            anyhow::bail!("injected delete failure for {}", key);
        }
        self.files
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| anyhow::anyhow!("key not found: {}", key))
    }

    async fn file_exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.files.lock().unwrap().contains_key(key))
    }

    async fn get_object_stream(&self, key: &str) -> anyhow::Result<ObjectStream> {
        let data = self
            .files
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("key not found: {}", key))?;
        Ok(ObjectStream {
            content_length: data.len() as i64,
            reader: Box::new(std::io::Cursor::new(data)),
        })
    }

    async fn get_object_range(
        &self,
        key: &str,
        start: u64,
        end: u64,
    ) -> anyhow::Result<ObjectStream> {
        let data = self
            .files
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("key not found: {}", key))?;
        let end = (end as usize).min(data.len().saturating_sub(1));
        let slice = data[start as usize..=end].to_vec();
        Ok(ObjectStream {
            content_length: slice.len() as i64,
            reader: Box::new(std::io::Cursor::new(slice)),
        })
    }

    async fn get_object_metadata(&self, key: &str) -> anyhow::Result<ObjectMetadata> {
        let files = self.files.lock().unwrap();
        let data = files
            .get(key)
            .ok_or_else(|| anyhow::anyhow!("key not found: {}", key))?;
        Ok(ObjectMetadata {
            size: data.len() as i64,
        })
    }
}

pub async fn setup_test_db() -> DatabaseConnection {
    // A single pooled connection so every query sees the same in-memory DB
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opt).await.unwrap();
    database::run_migrations(&db).await.unwrap();
    db
}

pub async fn setup_app() -> (AppState, Router, Arc<MockStorageService>) {
    let db = setup_test_db().await;
    let storage = Arc::new(MockStorageService::new());
    let config = AppConfig::development();

    let file_service = Arc::new(FileService::new(
        db.clone(),
        storage.clone(),
        config.clone(),
    ));

    let state = AppState {
        db,
        storage: storage.clone(),
        file_service,
        config,
    };
    let app = create_app(state.clone());
    (state, app, storage)
}

pub const BOUNDARY: &str = "filevault-test-boundary";

/// Build a multipart/form-data body with a file part and a password part.
pub fn multipart_body(
    filename: &str,
    content_type: &str,
    data: &[u8],
    password: Option<&str>,
) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(b"\r\n");
    if let Some(password) = password {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"password\"\r\n\r\n{password}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub async fn upload(
    app: &Router,
    filename: &str,
    content_type: &str,
    data: &[u8],
    password: &str,
) -> Value {
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
                    filename,
                    content_type,
                    data,
                    Some(password),
                )))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 200, "upload should succeed");
    json_body(response).await
}

pub async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn get_json(app: &Router, uri: &str) -> (axum::http::StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    (status, json_body(response).await)
}

pub async fn post_json(app: &Router, uri: &str, payload: Value) -> axum::response::Response {
    app.clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("Content-Type", "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}
