use crate::api::error::AppError;
use crate::entities::files;
use crate::services::credentials;
use crate::utils::preview::{file_extension, mime_from_extension};
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, Set};
use tokio::io::{AsyncRead, AsyncReadExt};
use uuid::Uuid;

use super::FileService;

impl FileService {
    /// Create a record from a streamed upload: hash the password, persist
    /// the bytes, then write the metadata row. The blob is stored before
    /// the row; if the row insert fails the blob is deleted best-effort,
    /// so a crash between the two steps can leave at most one orphan blob.
    pub async fn create_upload<'a>(
        &self,
        original_name: &str,
        content_type: Option<String>,
        password: &str,
        ttl_hours: Option<i64>,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<files::Model, AppError> {
        if password.is_empty() {
            return Err(AppError::BadRequest(
                "File and password are required".to_string(),
            ));
        }

        let password_hash = credentials::hash_password(password)?;

        let stored_name = format!("{}-{}", Uuid::new_v4(), original_name);
        let uploaded = self
            .storage
            .upload_stream_with_hash(&stored_name, reader)
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        let file_type = self
            .resolve_content_type(content_type, original_name, &stored_name, uploaded.size)
            .await;

        let now = Utc::now();
        let ttl = self.config.clamp_ttl_hours(ttl_hours);
        let record = files::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            original_name: Set(original_name.to_string()),
            stored_name: Set(stored_name.clone()),
            file_type: Set(file_type),
            file_size: Set(uploaded.size),
            password_hash: Set(password_hash),
            created_at: Set(now),
            expires_at: Set(Some(now + Duration::hours(ttl))),
            views: Set(0),
            downloads: Set(0),
        };

        match record.insert(&self.db).await {
            Ok(model) => {
                tracing::info!(
                    "📦 Stored {} ({} bytes, sha256={}) as {}",
                    model.original_name,
                    model.file_size,
                    uploaded.hash,
                    model.id
                );
                Ok(model)
            }
            Err(e) => {
                // Compensating delete; failure here leaves an orphan blob
                if let Err(del_err) = self.storage.delete_file(&stored_name).await {
                    tracing::error!(
                        "Failed to clean up blob {} after metadata insert error: {}",
                        stored_name,
                        del_err
                    );
                }
                Err(AppError::Database(e))
            }
        }
    }

    /// Create a record for a blob the client uploaded directly to an
    /// external store; `file_path` is the public URL of those bytes.
    pub async fn create_from_metadata(
        &self,
        original_name: &str,
        file_type: &str,
        file_size: i64,
        file_path: &str,
        password: &str,
    ) -> Result<files::Model, AppError> {
        let password_hash = credentials::hash_password(password)?;

        let now = Utc::now();
        let ttl = self.config.clamp_ttl_hours(None);
        let record = files::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            original_name: Set(original_name.to_string()),
            stored_name: Set(file_path.to_string()),
            file_type: Set(file_type.to_string()),
            file_size: Set(file_size),
            password_hash: Set(password_hash),
            created_at: Set(now),
            expires_at: Set(Some(now + Duration::hours(ttl))),
            views: Set(0),
            downloads: Set(0),
        };

        let model = record.insert(&self.db).await?;
        tracing::info!(
            "📦 Registered external upload {} -> {}",
            model.original_name,
            model.id
        );
        Ok(model)
    }

    /// Trust the client-supplied type unless it is missing or generic, then
    /// sniff the first stored bytes, then fall back to the extension table.
    async fn resolve_content_type(
        &self,
        content_type: Option<String>,
        original_name: &str,
        stored_name: &str,
        size: i64,
    ) -> String {
        if let Some(ct) = content_type
            && !ct.is_empty()
            && ct != "application/octet-stream"
        {
            return ct;
        }

        if size > 0 {
            let head_end = (size as u64 - 1).min(16383);
            if let Ok(mut stream) = self.storage.get_object_range(stored_name, 0, head_end).await {
                let mut head = Vec::new();
                if stream.reader.read_to_end(&mut head).await.is_ok()
                    && let Some(kind) = infer::get(&head)
                {
                    return kind.mime_type().to_string();
                }
            }
        }

        mime_from_extension(&file_extension(original_name))
            .unwrap_or("application/octet-stream")
            .to_string()
    }
}
