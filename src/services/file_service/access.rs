use crate::api::error::AppError;
use crate::entities::{files, prelude::*};
use crate::services::credentials;
use chrono::Utc;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter};

use super::{FileService, is_external_url};

/// Characters that need escaping in a URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'%')
    .add(b'/')
    .add(b'\\');

impl FileService {
    /// Load a record by id; unknown and expired ids are both NotFound so
    /// unauthenticated reads cannot probe for expired links.
    pub async fn get_metadata(&self, id: &str) -> Result<files::Model, AppError> {
        let record = Files::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if record.is_expired_at(Utc::now()) {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        Ok(record)
    }

    /// Count one preview view. The increment is a single SQL
    /// `views = views + 1` restricted to live records, so concurrent views
    /// never lose updates.
    pub async fn record_view(&self, id: &str) -> Result<i64, AppError> {
        let res = Files::update_many()
            .col_expr(files::Column::Views, Expr::col(files::Column::Views).add(1))
            .filter(files::Column::Id.eq(id))
            .filter(live_filter())
            .exec(&self.db)
            .await?;

        if res.rows_affected == 0 {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        let record = Files::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        Ok(record.views)
    }

    /// The password-gated download path: absent → NotFound, expired → Gone
    /// (this path may confirm that a link existed), wrong password →
    /// Unauthorized with the download counter untouched. On success the
    /// counter is incremented before the bytes are handed out.
    pub async fn verify_download(
        &self,
        id: &str,
        password: &str,
    ) -> Result<files::Model, AppError> {
        let record = Files::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if record.is_expired_at(Utc::now()) {
            return Err(AppError::Gone("Link has expired".to_string()));
        }

        if !credentials::verify_password(password, &record.password_hash)? {
            return Err(AppError::Unauthorized("Incorrect password".to_string()));
        }

        let _ = Files::update_many()
            .col_expr(
                files::Column::Downloads,
                Expr::col(files::Column::Downloads).add(1),
            )
            .filter(files::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        tracing::info!("⬇️  Download authorized for {}", record.id);
        Ok(record)
    }

    /// Resolve a blob-serving record for `GET /files/:stored_name`.
    /// Expired records are indistinguishable from unknown ones here too.
    pub async fn find_live_by_stored_name(
        &self,
        stored_name: &str,
    ) -> Result<files::Model, AppError> {
        let record = Files::find()
            .filter(files::Column::StoredName.eq(stored_name))
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if record.is_expired_at(Utc::now()) {
            return Err(AppError::NotFound("File not found".to_string()));
        }

        Ok(record)
    }

    /// Public URL the preview pane loads bytes from: the external URL for
    /// metadata-only uploads, the backend's own serving route otherwise.
    pub fn resolve_url(&self, record: &files::Model) -> String {
        if is_external_url(&record.stored_name) {
            record.stored_name.clone()
        } else {
            format!(
                "{}/files/{}",
                self.config.backend_url,
                utf8_percent_encode(&record.stored_name, PATH_SEGMENT)
            )
        }
    }
}

/// Filter matching records that have not yet reached their expiry instant.
pub(crate) fn live_filter() -> Condition {
    Condition::any()
        .add(files::Column::ExpiresAt.is_null())
        .add(files::Column::ExpiresAt.gt(Utc::now()))
}
