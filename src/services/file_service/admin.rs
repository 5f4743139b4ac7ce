use crate::api::error::AppError;
use crate::entities::{files, prelude::*};
use sea_orm::{
    ColumnTrait, EntityTrait, FromQueryResult, ModelTrait, PaginatorTrait, QueryOrder, QuerySelect,
};

use super::{FileService, is_external_url, types::*};

#[derive(FromQueryResult)]
struct SizeSum {
    total: Option<i64>,
}

impl FileService {
    /// Newest-first page of records plus pagination metadata. Filtering is
    /// a client-side concern over the returned page.
    pub async fn list_files(
        &self,
        page: u64,
        page_size: u64,
    ) -> Result<(Vec<files::Model>, Pagination), AppError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);

        let paginator = Files::find()
            .order_by_desc(files::Column::CreatedAt)
            .paginate(&self.db, page_size);

        let totals = paginator.num_items_and_pages().await?;
        let records = paginator.fetch_page(page - 1).await?;

        Ok((
            records,
            Pagination {
                total_files: totals.number_of_items,
                current_page: page,
                total_pages: totals.number_of_pages,
                page_size,
            },
        ))
    }

    /// Delete one record and its blob. A blob that is already absent is a
    /// warning, not a failure; a missing record is NotFound.
    pub async fn delete_file(&self, id: &str) -> Result<(), AppError> {
        let record = Files::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        self.delete_blob_best_effort(&record).await;
        record.delete(&self.db).await?;

        tracing::info!("🗑️  Deleted file record {}", id);
        Ok(())
    }

    /// Best-effort batch delete: a failing blob or missing id never aborts
    /// the rest. Returns the number of records actually removed.
    pub async fn bulk_delete(&self, ids: Vec<String>) -> Result<usize, AppError> {
        let mut deleted = 0;

        for id in ids {
            let record = match Files::find_by_id(&id).one(&self.db).await {
                Ok(Some(record)) => record,
                Ok(None) => {
                    tracing::warn!("Bulk delete: record {} not found, skipping", id);
                    continue;
                }
                Err(e) => {
                    tracing::error!("Bulk delete: failed to load {}: {}", id, e);
                    continue;
                }
            };

            self.delete_blob_best_effort(&record).await;

            match record.delete(&self.db).await {
                Ok(_) => deleted += 1,
                Err(e) => tracing::error!("Bulk delete: failed to delete record {}: {}", id, e),
            }
        }

        tracing::info!("🗑️  Bulk deleted {} records", deleted);
        Ok(deleted)
    }

    /// Aggregate totals across all records (not just the current page).
    pub async fn stats(&self) -> Result<StorageStats, AppError> {
        let total_files = Files::find().count(&self.db).await?;

        let sum = Files::find()
            .select_only()
            .column_as(files::Column::FileSize.sum(), "total")
            .into_model::<SizeSum>()
            .one(&self.db)
            .await?
            .and_then(|row| row.total)
            .unwrap_or(0);

        Ok(StorageStats {
            total_files,
            total_size_in_mb: sum as f64 / (1024.0 * 1024.0),
        })
    }

    pub(crate) async fn delete_blob_best_effort(&self, record: &files::Model) {
        // Metadata-only records point at an external store we do not own
        if is_external_url(&record.stored_name) {
            return;
        }
        if let Err(e) = self.storage.delete_file(&record.stored_name).await {
            tracing::warn!(
                "Blob {} for record {} could not be deleted: {}",
                record.stored_name,
                record.id,
                e
            );
        }
    }
}
