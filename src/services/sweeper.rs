use crate::entities::{files, prelude::*};
use crate::services::file_service::is_external_url;
use crate::services::storage::StorageService;
use chrono::Utc;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, QuerySelect};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{Duration, sleep};

/// Background task that physically removes expired records and their blobs.
/// Runs on a fixed interval, independently of request handling; every
/// failure is per-record, logged and skipped.
pub struct ExpirySweeper {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    interval: Duration,
    shutdown: watch::Receiver<bool>,
}

impl ExpirySweeper {
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<dyn StorageService>,
        interval_secs: u64,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            db,
            storage,
            interval: Duration::from_secs(interval_secs),
            shutdown,
        }
    }

    pub async fn run(mut self) {
        tracing::info!("🧹 Expiry sweeper started (every {:?})", self.interval);

        loop {
            tokio::select! {
                _ = self.shutdown.changed() => {
                    tracing::info!("🛑 Expiry sweeper shutting down");
                    break;
                }
                _ = sleep(self.interval) => {
                    let swept = sweep_expired(&self.db, self.storage.as_ref()).await;
                    if swept > 0 {
                        tracing::info!("🧹 Swept {} expired files", swept);
                    }
                }
            }
        }
    }
}

/// One sweep pass: delete the blob then the row for every record whose
/// expiry instant has passed (inclusive). Returns the number of records
/// removed. Blob failures are logged and do not block the row delete; row
/// failures are logged and do not abort the batch.
pub async fn sweep_expired(db: &DatabaseConnection, storage: &dyn StorageService) -> usize {
    let expired = match Files::find()
        .filter(files::Column::ExpiresAt.lte(Utc::now()))
        .limit(1000)
        .all(db)
        .await
    {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Expiry scan failed: {}", e);
            return 0;
        }
    };

    let mut swept = 0;
    for record in expired {
        tracing::info!("Expiring file: {} ({})", record.id, record.original_name);

        if !is_external_url(&record.stored_name)
            && let Err(e) = storage.delete_file(&record.stored_name).await
        {
            tracing::warn!(
                "Failed to delete expired blob {}: {}",
                record.stored_name,
                e
            );
        }

        let id = record.id.clone();
        match record.delete(db).await {
            Ok(_) => swept += 1,
            Err(e) => tracing::error!("Failed to delete expired record {}: {}", id, e),
        }
    }

    swept
}
