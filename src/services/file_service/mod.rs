use crate::config::AppConfig;
use crate::services::storage::StorageService;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod access;
pub mod admin;
pub mod create;
pub mod types;

/// Orchestrates the file lifecycle: create, read, view/download accounting,
/// deletion. The expiry sweep lives in `services::sweeper` and talks to the
/// same stores directly.
pub struct FileService {
    db: DatabaseConnection,
    storage: Arc<dyn StorageService>,
    config: AppConfig,
    http: reqwest::Client,
}

impl FileService {
    pub fn new(
        db: DatabaseConnection,
        storage: Arc<dyn StorageService>,
        config: AppConfig,
    ) -> Self {
        Self {
            db,
            storage,
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn storage(&self) -> &dyn StorageService {
        self.storage.as_ref()
    }

    pub fn http_client(&self) -> &reqwest::Client {
        &self.http
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}

/// Records created through the metadata-only upload path carry an absolute
/// URL instead of a blob key.
pub fn is_external_url(stored_name: &str) -> bool {
    stored_name.starts_with("http://") || stored_name.starts_with("https://")
}
