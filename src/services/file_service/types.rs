use serde::Serialize;
use utoipa::ToSchema;

/// Pagination block returned alongside admin listings.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_files: u64,
    pub current_page: u64,
    pub total_pages: u64,
    pub page_size: u64,
}

/// Aggregate totals over every stored record.
#[derive(Debug, Serialize, ToSchema)]
pub struct StorageStats {
    #[serde(rename = "totalFiles")]
    pub total_files: u64,
    #[serde(rename = "totalSizeInMB")]
    pub total_size_in_mb: f64,
}
