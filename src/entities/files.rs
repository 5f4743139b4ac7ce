use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The sole persistent record: one row per uploaded file.
///
/// `stored_name` is either a blob-store key or, for metadata-only uploads,
/// an absolute URL to an externally hosted blob. `password_hash` is an
/// argon2 PHC string and must never be serialized into any response.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "files")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub original_name: String,
    pub stored_name: String,
    pub file_type: String,
    pub file_size: i64,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTimeUtc,
    pub expires_at: Option<DateTimeUtc>,
    pub views: i64,
    pub downloads: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Inclusive boundary: a record whose `expires_at` equals "now" is
    /// already expired.
    pub fn is_expired_at(&self, now: DateTimeUtc) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn record(expires_at: Option<DateTimeUtc>) -> Model {
        Model {
            id: "f-1".to_string(),
            original_name: "report.pdf".to_string(),
            stored_name: "abc-report.pdf".to_string(),
            file_type: "application/pdf".to_string(),
            file_size: 1024,
            password_hash: "$argon2id$...".to_string(),
            created_at: Utc::now(),
            expires_at,
            views: 0,
            downloads: 0,
        }
    }

    #[test]
    fn expiry_boundary_is_inclusive() {
        let now = Utc::now();
        assert!(record(Some(now)).is_expired_at(now));
        assert!(record(Some(now - Duration::seconds(1))).is_expired_at(now));
        assert!(!record(Some(now + Duration::seconds(1))).is_expired_at(now));
        assert!(!record(None).is_expired_at(now));
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let json = serde_json::to_value(record(None)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["originalName"], "report.pdf");
    }
}
