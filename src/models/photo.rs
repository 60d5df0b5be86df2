use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Gallery row. Also the record shape of the JSON mirror file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Photo {
    pub id: Uuid,
    /// Object key inside the storage provider.
    pub filename: String,
    pub original_name: String,
    pub url: String,
    pub provider: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub uploaded_by: Option<String>,
    pub uploader_group: String,
    pub captured_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    /// Access group keys allowed to see this photo.
    pub visible_to: Vec<String>,
    pub is_approved: bool,
    pub is_featured: bool,
}

#[derive(Debug, Deserialize)]
pub struct PhotoQuery {
    pub group: String,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PhotoPage {
    pub photos: Vec<Photo>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub has_more: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeletePhotoQuery {
    pub confirm: Option<bool>,
}

/// Which parts of a delete went through. Each step is attempted regardless of the others.
#[derive(Debug, Default, Serialize, PartialEq)]
pub struct DeleteSummary {
    pub id: Uuid,
    pub storage: bool,
    pub database: bool,
    pub json_mirror: bool,
}

impl DeleteSummary {
    pub fn any_succeeded(&self) -> bool {
        self.storage || self.database || self.json_mirror
    }
}

#[derive(Debug, Serialize, PartialEq)]
pub struct RejectedFile {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Default, Serialize)]
pub struct UploadOutcome {
    pub uploaded: Vec<Photo>,
    pub rejected: Vec<RejectedFile>,
    pub warnings: Vec<String>,
}
