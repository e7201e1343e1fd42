use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::dto::job_dto::JobPostingResponse;
use crate::models::job_posting::JobPostingWithCompany;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveJobRequest {
    pub job_posting_id: Uuid,
}

#[derive(Debug, Clone, FromRow)]
pub struct SavedJobRow {
    pub saved_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub has_applied: bool,
    #[sqlx(flatten)]
    pub posting: JobPostingWithCompany,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJobResponse {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub has_applied: bool,
    pub job: JobPostingResponse,
}

impl From<SavedJobRow> for SavedJobResponse {
    fn from(row: SavedJobRow) -> Self {
        Self {
            id: row.saved_id,
            saved_at: row.saved_at,
            has_applied: row.has_applied,
            job: row.posting.into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedJobsQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub job_type: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IsSavedResponse {
    pub is_saved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct CountResponse {
    pub count: i64,
}
