use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SavedJob {
    pub id: Uuid,
    pub candidate_id: Uuid,
    pub job_posting_id: Uuid,
    pub saved_at: DateTime<Utc>,
}
