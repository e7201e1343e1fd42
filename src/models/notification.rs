use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

text_enum!(NotificationType {
    Info,
    Success,
    Warning,
    Error,
});

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub is_read: bool,
    pub related_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

pub const NOTIFICATION_COLUMNS: &str =
    "id, user_id, title, message, notification_type, is_read, related_link, created_at, read_at";

/// A notification ready to be stored for one or more recipients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub notification_type: NotificationType,
    pub related_link: Option<String>,
}
