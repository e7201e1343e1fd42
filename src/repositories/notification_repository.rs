use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::dto::envelope::{non_blank, sort_key, Paging, SortOrder};
use crate::dto::notification_dto::{NotificationQuery, NotificationResponse, NotificationSummary};
use crate::error::{Error, Result};
use crate::models::notification::{NewNotification, Notification, NotificationType, NOTIFICATION_COLUMNS};

fn not_found() -> Error {
    Error::not_found("NOTIFICATION_NOT_FOUND", "Notification not found")
}

/// Summary with a zero entry for every notification type.
pub fn summarize(rows: &[(String, bool, i64)]) -> NotificationSummary {
    let mut type_counts: BTreeMap<String, i64> = NotificationType::ALL
        .iter()
        .map(|t| (t.as_str().to_string(), 0))
        .collect();
    let (mut read, mut unread) = (0, 0);
    for (kind, is_read, count) in rows {
        *type_counts.entry(kind.clone()).or_insert(0) += count;
        if *is_read {
            read += count;
        } else {
            unread += count;
        }
    }
    NotificationSummary {
        total: read + unread,
        unread,
        read,
        type_counts,
    }
}

#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: Uuid, notification: &NewNotification) -> Result<Notification> {
        let sql = format!(
            "INSERT INTO notifications (user_id, title, message, notification_type, related_link)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            NOTIFICATION_COLUMNS
        );
        let created = sqlx::query_as::<_, Notification>(&sql)
            .bind(user_id)
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.notification_type.as_str())
            .bind(&notification.related_link)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    /// One statement for all recipients.
    pub async fn create_many(&self, user_ids: &[Uuid], notification: &NewNotification) -> Result<u64> {
        if user_ids.is_empty() {
            return Ok(0);
        }
        let res = sqlx::query(
            "INSERT INTO notifications (user_id, title, message, notification_type, related_link)
             SELECT recipient, $2, $3, $4, $5 FROM UNNEST($1::uuid[]) AS recipient",
        )
        .bind(user_ids)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.notification_type.as_str())
        .bind(&notification.related_link)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    fn push_filters(
        qb: &mut QueryBuilder<'_, Postgres>,
        user_id: Uuid,
        query: &NotificationQuery,
    ) -> Result<()> {
        qb.push(" WHERE user_id = ").push_bind(user_id);
        if let Some(is_read) = query.is_read {
            qb.push(" AND is_read = ").push_bind(is_read);
        }
        if let Some(kind) = non_blank(&query.notification_type) {
            let kind: NotificationType = kind.parse()?;
            qb.push(" AND notification_type = ").push_bind(kind.as_str());
        }
        Ok(())
    }

    pub async fn list(
        &self,
        user_id: Uuid,
        query: &NotificationQuery,
    ) -> Result<(Vec<NotificationResponse>, i64, Paging)> {
        let paging = Paging::new(query.page, query.page_size, 20);
        let order = SortOrder::parse(query.sort_order.as_deref());
        let sort_column = match sort_key(query.sort_by.as_deref()).as_str() {
            "type" => "notification_type",
            "isread" => "is_read",
            _ => "created_at",
        };

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM notifications");
        Self::push_filters(&mut count, user_id, query)?;
        let total: i64 = count.build_query_scalar().fetch_one(&self.pool).await?;

        let mut items =
            QueryBuilder::<Postgres>::new(format!("SELECT {} FROM notifications", NOTIFICATION_COLUMNS));
        Self::push_filters(&mut items, user_id, query)?;
        items
            .push(format!(
                " ORDER BY {} {}, created_at DESC, id",
                sort_column,
                order.as_sql()
            ))
            .push(" LIMIT ")
            .push_bind(paging.page_size)
            .push(" OFFSET ")
            .push_bind(paging.offset());
        let rows: Vec<Notification> = items.build_query_as().fetch_all(&self.pool).await?;

        Ok((rows.into_iter().map(Into::into).collect(), total, paging))
    }

    pub async fn get(&self, user_id: Uuid, id: Uuid) -> Result<NotificationResponse> {
        let sql = format!(
            "SELECT {} FROM notifications WHERE id = $1 AND user_id = $2",
            NOTIFICATION_COLUMNS
        );
        let notification = sqlx::query_as::<_, Notification>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(not_found)?;
        Ok(notification.into())
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn summary(&self, user_id: Uuid) -> Result<NotificationSummary> {
        let rows: Vec<(String, bool, i64)> = sqlx::query_as(
            "SELECT notification_type, is_read, COUNT(*)
             FROM notifications WHERE user_id = $1
             GROUP BY notification_type, is_read",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(summarize(&rows))
    }

    pub async fn mark_read(&self, user_id: Uuid, id: Uuid) -> Result<u64> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM notifications WHERE id = $1 AND user_id = $2)",
        )
        .bind(id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        if !exists {
            return Err(not_found());
        }
        let res = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW()
             WHERE id = $1 AND user_id = $2 AND NOT is_read",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<u64> {
        let res = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW() WHERE user_id = $1 AND NOT is_read",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    /// Ids belonging to other users are ignored.
    pub async fn mark_many_read(&self, user_id: Uuid, ids: &[Uuid]) -> Result<u64> {
        let res = sqlx::query(
            "UPDATE notifications SET is_read = TRUE, read_at = NOW()
             WHERE user_id = $1 AND id = ANY($2) AND NOT is_read",
        )
        .bind(user_id)
        .bind(ids)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected())
    }

    pub async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM notifications WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    pub async fn delete_read(&self, user_id: Uuid) -> Result<u64> {
        let res = sqlx::query("DELETE FROM notifications WHERE user_id = $1 AND is_read")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }

    pub async fn delete_all(&self, user_id: Uuid) -> Result<u64> {
        let res = sqlx::query("DELETE FROM notifications WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_splits_read_and_unread() {
        let summary = summarize(&[
            ("Info".into(), false, 3),
            ("Info".into(), true, 2),
            ("Warning".into(), true, 1),
        ]);
        assert_eq!(summary.total, 6);
        assert_eq!(summary.unread, 3);
        assert_eq!(summary.read, 3);
        assert_eq!(summary.type_counts["Info"], 5);
        assert_eq!(summary.type_counts["Warning"], 1);
        assert_eq!(summary.type_counts["Error"], 0);
    }
}
