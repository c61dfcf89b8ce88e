use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::model::notification::{NewNotification, Notification, NotificationRow};
use crate::repository::repo_error::RepositoryError;

#[async_trait]
pub trait NotificationRepository: Send + Sync {
    async fn create_notification(&self, notification: &NewNotification) -> Result<u64, RepositoryError>;
    async fn get_user_notifications(
        &self,
        user_id: u64,
        limit: u32,
    ) -> Result<Vec<Notification>, RepositoryError>;
    async fn unread_count(&self, user_id: u64) -> Result<i64, RepositoryError>;
    /// False when the notification is missing, foreign or already read.
    async fn mark_as_read(&self, notification_id: u64, user_id: u64) -> Result<bool, RepositoryError>;
    async fn mark_all_as_read(&self, user_id: u64) -> Result<u64, RepositoryError>;
    async fn delete_notification(&self, notification_id: u64, user_id: u64) -> Result<bool, RepositoryError>;
    async fn delete_all(&self, user_id: u64) -> Result<u64, RepositoryError>;
}

pub struct NotificationRepositoryImpl {
    pool: MySqlPool,
}

impl NotificationRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationRepository for NotificationRepositoryImpl {
    async fn create_notification(&self, notification: &NewNotification) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, kind, title, message, is_read)
            VALUES (?, ?, ?, ?, FALSE)
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.kind.as_ref())
        .bind(&notification.title)
        .bind(&notification.message)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn get_user_notifications(
        &self,
        user_id: u64,
        limit: u32,
    ) -> Result<Vec<Notification>, RepositoryError> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT id, user_id, kind, title, message, is_read, created_at
            FROM notifications
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Notification::try_from).collect()
    }

    async fn unread_count(&self, user_id: u64) -> Result<i64, RepositoryError> {
        Ok(sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = FALSE",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn mark_as_read(&self, notification_id: u64, user_id: u64) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE notifications
            SET is_read = TRUE
            WHERE id = ?
            AND user_id = ?
            AND is_read = FALSE
            "#,
        )
        .bind(notification_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_as_read(&self, user_id: u64) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = TRUE WHERE user_id = ? AND is_read = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_notification(&self, notification_id: u64, user_id: u64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = ? AND user_id = ?")
            .bind(notification_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self, user_id: u64) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM notifications WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
