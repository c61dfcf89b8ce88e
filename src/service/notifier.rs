use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::model::notification::{NewNotification, Notification};
use crate::repository::notification_repo::NotificationRepository;

pub const DEFAULT_LIST_LIMIT: u32 = 20;
pub const MAX_LIST_LIMIT: u32 = 200;

/// Outbound email. Delivery failures never undo the action that triggered them.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()>;
}

/// Writes the email to the log instead of sending it.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> anyhow::Result<()> {
        info!(to, subject, body, "Email queued (log transport)");
        Ok(())
    }
}

pub struct Notifier {
    repo: Arc<dyn NotificationRepository>,
    mailer: Arc<dyn Mailer>,
}

impl Notifier {
    pub fn new(repo: Arc<dyn NotificationRepository>, mailer: Arc<dyn Mailer>) -> Self {
        Self { repo, mailer }
    }

    pub async fn notify(&self, notification: &NewNotification) -> Result<u64, ServiceError> {
        if notification.title.trim().is_empty() {
            return Err(ServiceError::validation("notification title must not be empty"));
        }
        let id = self.repo.create_notification(notification).await?;
        info!(
            notification_id = id,
            user_id = notification.user_id,
            kind = %notification.kind,
            "Notification created"
        );
        Ok(id)
    }

    /// Like [`Notifier::notify`], logging instead of returning the failure.
    pub async fn notify_quietly(&self, notification: NewNotification) {
        if let Err(e) = self.notify(&notification).await {
            warn!(
                error = %e,
                user_id = notification.user_id,
                kind = %notification.kind,
                "Failed to create notification"
            );
        }
    }

    pub async fn email_quietly(&self, to: Option<&str>, subject: &str, body: &str) {
        let Some(to) = to.filter(|t| !t.trim().is_empty()) else {
            return;
        };
        if let Err(e) = self.mailer.send(to, subject, body).await {
            warn!(error = %e, to, subject, "Failed to send email");
        }
    }

    /// Newest first; `limit` defaults to 20 and is capped at 200.
    pub async fn list(&self, user_id: u64, limit: Option<u32>) -> Result<Vec<Notification>, ServiceError> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        Ok(self.repo.get_user_notifications(user_id, limit).await?)
    }

    pub async fn unread_count(&self, user_id: u64) -> Result<i64, ServiceError> {
        Ok(self.repo.unread_count(user_id).await?)
    }

    pub async fn mark_read(&self, id: u64, user_id: u64) -> Result<(), ServiceError> {
        if !self.repo.mark_as_read(id, user_id).await? {
            return Err(ServiceError::NotFound("notification"));
        }
        Ok(())
    }

    pub async fn mark_all_read(&self, user_id: u64) -> Result<u64, ServiceError> {
        Ok(self.repo.mark_all_as_read(user_id).await?)
    }

    pub async fn delete(&self, id: u64, user_id: u64) -> Result<(), ServiceError> {
        if !self.repo.delete_notification(id, user_id).await? {
            return Err(ServiceError::NotFound("notification"));
        }
        Ok(())
    }

    pub async fn delete_all(&self, user_id: u64) -> Result<u64, ServiceError> {
        Ok(self.repo.delete_all(user_id).await?)
    }
}
