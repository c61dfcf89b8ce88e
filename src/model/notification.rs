use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::repository::repo_error::RepositoryError;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    /// to the requester, on submission
    LeaveCreated,
    /// to the approvers, on submission
    LeaveSubmitted,
    LeaveApproved,
    LeaveRejected,
    LeaveWithdrawn,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct Notification {
    pub id: u64,
    pub user_id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
    pub is_read: bool,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: u64,
    pub user_id: u64,
    pub kind: String,
    pub title: String,
    pub message: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<NotificationRow> for Notification {
    type Error = RepositoryError;

    fn try_from(row: NotificationRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse()
            .map_err(|_| RepositoryError::Corrupt(format!("notification kind '{}'", row.kind)))?;
        Ok(Notification {
            id: row.id,
            user_id: row.user_id,
            kind,
            title: row.title,
            message: row.message,
            is_read: row.is_read,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub user_id: u64,
    pub kind: NotificationKind,
    pub title: String,
    pub message: Option<String>,
}
