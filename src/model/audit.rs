use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

pub const MAX_DETAIL_LEN: usize = 1000;

#[derive(Debug, Clone, Serialize, PartialEq, sqlx::FromRow, ToSchema)]
pub struct AuditEntry {
    pub id: u64,
    pub user_id: Option<u64>,
    #[schema(example = "leave_approved")]
    pub action: String,
    #[schema(example = "id=12 user_id=7")]
    pub detail: Option<String>,
    pub ip: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAuditEntry {
    pub user_id: Option<u64>,
    pub action: String,
    pub detail: Option<String>,
    pub ip: Option<String>,
}

impl NewAuditEntry {
    pub fn new(user_id: Option<u64>, action: &str, detail: Option<String>, ip: Option<String>) -> Self {
        NewAuditEntry {
            user_id,
            action: action.to_string(),
            detail: detail.map(|d| truncate(&d, MAX_DETAIL_LEN)),
            ip,
        }
    }
}

/// Cuts on a char boundary so multi-byte text never splits.
fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}
