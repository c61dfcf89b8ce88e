use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString, IntoStaticStr};
use thiserror::Error;
use utoipa::ToSchema;

use crate::repository::repo_error::RepositoryError;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveType {
    Vacation,
    Permit,
    Sickness,
}

impl LeaveType {
    /// Sickness leave must carry the doctor's protocol code.
    pub fn requires_medical_code(self) -> bool {
        matches!(self, LeaveType::Sickness)
    }
}

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    IntoStaticStr,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LeaveStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum LeaveAction {
    Edit,
    Attach,
    Approve,
    Reject,
    Withdraw,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("cannot {action} a request that is {from}")]
pub struct InvalidTransition {
    pub from: LeaveStatus,
    pub action: LeaveAction,
}

/// The only place leave status changes are decided.
///
/// Every action requires a pending request. Withdraw shares the rejected
/// terminal state with a manager rejection.
pub fn transition(from: LeaveStatus, action: LeaveAction) -> Result<LeaveStatus, InvalidTransition> {
    match (from, action) {
        (LeaveStatus::Pending, LeaveAction::Edit | LeaveAction::Attach) => Ok(LeaveStatus::Pending),
        (LeaveStatus::Pending, LeaveAction::Approve) => Ok(LeaveStatus::Approved),
        (LeaveStatus::Pending, LeaveAction::Reject | LeaveAction::Withdraw) => {
            Ok(LeaveStatus::Rejected)
        }
        (from, action) => Err(InvalidTransition { from, action }),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[schema(example = json!({
    "id": 1,
    "user_id": 1000,
    "start_date": "2024-01-01",
    "end_date": "2024-01-05",
    "total_days": 4,
    "leave_type": "vacation",
    "status": "pending",
    "note": "family trip",
    "admin_comment": null,
    "medical_code": null,
    "attachment_ref": null,
    "created_at": "2024-01-01T00:00:00Z",
    "updated_at": "2024-01-01T00:00:00Z"
}))]
pub struct LeaveRequest {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    /// working days, computed server side
    pub total_days: u32,
    pub leave_type: LeaveType,
    pub status: LeaveStatus,
    pub note: Option<String>,
    pub admin_comment: Option<String>,
    pub medical_code: Option<String>,
    pub attachment_ref: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl LeaveRequest {
    /// Inclusive range intersection.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }

    /// Rejected (and withdrawn) requests free their period again.
    pub fn holds_period(&self) -> bool {
        self.status != LeaveStatus::Rejected
    }
}

/// Raw `leave_requests` row; enum columns are stored as text.
#[derive(Debug, sqlx::FromRow)]
pub struct LeaveRow {
    pub id: u64,
    pub user_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: u32,
    pub leave_type: String,
    pub status: String,
    pub note: Option<String>,
    pub admin_comment: Option<String>,
    pub medical_code: Option<String>,
    pub attachment_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = RepositoryError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let leave_type = row
            .leave_type
            .parse()
            .map_err(|_| RepositoryError::Corrupt(format!("leave_type '{}'", row.leave_type)))?;
        let status = row
            .status
            .parse()
            .map_err(|_| RepositoryError::Corrupt(format!("status '{}'", row.status)))?;

        Ok(LeaveRequest {
            id: row.id,
            user_id: row.user_id,
            start_date: row.start_date,
            end_date: row.end_date,
            total_days: row.total_days,
            leave_type,
            status,
            note: row.note,
            admin_comment: row.admin_comment,
            medical_code: row.medical_code,
            attachment_ref: row.attachment_ref,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Validated fields for an insert or a pending edit.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveDraft {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_days: u32,
    pub leave_type: LeaveType,
    pub note: Option<String>,
    pub medical_code: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LeaveQuery {
    pub user_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub page: u64,
    pub per_page: u64,
}

/// Count and day total of one status within a year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusTotals {
    pub requests: i64,
    pub days: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct LeavePage {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

/// Requests and days per status for one user and year.
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct YearSummary {
    pub user_id: u64,
    pub year: i32,
    pub pending: StatusTotals,
    pub approved: StatusTotals,
    pub rejected: StatusTotals,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct CalendarEntry {
    pub request_id: u64,
    pub user_id: u64,
    pub full_name: String,
    pub leave_type: LeaveType,
    pub status: LeaveStatus,
}

/// Approved and pending absences of a month, keyed by the dates they cover.
#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct MonthCalendar {
    pub year: i32,
    pub month: u32,
    #[schema(value_type = Object, example = json!({
        "2024-03-04": [{
            "request_id": 3,
            "user_id": 7,
            "full_name": "Anna Rossi",
            "leave_type": "vacation",
            "status": "approved"
        }]
    }))]
    pub days: BTreeMap<NaiveDate, Vec<CalendarEntry>>,
}
