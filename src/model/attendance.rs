use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::repository::repo_error::RepositoryError;

/// Hours beyond this in a day count as overtime.
pub const STANDARD_HOURS: f64 = 8.0;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Default, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AttendanceKind {
    #[default]
    Regular,
    Remote,
    Travel,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct Attendance {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>, example = "09:00:00")]
    pub check_in: Option<NaiveTime>,
    #[schema(value_type = Option<String>, example = "18:00:00")]
    pub check_out: Option<NaiveTime>,
    pub hours_worked: Option<f64>,
    pub overtime_hours: f64,
    pub kind: AttendanceKind,
    pub note: Option<String>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct AttendanceRow {
    pub id: u64,
    pub user_id: u64,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub hours_worked: Option<f64>,
    pub overtime_hours: f64,
    pub kind: String,
    pub note: Option<String>,
}

impl TryFrom<AttendanceRow> for Attendance {
    type Error = RepositoryError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let kind = row
            .kind
            .parse()
            .map_err(|_| RepositoryError::Corrupt(format!("attendance kind '{}'", row.kind)))?;
        Ok(Attendance {
            id: row.id,
            user_id: row.user_id,
            date: row.date,
            check_in: row.check_in,
            check_out: row.check_out,
            hours_worked: row.hours_worked,
            overtime_hours: row.overtime_hours,
            kind,
            note: row.note,
        })
    }
}

/// Full-day values written by a manual correction.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceEntry {
    pub user_id: u64,
    pub date: NaiveDate,
    pub check_in: Option<NaiveTime>,
    pub check_out: Option<NaiveTime>,
    pub hours_worked: Option<f64>,
    pub overtime_hours: f64,
    pub kind: AttendanceKind,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, ToSchema)]
pub struct MonthSummary {
    pub year: i32,
    pub month: u32,
    pub days_present: u32,
    pub total_hours: f64,
    pub overtime_hours: f64,
    pub records: Vec<Attendance>,
}

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Worked and overtime hours between two clock times, to one decimal.
///
/// Only whole minutes count. A clock-out before the clock-in yields zero.
pub fn worked_hours(check_in: NaiveTime, check_out: NaiveTime) -> (f64, f64) {
    let start = check_in.hour() * 60 + check_in.minute();
    let end = check_out.hour() * 60 + check_out.minute();
    let minutes = end.saturating_sub(start);
    let hours = round_tenth(f64::from(minutes) / 60.0);
    let overtime = round_tenth((hours - STANDARD_HOURS).max(0.0));
    (hours, overtime)
}

pub fn summarize(year: i32, month: u32, records: Vec<Attendance>) -> MonthSummary {
    let days_present = records.iter().filter(|r| r.check_in.is_some()).count() as u32;
    let total: f64 = records.iter().filter_map(|r| r.hours_worked).sum();
    let overtime: f64 = records.iter().map(|r| r.overtime_hours).sum();
    MonthSummary {
        year,
        month,
        days_present,
        total_hours: round_tenth(total),
        overtime_hours: round_tenth(overtime),
        records,
    }
}
