use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::Deserialize;
use tracing::info;
use utoipa::ToSchema;

use crate::error::ServiceError;
use crate::model::attendance::{
    Attendance, AttendanceEntry, AttendanceKind, MonthSummary, summarize, worked_hours,
};
use crate::repository::attendance_repo::AttendanceRepository;
use crate::repository::repo_error::RepositoryError;
use crate::repository::user_repo::UserRepository;
use crate::service::calendar::validate_year;

/// A correction entered by a manager for one user and day.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ManualAttendance {
    pub user_id: u64,
    #[schema(example = "2024-03-04", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "09:00:00", value_type = Option<String>)]
    pub check_in: Option<NaiveTime>,
    #[schema(example = "18:30:00", value_type = Option<String>)]
    pub check_out: Option<NaiveTime>,
    #[serde(default)]
    pub kind: AttendanceKind,
    pub note: Option<String>,
}

fn clean(note: Option<&str>) -> Option<&str> {
    note.map(str::trim).filter(|n| !n.is_empty())
}

/// Drops seconds so stored times match what the hours are computed from.
fn to_minute(at: NaiveTime) -> NaiveTime {
    at.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at)
}

pub struct AttendanceService {
    repo: Arc<dyn AttendanceRepository>,
    users: Arc<dyn UserRepository>,
}

impl AttendanceService {
    pub fn new(repo: Arc<dyn AttendanceRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { repo, users }
    }

    pub async fn check_in(&self, user_id: u64, now: NaiveDateTime, note: Option<&str>) -> Result<Attendance, ServiceError> {
        let (date, at) = (now.date(), to_minute(now.time()));
        let note = clean(note);

        match self.repo.find_day(user_id, date).await? {
            Some(day) if day.check_in.is_some() => {
                return Err(ServiceError::validation("already checked in today"));
            }
            Some(day) => {
                if !self.repo.set_check_in(day.id, at, note).await? {
                    return Err(ServiceError::validation("already checked in today"));
                }
            }
            None => match self.repo.insert_check_in(user_id, date, at, note).await {
                Ok(_) => {}
                Err(RepositoryError::Duplicate) => {
                    return Err(ServiceError::validation("already checked in today"));
                }
                Err(e) => return Err(e.into()),
            },
        }
        info!(user_id, %date, check_in = %at, "Checked in");

        self.today(user_id, date)
            .await?
            .ok_or(ServiceError::NotFound("attendance"))
    }

    pub async fn check_out(&self, user_id: u64, now: NaiveDateTime, note: Option<&str>) -> Result<Attendance, ServiceError> {
        let (date, at) = (now.date(), to_minute(now.time()));
        let Some((day_id, check_in)) = self
            .repo
            .find_day(user_id, date)
            .await?
            .and_then(|d| d.check_in.map(|check_in| (d.id, check_in)))
        else {
            return Err(ServiceError::validation("no check-in found for today"));
        };

        let (hours, overtime) = worked_hours(check_in, at);
        if !self
            .repo
            .set_check_out(day_id, at, hours, overtime, clean(note))
            .await?
        {
            return Err(ServiceError::NotFound("attendance"));
        }
        info!(user_id, %date, check_out = %at, hours, overtime, "Checked out");

        self.today(user_id, date)
            .await?
            .ok_or(ServiceError::NotFound("attendance"))
    }

    pub async fn today(&self, user_id: u64, date: NaiveDate) -> Result<Option<Attendance>, ServiceError> {
        Ok(self.repo.find_day(user_id, date).await?)
    }

    pub async fn month_summary(&self, user_id: u64, year: i32, month: u32) -> Result<MonthSummary, ServiceError> {
        validate_year(year)?;
        if !(1..=12).contains(&month) {
            return Err(ServiceError::validation("month must be between 1 and 12"));
        }
        let records = self.repo.month(user_id, year, month).await?;
        Ok(summarize(year, month, records))
    }

    /// Upserts a full day, recomputing hours when both times are given.
    pub async fn set_manual(&self, input: &ManualAttendance) -> Result<Attendance, ServiceError> {
        if let (Some(check_in), Some(check_out)) = (input.check_in, input.check_out) {
            if check_out < check_in {
                return Err(ServiceError::validation("check_out cannot be before check_in"));
            }
        }
        if self.users.find(input.user_id).await?.is_none() {
            return Err(ServiceError::NotFound("user"));
        }

        let check_in = input.check_in.map(to_minute);
        let check_out = input.check_out.map(to_minute);
        let (hours_worked, overtime_hours) = match (check_in, check_out) {
            (Some(i), Some(o)) => {
                let (hours, overtime) = worked_hours(i, o);
                (Some(hours), overtime)
            }
            _ => (None, 0.0),
        };

        let entry = AttendanceEntry {
            user_id: input.user_id,
            date: input.date,
            check_in,
            check_out,
            hours_worked,
            overtime_hours,
            kind: input.kind,
            note: clean(input.note.as_deref()).map(str::to_string),
        };
        let saved = self.repo.upsert(&entry).await?;
        info!(user_id = input.user_id, date = %input.date, "Attendance set manually");
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::role::Role;
    use crate::repository::memory::MemoryStore;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, 27)
            .unwrap()
    }

    fn service() -> (Arc<MemoryStore>, AttendanceService) {
        let store = Arc::new(MemoryStore::new());
        let service = AttendanceService::new(store.clone(), store.clone());
        (store, service)
    }

    #[actix_web::test]
    async fn a_full_day_records_hours_and_overtime() {
        let (_, service) = service();
        let checked_in = service.check_in(1, at(9, 0), Some("office")).await.unwrap();
        assert_eq!(checked_in.check_in, NaiveTime::from_hms_opt(9, 0, 0));

        let day = service.check_out(1, at(18, 30), None).await.unwrap();
        assert_eq!(day.hours_worked, Some(9.5));
        assert_eq!(day.overtime_hours, 1.5);
        assert_eq!(day.note.as_deref(), Some("office"));
    }

    #[actix_web::test]
    async fn second_check_in_is_rejected() {
        let (_, service) = service();
        service.check_in(1, at(9, 0), None).await.unwrap();
        let err = service.check_in(1, at(9, 5), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[actix_web::test]
    async fn check_out_needs_a_check_in() {
        let (_, service) = service();
        let err = service.check_out(1, at(18, 0), None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[actix_web::test]
    async fn manual_entries_fill_the_month() {
        let (store, service) = service();
        let user = store.add_user("anna", Role::Employee, None);
        let saved = service
            .set_manual(&ManualAttendance {
                user_id: user,
                date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                check_in: NaiveTime::from_hms_opt(8, 0, 0),
                check_out: NaiveTime::from_hms_opt(17, 0, 0),
                kind: AttendanceKind::Remote,
                note: Some("  ".into()),
            })
            .await
            .unwrap();
        assert_eq!(saved.hours_worked, Some(9.0));
        assert_eq!(saved.overtime_hours, 1.0);
        assert_eq!(saved.note, None);

        service.check_in(user, at(9, 0), None).await.unwrap();
        service.check_out(user, at(17, 0), None).await.unwrap();

        let summary = service.month_summary(user, 2024, 3).await.unwrap();
        assert_eq!(summary.days_present, 2);
        assert_eq!(summary.total_hours, 17.0);
        assert_eq!(summary.overtime_hours, 1.0);
        assert_eq!(summary.records[0].date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[actix_web::test]
    async fn manual_entry_rejects_inverted_times() {
        let (store, service) = service();
        let user = store.add_user("anna", Role::Employee, None);
        let err = service
            .set_manual(&ManualAttendance {
                user_id: user,
                date: NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                check_in: NaiveTime::from_hms_opt(18, 0, 0),
                check_out: NaiveTime::from_hms_opt(9, 0, 0),
                kind: AttendanceKind::Regular,
                note: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }
}
