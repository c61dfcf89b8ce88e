use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use sqlx::MySqlPool;

use crate::model::attendance::{Attendance, AttendanceEntry, AttendanceKind, AttendanceRow};
use crate::repository::repo_error::RepositoryError;

#[async_trait]
pub trait AttendanceRepository: Send + Sync {
    async fn find_day(&self, user_id: u64, date: NaiveDate) -> Result<Option<Attendance>, RepositoryError>;
    /// Fails with [`RepositoryError::Duplicate`] when the day already has a row.
    async fn insert_check_in(
        &self,
        user_id: u64,
        date: NaiveDate,
        at: NaiveTime,
        note: Option<&str>,
    ) -> Result<u64, RepositoryError>;
    /// Fills the clock-in of a row created without one; keeps the old note when `note` is `None`.
    async fn set_check_in(&self, id: u64, at: NaiveTime, note: Option<&str>) -> Result<bool, RepositoryError>;
    async fn set_check_out(
        &self,
        id: u64,
        at: NaiveTime,
        hours_worked: f64,
        overtime_hours: f64,
        note: Option<&str>,
    ) -> Result<bool, RepositoryError>;
    async fn month(&self, user_id: u64, year: i32, month: u32) -> Result<Vec<Attendance>, RepositoryError>;
    async fn upsert(&self, entry: &AttendanceEntry) -> Result<Attendance, RepositoryError>;
}

const ATTENDANCE_COLUMNS: &str =
    "id, user_id, date, check_in, check_out, hours_worked, overtime_hours, kind, note";

pub struct AttendanceRepositoryImpl {
    pool: MySqlPool,
}

impl AttendanceRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceRepository for AttendanceRepositoryImpl {
    async fn find_day(&self, user_id: u64, date: NaiveDate) -> Result<Option<Attendance>, RepositoryError> {
        let sql = format!("SELECT {ATTENDANCE_COLUMNS} FROM attendance WHERE user_id = ? AND date = ?");
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?
            .map(Attendance::try_from)
            .transpose()
    }

    async fn insert_check_in(
        &self,
        user_id: u64,
        date: NaiveDate,
        at: NaiveTime,
        note: Option<&str>,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (user_id, date, check_in, kind, note)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(date)
        .bind(at)
        .bind(AttendanceKind::Regular.as_ref())
        .bind(note)
        .execute(&self.pool)
        .await
        .map_err(RepositoryError::from_insert)?;

        Ok(result.last_insert_id())
    }

    async fn set_check_in(&self, id: u64, at: NaiveTime, note: Option<&str>) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_in = ?, note = COALESCE(?, note)
            WHERE id = ?
            AND check_in IS NULL
            "#,
        )
        .bind(at)
        .bind(note)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_check_out(
        &self,
        id: u64,
        at: NaiveTime,
        hours_worked: f64,
        overtime_hours: f64,
        note: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?, hours_worked = ?, overtime_hours = ?, note = COALESCE(?, note)
            WHERE id = ?
            "#,
        )
        .bind(at)
        .bind(hours_worked)
        .bind(overtime_hours)
        .bind(note)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn month(&self, user_id: u64, year: i32, month: u32) -> Result<Vec<Attendance>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {ATTENDANCE_COLUMNS}
            FROM attendance
            WHERE user_id = ?
            AND YEAR(date) = ?
            AND MONTH(date) = ?
            ORDER BY date
            "#
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(user_id)
            .bind(year)
            .bind(month)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Attendance::try_from).collect()
    }

    async fn upsert(&self, entry: &AttendanceEntry) -> Result<Attendance, RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO attendance
                (user_id, date, check_in, check_out, hours_worked, overtime_hours, kind, note)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                check_in = VALUES(check_in),
                check_out = VALUES(check_out),
                hours_worked = VALUES(hours_worked),
                overtime_hours = VALUES(overtime_hours),
                kind = VALUES(kind),
                note = VALUES(note)
            "#,
        )
        .bind(entry.user_id)
        .bind(entry.date)
        .bind(entry.check_in)
        .bind(entry.check_out)
        .bind(entry.hours_worked)
        .bind(entry.overtime_hours)
        .bind(entry.kind.as_ref())
        .bind(&entry.note)
        .execute(&self.pool)
        .await?;

        self.find_day(entry.user_id, entry.date).await?.ok_or_else(|| {
            RepositoryError::Corrupt(format!("attendance {}/{} vanished", entry.user_id, entry.date))
        })
    }
}
