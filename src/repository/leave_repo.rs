use std::collections::HashMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::MySqlPool;

use crate::model::leave_request::{
    LeaveDraft, LeaveQuery, LeaveRequest, LeaveRow, LeaveStatus, StatusTotals,
};
use crate::repository::page_offset;
use crate::repository::repo_error::RepositoryError;

#[async_trait]
pub trait LeaveRepository: Send + Sync {
    async fn insert(&self, user_id: u64, draft: &LeaveDraft) -> Result<u64, RepositoryError>;
    async fn find(&self, id: u64) -> Result<Option<LeaveRequest>, RepositoryError>;
    /// Non-rejected requests of `user_id` intersecting `[start, end]`.
    async fn find_holding(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<u64>,
    ) -> Result<Vec<LeaveRequest>, RepositoryError>;
    /// Conditional update: applies only while the row is in `from` and owned by `owner_id`.
    async fn update_draft(
        &self,
        id: u64,
        owner_id: u64,
        from: LeaveStatus,
        draft: &LeaveDraft,
    ) -> Result<bool, RepositoryError>;
    async fn set_attachment(
        &self,
        id: u64,
        owner_id: u64,
        from: LeaveStatus,
        attachment_ref: &str,
    ) -> Result<bool, RepositoryError>;
    /// Conditional status change; `owner_id` restricts the update to the requester.
    async fn set_status(
        &self,
        id: u64,
        owner_id: Option<u64>,
        from: LeaveStatus,
        to: LeaveStatus,
        comment: Option<&str>,
    ) -> Result<bool, RepositoryError>;
    async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), RepositoryError>;
    /// Totals per status over requests starting in `year`.
    async fn totals_by_status(
        &self,
        user_id: u64,
        year: i32,
    ) -> Result<HashMap<LeaveStatus, StatusTotals>, RepositoryError>;
    async fn in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        statuses: &[LeaveStatus],
    ) -> Result<Vec<LeaveRequest>, RepositoryError>;
    async fn delete(&self, id: u64) -> Result<bool, RepositoryError>;
}

const LEAVE_COLUMNS: &str = "id, user_id, start_date, end_date, total_days, leave_type, status, \
     note, admin_comment, medical_code, attachment_ref, created_at, updated_at";

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(&'static str),
}

pub struct LeaveRepositoryImpl {
    pool: MySqlPool,
}

impl LeaveRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn into_requests(rows: Vec<LeaveRow>) -> Result<Vec<LeaveRequest>, RepositoryError> {
    rows.into_iter().map(LeaveRequest::try_from).collect()
}

#[async_trait]
impl LeaveRepository for LeaveRepositoryImpl {
    async fn insert(&self, user_id: u64, draft: &LeaveDraft) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (user_id, start_date, end_date, total_days, leave_type, status, note, medical_code)
            VALUES (?, ?, ?, ?, ?, 'pending', ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(draft.total_days)
        .bind(draft.leave_type.as_ref())
        .bind(&draft.note)
        .bind(&draft.medical_code)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn find(&self, id: u64) -> Result<Option<LeaveRequest>, RepositoryError> {
        let sql = format!("SELECT {LEAVE_COLUMNS} FROM leave_requests WHERE id = ?");
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn find_holding(
        &self,
        user_id: u64,
        start: NaiveDate,
        end: NaiveDate,
        exclude_id: Option<u64>,
    ) -> Result<Vec<LeaveRequest>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests
            WHERE user_id = ?
            AND status <> 'rejected'
            AND start_date <= ?
            AND end_date >= ?
            AND (? IS NULL OR id <> ?)
            "#
        );
        let rows = sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(user_id)
            .bind(end)
            .bind(start)
            .bind(exclude_id)
            .bind(exclude_id)
            .fetch_all(&self.pool)
            .await?;

        into_requests(rows)
    }

    async fn update_draft(
        &self,
        id: u64,
        owner_id: u64,
        from: LeaveStatus,
        draft: &LeaveDraft,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET start_date = ?, end_date = ?, total_days = ?, leave_type = ?,
                note = ?, medical_code = ?
            WHERE id = ?
            AND user_id = ?
            AND status = ?
            "#,
        )
        .bind(draft.start_date)
        .bind(draft.end_date)
        .bind(draft.total_days)
        .bind(draft.leave_type.as_ref())
        .bind(&draft.note)
        .bind(&draft.medical_code)
        .bind(id)
        .bind(owner_id)
        .bind(from.as_ref())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_attachment(
        &self,
        id: u64,
        owner_id: u64,
        from: LeaveStatus,
        attachment_ref: &str,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET attachment_ref = ?
            WHERE id = ?
            AND user_id = ?
            AND status = ?
            "#,
        )
        .bind(attachment_ref)
        .bind(id)
        .bind(owner_id)
        .bind(from.as_ref())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_status(
        &self,
        id: u64,
        owner_id: Option<u64>,
        from: LeaveStatus,
        to: LeaveStatus,
        comment: Option<&str>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, admin_comment = ?
            WHERE id = ?
            AND status = ?
            AND (? IS NULL OR user_id = ?)
            "#,
        )
        .bind(to.as_ref())
        .bind(comment)
        .bind(id)
        .bind(from.as_ref())
        .bind(owner_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), RepositoryError> {
        // -------------------------
        // WHERE clause
        // -------------------------
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(user_id) = query.user_id {
            where_sql.push_str(" AND user_id = ?");
            args.push(FilterValue::U64(user_id));
        }

        if let Some(status) = query.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.into()));
        }

        // -------------------------
        // COUNT query
        // -------------------------
        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        // -------------------------
        // DATA query
        // -------------------------
        let data_sql = format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests
            {where_sql}
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            "#
        );

        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
            };
        }

        let offset = page_offset(query.page, query.per_page);
        let rows = data_q
            .bind(query.per_page)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        Ok((into_requests(rows)?, total))
    }

    async fn totals_by_status(
        &self,
        user_id: u64,
        year: i32,
    ) -> Result<HashMap<LeaveStatus, StatusTotals>, RepositoryError> {
        let rows = sqlx::query_as::<_, (String, i64, i64)>(
            r#"
            SELECT status, COUNT(*), CAST(COALESCE(SUM(total_days), 0) AS SIGNED)
            FROM leave_requests
            WHERE user_id = ?
            AND YEAR(start_date) = ?
            GROUP BY status
            "#,
        )
        .bind(user_id)
        .bind(year)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(status, requests, days)| {
                let status = status
                    .parse::<LeaveStatus>()
                    .map_err(|_| RepositoryError::Corrupt(format!("status '{status}'")))?;
                Ok((status, StatusTotals { requests, days }))
            })
            .collect()
    }

    async fn in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        statuses: &[LeaveStatus],
    ) -> Result<Vec<LeaveRequest>, RepositoryError> {
        if statuses.is_empty() {
            return Ok(Vec::new());
        }
        let placeholders = vec!["?"; statuses.len()].join(", ");
        let sql = format!(
            r#"
            SELECT {LEAVE_COLUMNS}
            FROM leave_requests
            WHERE start_date <= ?
            AND end_date >= ?
            AND status IN ({placeholders})
            ORDER BY start_date, id
            "#
        );

        let mut q = sqlx::query_as::<_, LeaveRow>(&sql).bind(end).bind(start);
        for status in statuses {
            q = q.bind(status.as_ref());
        }
        let rows = q.fetch_all(&self.pool).await?;

        into_requests(rows)
    }

    async fn delete(&self, id: u64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM leave_requests WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
