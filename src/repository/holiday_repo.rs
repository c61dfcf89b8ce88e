use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::model::holiday::{Holiday, HolidayDraft};
use crate::repository::repo_error::RepositoryError;

#[async_trait]
pub trait HolidayRepository: Send + Sync {
    async fn insert(&self, draft: &HolidayDraft, created_by: Option<u64>) -> Result<u64, RepositoryError>;
    async fn update(&self, id: u64, draft: &HolidayDraft) -> Result<bool, RepositoryError>;
    async fn delete(&self, id: u64) -> Result<bool, RepositoryError>;
    async fn find(&self, id: u64) -> Result<Option<Holiday>, RepositoryError>;
    /// Every rule, latest date first.
    async fn list_all(&self) -> Result<Vec<Holiday>, RepositoryError>;
    /// Recurring rules plus the fixed rules dated in `year`.
    async fn rules_for_year(&self, year: i32) -> Result<Vec<Holiday>, RepositoryError>;
    async fn has_recurring(&self, month: u32, day: u32) -> Result<bool, RepositoryError>;
}

const HOLIDAY_COLUMNS: &str = "id, name, date, recurring, note, created_by, created_at";

pub struct HolidayRepositoryImpl {
    pool: MySqlPool,
}

impl HolidayRepositoryImpl {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HolidayRepository for HolidayRepositoryImpl {
    async fn insert(&self, draft: &HolidayDraft, created_by: Option<u64>) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            r#"
            INSERT INTO holidays (name, date, recurring, note, created_by)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&draft.name)
        .bind(draft.date)
        .bind(draft.recurring)
        .bind(&draft.note)
        .bind(created_by)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_id())
    }

    async fn update(&self, id: u64, draft: &HolidayDraft) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE holidays
            SET name = ?, date = ?, recurring = ?, note = ?
            WHERE id = ?
            "#,
        )
        .bind(&draft.name)
        .bind(draft.date)
        .bind(draft.recurring)
        .bind(&draft.note)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: u64) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM holidays WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn find(&self, id: u64) -> Result<Option<Holiday>, RepositoryError> {
        let sql = format!("SELECT {HOLIDAY_COLUMNS} FROM holidays WHERE id = ?");
        Ok(sqlx::query_as::<_, Holiday>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_all(&self) -> Result<Vec<Holiday>, RepositoryError> {
        let sql = format!("SELECT {HOLIDAY_COLUMNS} FROM holidays ORDER BY date DESC, id DESC");
        Ok(sqlx::query_as::<_, Holiday>(&sql).fetch_all(&self.pool).await?)
    }

    async fn rules_for_year(&self, year: i32) -> Result<Vec<Holiday>, RepositoryError> {
        let sql = format!(
            r#"
            SELECT {HOLIDAY_COLUMNS}
            FROM holidays
            WHERE recurring = TRUE
            OR YEAR(date) = ?
            ORDER BY MONTH(date), DAY(date), id
            "#
        );
        Ok(sqlx::query_as::<_, Holiday>(&sql)
            .bind(year)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn has_recurring(&self, month: u32, day: u32) -> Result<bool, RepositoryError> {
        Ok(sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM holidays
                WHERE recurring = TRUE
                AND MONTH(date) = ?
                AND DAY(date) = ?
            )
            "#,
        )
        .bind(month)
        .bind(day)
        .fetch_one(&self.pool)
        .await?)
    }
}
